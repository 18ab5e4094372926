use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Exchanges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Exchanges::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Exchanges::Title).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Pairs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pairs::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Pairs::Title).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Candles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Candles::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Candles::ExchangeId).integer().not_null())
                    .col(ColumnDef::new(Candles::PairId).integer().not_null())
                    .col(ColumnDef::new(Candles::Frequency).small_integer().not_null()) // 1 = minute, 2 = hour
                    .col(ColumnDef::new(Candles::Time).big_integer().not_null()) // unix seconds, bucket start
                    .col(ColumnDef::new(Candles::Open).double().not_null())
                    .col(ColumnDef::new(Candles::High).double().not_null())
                    .col(ColumnDef::new(Candles::Low).double().not_null())
                    .col(ColumnDef::new(Candles::Close).double().not_null())
                    .col(ColumnDef::new(Candles::Volume).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candles_exchange")
                            .from(Candles::Table, Candles::ExchangeId)
                            .to(Exchanges::Table, Exchanges::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candles_pair")
                            .from(Candles::Table, Candles::PairId)
                            .to(Pairs::Table, Pairs::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_candles_time")
                    .table(Candles::Table)
                    .col(Candles::Time)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // One row per observation; re-runs over overlapping windows collapse onto it.
        manager
            .create_index(
                Index::create()
                    .name("idx_candles_observation")
                    .table(Candles::Table)
                    .col(Candles::ExchangeId)
                    .col(Candles::PairId)
                    .col(Candles::Frequency)
                    .col(Candles::Time)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(Candles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Pairs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Exchanges::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Exchanges {
    Table,
    Id,
    Title,
}

#[derive(DeriveIden)]
enum Pairs {
    Table,
    Id,
    Title,
}

#[derive(DeriveIden)]
enum Candles {
    Table,
    Id,
    ExchangeId,
    PairId,
    Frequency,
    Time,
    Open,
    High,
    Low,
    Close,
    Volume,
}
