//! `SeaORM` Entity, @generated manually

use crate::models::{CandleFrequency, NewCandle};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "candles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub exchange_id: i32,
    pub pair_id: i32,
    pub frequency: CandleFrequency,
    #[sea_orm(column_type = "BigInteger")]
    pub time: i64, // unix seconds
    #[sea_orm(column_type = "Double")]
    pub open: f64,
    #[sea_orm(column_type = "Double")]
    pub high: f64,
    #[sea_orm(column_type = "Double")]
    pub low: f64,
    #[sea_orm(column_type = "Double")]
    pub close: f64,
    #[sea_orm(column_type = "Double")]
    pub volume: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exchanges::Entity",
        from = "Column::ExchangeId",
        to = "super::exchanges::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Exchanges,
    #[sea_orm(
        belongs_to = "super::pairs::Entity",
        from = "Column::PairId",
        to = "super::pairs::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Pairs,
}

impl Related<super::exchanges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exchanges.def()
    }
}

impl Related<super::pairs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pairs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewCandle> for ActiveModel {
    fn from(candle: &NewCandle) -> Self {
        Self {
            id: ActiveValue::NotSet,
            exchange_id: ActiveValue::Set(candle.exchange_id),
            pair_id: ActiveValue::Set(candle.pair_id),
            frequency: ActiveValue::Set(candle.frequency),
            time: ActiveValue::Set(candle.time),
            open: ActiveValue::Set(candle.open),
            high: ActiveValue::Set(candle.high),
            low: ActiveValue::Set(candle.low),
            close: ActiveValue::Set(candle.close),
            volume: ActiveValue::Set(candle.volume),
        }
    }
}
