//! Candle persistence.
//!
//! `CandleStore` is the seam the filler writes through; `SeaOrmCandleStore`
//! is the database-backed implementation.

use crate::entity::{candles, exchanges, pairs};
use crate::models::{CandleFrequency, CurrencyPair, NewCandle};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::debug;

#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Persist all rows in one transaction. Returns the number of rows written.
    async fn insert_batch(&self, rows: &[NewCandle]) -> Result<u64, DbErr>;

    /// Delete candles of `frequency` whose time is before UTC midnight of `day`.
    async fn delete_before(&self, day: NaiveDate, frequency: CandleFrequency) -> Result<u64, DbErr>;

    async fn get_or_create_exchange(&self, title: &str) -> Result<exchanges::Model, DbErr>;

    async fn get_or_create_pair(&self, pair: CurrencyPair) -> Result<pairs::Model, DbErr>;
}

/// Rows per `INSERT` statement. Nine bind parameters per row keeps a chunk
/// under SQLite's 32766-variable limit and MySQL's 65535-placeholder limit.
const INSERT_CHUNK_ROWS: usize = 3000;

/// Unix seconds of UTC midnight at the start of `day`.
pub fn midnight_utc(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Clone)]
pub struct SeaOrmCandleStore {
    db: DatabaseConnection,
}

impl SeaOrmCandleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn find_exchange(&self, title: &str) -> Result<Option<exchanges::Model>, DbErr> {
        exchanges::Entity::find()
            .filter(exchanges::Column::Title.eq(title))
            .one(&self.db)
            .await
    }

    async fn find_pair(&self, title: &str) -> Result<Option<pairs::Model>, DbErr> {
        pairs::Entity::find()
            .filter(pairs::Column::Title.eq(title))
            .one(&self.db)
            .await
    }
}

#[async_trait]
impl CandleStore for SeaOrmCandleStore {
    async fn insert_batch(&self, rows: &[NewCandle]) -> Result<u64, DbErr> {
        if rows.is_empty() {
            return Ok(0);
        }

        // A re-fetched observation overwrites the stored one
        let on_conflict = OnConflict::columns([
            candles::Column::ExchangeId,
            candles::Column::PairId,
            candles::Column::Frequency,
            candles::Column::Time,
        ])
        .update_columns([
            candles::Column::Open,
            candles::Column::High,
            candles::Column::Low,
            candles::Column::Close,
            candles::Column::Volume,
        ])
        .to_owned();

        let txn = self.db.begin().await?;
        let mut written = 0;
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            written += candles::Entity::insert_many(chunk.iter().map(candles::ActiveModel::from))
                .on_conflict(on_conflict.clone())
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        debug!("Inserted batch of {} candles ({} rows affected)", rows.len(), written);
        Ok(written)
    }

    async fn delete_before(&self, day: NaiveDate, frequency: CandleFrequency) -> Result<u64, DbErr> {
        let boundary = midnight_utc(day);
        let result = candles::Entity::delete_many()
            .filter(candles::Column::Frequency.eq(frequency))
            .filter(candles::Column::Time.lt(boundary))
            .exec(&self.db)
            .await?;

        debug!(
            "Deleted {} {} candles before {} ({})",
            result.rows_affected, frequency, day, boundary
        );
        Ok(result.rows_affected)
    }

    async fn get_or_create_exchange(&self, title: &str) -> Result<exchanges::Model, DbErr> {
        if let Some(exchange) = self.find_exchange(title).await? {
            return Ok(exchange);
        }

        // The unique title turns a concurrent insert into a no-op instead of a duplicate
        let exchange = exchanges::ActiveModel {
            title: ActiveValue::Set(title.to_string()),
            ..Default::default()
        };
        exchanges::Entity::insert(exchange)
            .on_conflict(
                OnConflict::column(exchanges::Column::Title)
                    .update_column(exchanges::Column::Title)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.find_exchange(title)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("exchange {}", title)))
    }

    async fn get_or_create_pair(&self, pair: CurrencyPair) -> Result<pairs::Model, DbErr> {
        let title = pair.as_str();
        if let Some(found) = self.find_pair(title).await? {
            return Ok(found);
        }

        let model = pairs::ActiveModel {
            title: ActiveValue::Set(title.to_string()),
            ..Default::default()
        };
        pairs::Entity::insert(model)
            .on_conflict(
                OnConflict::column(pairs::Column::Title)
                    .update_column(pairs::Column::Title)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.find_pair(title)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("pair {}", title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::memory_db;
    use sea_orm::PaginatorTrait;

    fn candle(exchange_id: i32, pair_id: i32, frequency: CandleFrequency, time: i64) -> NewCandle {
        NewCandle {
            exchange_id,
            pair_id,
            frequency,
            time,
            open: 100.0,
            high: 110.0,
            low: 95.0,
            close: 105.0,
            volume: 1000.0,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = SeaOrmCandleStore::new(memory_db().await);

        let first = store.get_or_create_exchange("Bitfinex").await.unwrap();
        let second = store.get_or_create_exchange("Bitfinex").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.title, "Bitfinex");
        assert_eq!(exchanges::Entity::find().count(store.connection()).await.unwrap(), 1);

        let pair = store.get_or_create_pair(CurrencyPair::EthUsd).await.unwrap();
        let again = store.get_or_create_pair(CurrencyPair::EthUsd).await.unwrap();
        assert_eq!(pair, again);
        assert_eq!(pair.title, "ETH-USD");
        assert_eq!(pairs::Entity::find().count(store.connection()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_distinct_titles_get_distinct_ids() {
        let store = SeaOrmCandleStore::new(memory_db().await);

        let bitfinex = store.get_or_create_exchange("Bitfinex").await.unwrap();
        let kraken = store.get_or_create_exchange("Kraken").await.unwrap();
        assert_ne!(bitfinex.id, kraken.id);
    }

    #[tokio::test]
    async fn test_delete_before_keeps_midnight_and_other_frequency() {
        let store = SeaOrmCandleStore::new(memory_db().await);
        let exchange = store.get_or_create_exchange("Kraken").await.unwrap();
        let pair = store.get_or_create_pair(CurrencyPair::BtcUsd).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let midnight = midnight_utc(day);
        assert_eq!(midnight, 1_710_028_800);

        let rows = vec![
            candle(exchange.id, pair.id, CandleFrequency::Minute, midnight - 3600),
            candle(exchange.id, pair.id, CandleFrequency::Minute, midnight - 1),
            candle(exchange.id, pair.id, CandleFrequency::Minute, midnight),
            candle(exchange.id, pair.id, CandleFrequency::Minute, midnight + 60),
            candle(exchange.id, pair.id, CandleFrequency::Hour, midnight - 3600),
        ];
        assert_eq!(store.insert_batch(&rows).await.unwrap(), 5);

        let deleted = store.delete_before(day, CandleFrequency::Minute).await.unwrap();
        assert_eq!(deleted, 2);

        let mut remaining: Vec<(CandleFrequency, i64)> = candles::Entity::find()
            .all(store.connection())
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.frequency, c.time))
            .collect();
        remaining.sort_by_key(|(_, time)| *time);
        assert_eq!(
            remaining,
            vec![
                (CandleFrequency::Hour, midnight - 3600),
                (CandleFrequency::Minute, midnight),
                (CandleFrequency::Minute, midnight + 60),
            ]
        );
    }

    #[tokio::test]
    async fn test_insert_batch_collapses_repeated_observations() {
        let store = SeaOrmCandleStore::new(memory_db().await);
        let exchange = store.get_or_create_exchange("Bitfinex").await.unwrap();
        let pair = store.get_or_create_pair(CurrencyPair::XrpUsd).await.unwrap();

        let first = candle(exchange.id, pair.id, CandleFrequency::Hour, 1_700_000_000);
        store.insert_batch(&[first.clone()]).await.unwrap();

        let mut refreshed = first.clone();
        refreshed.close = 107.5;
        store.insert_batch(&[refreshed]).await.unwrap();

        let stored = candles::Entity::find().all(store.connection()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].close, 107.5);
    }

    #[tokio::test]
    async fn test_insert_empty_batch_is_noop() {
        let store = SeaOrmCandleStore::new(memory_db().await);
        assert_eq!(store.insert_batch(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_batch_is_all_or_nothing() {
        let store = SeaOrmCandleStore::new(memory_db().await);
        let exchange = store.get_or_create_exchange("Kraken").await.unwrap();
        let pair = store.get_or_create_pair(CurrencyPair::BtcUsd).await.unwrap();

        // Second row points at a pair that does not exist
        let rows = vec![
            candle(exchange.id, pair.id, CandleFrequency::Hour, 1_700_000_000),
            candle(exchange.id, pair.id + 100, CandleFrequency::Hour, 1_700_003_600),
        ];
        assert!(store.insert_batch(&rows).await.is_err());
        assert_eq!(candles::Entity::find().count(store.connection()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_large_batch_is_split_into_statements() {
        let store = SeaOrmCandleStore::new(memory_db().await);
        let exchange = store.get_or_create_exchange("Bitfinex").await.unwrap();
        let pair = store.get_or_create_pair(CurrencyPair::BtcUsd).await.unwrap();

        let rows: Vec<NewCandle> = (0..4001)
            .map(|i| candle(exchange.id, pair.id, CandleFrequency::Minute, 1_700_000_000 + i * 60))
            .collect();
        assert_eq!(store.insert_batch(&rows).await.unwrap(), 4001);
        assert_eq!(candles::Entity::find().count(store.connection()).await.unwrap(), 4001);
    }

    #[tokio::test]
    async fn test_failure_in_later_statement_rolls_back_whole_batch() {
        let store = SeaOrmCandleStore::new(memory_db().await);
        let exchange = store.get_or_create_exchange("Kraken").await.unwrap();
        let pair = store.get_or_create_pair(CurrencyPair::EthUsd).await.unwrap();

        let mut rows: Vec<NewCandle> = (0..4001)
            .map(|i| candle(exchange.id, pair.id, CandleFrequency::Minute, 1_700_000_000 + i * 60))
            .collect();
        rows[3500].pair_id = pair.id + 100;

        assert!(store.insert_batch(&rows).await.is_err());
        assert_eq!(candles::Entity::find().count(store.connection()).await.unwrap(), 0);
    }
}
