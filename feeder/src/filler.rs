//! Database filler
//!
//! One run prunes stale candles, then walks every connector × pair ×
//! frequency, streaming candles into a bounded batch that is flushed to the
//! store. Readiness goes `filling` → `ready`, or `error` on the first failure,
//! at which point the remaining combinations are abandoned. Batches flushed
//! before the failure stay persisted.

use crate::connector::Connector;
use crate::error::{IngestError, Result};
use chrono::{DateTime, Duration, Utc};
use futures::TryStreamExt;
use sea_orm::Iterable;
use shared::{CandleFrequency, CandleStore, CurrencyPair, FillConfig, NewCandle, Readiness, ReadinessState};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Counters of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub pruned: u64,
    pub inserted: usize,
    pub flushes: usize,
}

pub struct DatabaseFiller {
    store: Arc<dyn CandleStore>,
    connectors: Vec<Box<dyn Connector>>,
    readiness: Readiness,
    config: FillConfig,
}

impl DatabaseFiller {
    pub fn new(
        store: Arc<dyn CandleStore>,
        connectors: Vec<Box<dyn Connector>>,
        readiness: Readiness,
        config: FillConfig,
    ) -> Self {
        Self {
            store,
            connectors,
            readiness,
            config,
        }
    }

    /// Run one fill with `now` as the reference instant.
    pub async fn fill_database(&self, now: DateTime<Utc>) -> Result<FillReport> {
        self.readiness.set(ReadinessState::Filling);
        info!("Filling database, reference time {}", now);

        match self.fill(now).await {
            Ok(report) => {
                self.readiness.set(ReadinessState::Ready);
                info!(
                    "Database ready: pruned {} rows, inserted {} rows in {} batches",
                    report.pruned, report.inserted, report.flushes
                );
                Ok(report)
            }
            Err(e) => {
                self.readiness.set(ReadinessState::Error);
                error!("Database fill aborted: {}", e);
                Err(e)
            }
        }
    }

    async fn fill(&self, now: DateTime<Utc>) -> Result<FillReport> {
        let mut report = FillReport {
            pruned: self.drop_old_data(now).await?,
            ..Default::default()
        };
        self.add_candles(now, &mut report).await?;
        Ok(report)
    }

    async fn drop_old_data(&self, now: DateTime<Utc>) -> Result<u64> {
        let day = now.date_naive() - Duration::days(i64::from(self.config.retention_days));
        let mut pruned = 0;
        for frequency in [CandleFrequency::Hour, CandleFrequency::Minute] {
            pruned += self.store.delete_before(day, frequency).await?;
        }
        info!("Pruned {} candles older than {}", pruned, day);
        Ok(pruned)
    }

    /// `[now - lookback, now - 1 minute)` for `frequency`.
    fn fetch_window(&self, frequency: CandleFrequency, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let lookback = self
            .config
            .fetch_window(frequency)
            .ok_or(IngestError::UnsupportedFrequency(frequency))?;
        Ok((now - lookback, now - Duration::minutes(1)))
    }

    async fn add_candles(&self, now: DateTime<Utc>, report: &mut FillReport) -> Result<()> {
        let mut batch: Vec<NewCandle> = Vec::with_capacity(self.config.batch_size + 1);

        for connector in &self.connectors {
            let exchange = self
                .store
                .get_or_create_exchange(connector.exchange_title())
                .await?;

            for pair in CurrencyPair::iter() {
                let pair_row = self.store.get_or_create_pair(pair).await?;

                for frequency in CandleFrequency::iter() {
                    let (start, end) = self.fetch_window(frequency, now)?;
                    let mut candles = connector.fetch_candles(pair, frequency, start, end);
                    let mut fetched = 0usize;

                    while let Some(candle) = candles.try_next().await? {
                        batch.push(candle.stamp(exchange.id, pair_row.id));
                        fetched += 1;
                        if batch.len() > self.config.batch_size {
                            self.flush(&mut batch, report).await?;
                        }
                    }

                    info!(
                        "{}: fetched {} {} {} candles ({} .. {})",
                        exchange.title, fetched, pair, frequency, start, end
                    );
                }
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, report).await?;
        }
        Ok(())
    }

    async fn flush(&self, batch: &mut Vec<NewCandle>, report: &mut FillReport) -> Result<()> {
        self.store.insert_batch(batch).await?;
        debug!("Flushed batch of {} candles", batch.len());
        report.inserted += batch.len();
        report.flushes += 1;
        batch.clear();
        Ok(())
    }
}
