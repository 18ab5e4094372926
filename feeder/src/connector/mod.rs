//! Exchange connectors
//!
//! Each connector maps the enumerated pairs and frequencies onto its
//! exchange's symbols and intervals through a static table, performs the
//! REST call lazily and yields normalized candles.

pub mod bitfinex;
pub mod kraken;

pub use bitfinex::BitfinexConnector;
pub use kraken::KrakenConnector;

use crate::error::{FetchFailure, IngestError};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use shared::{CandleFrequency, Config, CurrencyPair, NewCandle};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// OHLCV candle as produced by a connector, before foreign keys are attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCandle {
    pub frequency: CandleFrequency,
    /// Start of the bucket, unix seconds
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl NormalizedCandle {
    /// Attach exchange and pair ids, producing a row for the store.
    pub fn stamp(self, exchange_id: i32, pair_id: i32) -> NewCandle {
        NewCandle {
            exchange_id,
            pair_id,
            frequency: self.frequency,
            time: self.time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

pub type CandleStream<'a> = BoxStream<'a, Result<NormalizedCandle, IngestError>>;

/// Source of historical candles for one exchange.
pub trait Connector: Send + Sync {
    fn exchange_title(&self) -> &str;

    /// Candles for `pair` at `frequency` covering `[start, end)`.
    ///
    /// Nothing is requested until the stream is polled. Rows come back in the
    /// order the exchange sends them; some exchanges ignore `start` and return
    /// fewer rows than the window holds.
    fn fetch_candles(
        &self,
        pair: CurrencyPair,
        frequency: CandleFrequency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CandleStream<'_>;
}

/// Find `key` in a connector's static table.
pub(crate) fn lookup<K, V>(table: &[(K, V)], key: K) -> Option<V>
where
    K: PartialEq + Copy,
    V: Copy,
{
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Like [`lookup`], but a missing entry is a `ConfigurationMismatch` naming
/// `what` was being mapped.
pub(crate) fn require<K, V>(exchange: &str, table: &[(K, V)], key: K, what: &str) -> Result<V, IngestError>
where
    K: PartialEq + Copy + std::fmt::Display,
    V: Copy,
{
    lookup(table, key).ok_or_else(|| IngestError::configuration_mismatch(exchange, format!("{} {}", what, key)))
}

/// Turn a one-shot request into a lazy stream of its rows.
pub(crate) fn lazy_rows<'a, F>(request: F) -> CandleStream<'a>
where
    F: Future<Output = Result<Vec<NormalizedCandle>, IngestError>> + Send + 'a,
{
    stream::once(request)
        .map_ok(|rows| stream::iter(rows.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
}

/// GET `url` and return the body, failing on non-success statuses.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchFailure> {
    debug!("GET {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchFailure::Status(status));
    }
    Ok(response.text().await?)
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<f64, FetchFailure> {
    raw.parse::<f64>()
        .map_err(|_| FetchFailure::Malformed(format!("{} is not a number: {:?}", field, raw)))
}

/// Build the production connectors sharing one HTTP client.
pub fn build_connectors(config: &Config) -> Result<Vec<Box<dyn Connector>>, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    Ok(vec![
        Box::new(BitfinexConnector::new(client.clone(), config.bitfinex_base_url.clone())),
        Box::new(KrakenConnector::new(client, config.kraken_base_url.clone())),
    ])
}
