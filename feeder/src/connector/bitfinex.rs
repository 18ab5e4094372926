//! Bitfinex public candles API.
//!
//! `GET /v2/candles/trade:{interval}:{symbol}/hist` honors explicit millisecond
//! `start`/`end` bounds and returns a flat array of
//! `[mts, open, close, high, low, volume]` rows, ascending with `sort=1`.

use super::{get_text, lazy_rows, require, CandleStream, Connector, NormalizedCandle};
use crate::error::{FetchFailure, IngestError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use shared::{CandleFrequency, CurrencyPair};

const EXCHANGE_TITLE: &str = "Bitfinex";

/// Rows per request; comfortably above the 1440 of a one-day minute window.
const PAGE_LIMIT: u32 = 10_000;

const PAIRS: &[(CurrencyPair, &str)] = &[
    (CurrencyPair::BtcUsd, "tBTCUSD"),
    (CurrencyPair::EthUsd, "tETHUSD"),
    (CurrencyPair::XrpEur, "tXRPEUR"),
    (CurrencyPair::XrpUsd, "tXRPUSD"),
];

const INTERVALS: &[(CandleFrequency, &str)] = &[
    (CandleFrequency::Minute, "1m"),
    (CandleFrequency::Hour, "1h"),
];

/// `[mts, open, close, high, low, volume]`
type BitfinexRow = (i64, f64, f64, f64, f64, f64);

pub struct BitfinexConnector {
    client: reqwest::Client,
    base_url: String,
}

impl BitfinexConnector {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn symbol(&self, pair: CurrencyPair) -> Result<&'static str, IngestError> {
        require(EXCHANGE_TITLE, PAIRS, pair, "pair")
    }

    pub fn interval(&self, frequency: CandleFrequency) -> Result<&'static str, IngestError> {
        require(EXCHANGE_TITLE, INTERVALS, frequency, "frequency")
    }

    fn candles_url(&self, symbol: &str, interval: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        format!(
            "{}/v2/candles/trade:{}:{}/hist?limit={}&start={}&end={}&sort=1",
            self.base_url.trim_end_matches('/'),
            interval,
            symbol,
            PAGE_LIMIT,
            start.timestamp_millis(),
            end.timestamp_millis()
        )
    }

    async fn request(
        &self,
        pair: CurrencyPair,
        frequency: CandleFrequency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NormalizedCandle>, IngestError> {
        let url = self.candles_url(self.symbol(pair)?, self.interval(frequency)?, start, end);

        let body = get_text(&self.client, &url)
            .await
            .map_err(|cause| IngestError::source_fetch(EXCHANGE_TITLE, pair, frequency, cause))?;

        parse_candles(&body, frequency)
            .map_err(|cause| IngestError::source_fetch(EXCHANGE_TITLE, pair, frequency, cause))
    }
}

impl Connector for BitfinexConnector {
    fn exchange_title(&self) -> &str {
        EXCHANGE_TITLE
    }

    fn fetch_candles(
        &self,
        pair: CurrencyPair,
        frequency: CandleFrequency,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CandleStream<'_> {
        lazy_rows(self.request(pair, frequency, start, end))
    }
}

/// Parse a `/hist` response body.
pub(crate) fn parse_candles(body: &str, frequency: CandleFrequency) -> Result<Vec<NormalizedCandle>, FetchFailure> {
    let value: Value = serde_json::from_str(body)?;

    // Errors come back as ["error", code, "message"]
    if let Some(items) = value.as_array() {
        if items.first().and_then(Value::as_str) == Some("error") {
            let message = items
                .iter()
                .skip(1)
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            return Err(FetchFailure::Exchange(message));
        }
    }

    let rows: Vec<BitfinexRow> = serde_json::from_value(value)?;
    Ok(rows
        .into_iter()
        .map(|(mts, open, close, high, low, volume)| NormalizedCandle {
            frequency,
            time: mts / 1000,
            open,
            high,
            low,
            close,
            volume,
        })
        .collect())
}
