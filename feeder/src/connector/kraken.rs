//! Kraken public OHLC API.
//!
//! `GET /0/public/OHLC` does not honor `since` beyond its retention: it always
//! answers with at most 720 of the most recent entries ending now. Callers get
//! whatever Kraken returns, which may cover less than the requested window.

use super::{get_text, lazy_rows, parse_decimal, require, CandleStream, Connector, NormalizedCandle};
use crate::error::{FetchFailure, IngestError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use shared::{CandleFrequency, CurrencyPair};

const EXCHANGE_TITLE: &str = "Kraken";

const PAIRS: &[(CurrencyPair, &str)] = &[
    (CurrencyPair::BtcUsd, "XBTUSD"),
    (CurrencyPair::EthUsd, "ETHUSD"),
    (CurrencyPair::XrpEur, "XRPEUR"),
    (CurrencyPair::XrpUsd, "XRPUSD"),
];

/// Interval in minutes
const INTERVALS: &[(CandleFrequency, u32)] = &[
    (CandleFrequency::Minute, 1),
    (CandleFrequency::Hour, 60),
];

#[derive(Debug, Deserialize)]
struct OhlcEnvelope {
    #[serde(default)]
    error: Vec<String>,
    result: Option<Map<String, Value>>,
}

/// `[time, open, high, low, close, vwap, volume, count]`, prices as decimal strings
type KrakenRow = (i64, String, String, String, String, String, String, i64);

pub struct KrakenConnector {
    client: reqwest::Client,
    base_url: String,
}

impl KrakenConnector {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn symbol(&self, pair: CurrencyPair) -> Result<&'static str, IngestError> {
        require(EXCHANGE_TITLE, PAIRS, pair, "pair")
    }

    pub fn interval(&self, frequency: CandleFrequency) -> Result<u32, IngestError> {
        require(EXCHANGE_TITLE, INTERVALS, frequency, "frequency")
    }

    fn ohlc_url(&self, symbol: &str, interval: u32, since: DateTime<Utc>) -> String {
        format!(
            "{}/0/public/OHLC?pair={}&since={}&interval={}",
            self.base_url.trim_end_matches('/'),
            symbol,
            since.timestamp(),
            interval
        )
    }

    async fn request(
        &self,
        pair: CurrencyPair,
        frequency: CandleFrequency,
        start: DateTime<Utc>,
    ) -> Result<Vec<NormalizedCandle>, IngestError> {
        let url = self.ohlc_url(self.symbol(pair)?, self.interval(frequency)?, start);

        let body = get_text(&self.client, &url)
            .await
            .map_err(|cause| IngestError::source_fetch(EXCHANGE_TITLE, pair, frequency, cause))?;

        parse_ohlc(&body, frequency)
            .map_err(|cause| IngestError::source_fetch(EXCHANGE_TITLE, pair, frequency, cause))
    }
}

impl Connector for KrakenConnector {
    fn exchange_title(&self) -> &str {
        EXCHANGE_TITLE
    }

    fn fetch_candles(
        &self,
        pair: CurrencyPair,
        frequency: CandleFrequency,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> CandleStream<'_> {
        lazy_rows(self.request(pair, frequency, start))
    }
}

/// Parse an OHLC response body. The `error` array is authoritative even when
/// the HTTP status was 200.
pub(crate) fn parse_ohlc(body: &str, frequency: CandleFrequency) -> Result<Vec<NormalizedCandle>, FetchFailure> {
    let envelope: OhlcEnvelope = serde_json::from_str(body)?;
    if !envelope.error.is_empty() {
        return Err(FetchFailure::Exchange(envelope.error.join("; ")));
    }
    let result = envelope
        .result
        .ok_or_else(|| FetchFailure::Malformed("missing result".to_string()))?;

    let mut candles = Vec::new();
    for (key, value) in result {
        // `last` is the polling cursor, not a series
        if key == "last" {
            continue;
        }
        let rows: Vec<KrakenRow> = serde_json::from_value(value)?;
        candles.reserve(rows.len());
        for (time, open, high, low, close, _vwap, volume, _count) in rows {
            candles.push(NormalizedCandle {
                frequency,
                time,
                open: parse_decimal("open", &open)?,
                high: parse_decimal("high", &high)?,
                low: parse_decimal("low", &low)?,
                close: parse_decimal("close", &close)?,
                volume: parse_decimal("volume", &volume)?,
            });
        }
    }
    Ok(candles)
}
