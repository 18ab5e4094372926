//! Error types for candle ingestion.

use shared::{CandleFrequency, CurrencyPair};
use thiserror::Error;

/// Errors that abort a fill run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A connector could not obtain candles from its exchange
    #[error("Fetching {frequency} {pair} candles from {exchange} failed: {cause}")]
    SourceFetch {
        exchange: String,
        pair: CurrencyPair,
        frequency: CandleFrequency,
        #[source]
        cause: FetchFailure,
    },

    /// A connector's static table has no entry for an enumerated value
    #[error("{exchange} has no mapping for {missing}")]
    ConfigurationMismatch { exchange: String, missing: String },

    /// Store operation failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] sea_orm::DbErr),

    /// A frequency without a configured fetch window
    #[error("No fetch window configured for {0} candles")]
    UnsupportedFrequency(CandleFrequency),
}

/// Underlying cause of a `SourceFetch` error.
#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Error envelope returned alongside a successful status
    #[error("exchange reported: {0}")]
    Exchange(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl IngestError {
    pub fn source_fetch(
        exchange: impl Into<String>,
        pair: CurrencyPair,
        frequency: CandleFrequency,
        cause: FetchFailure,
    ) -> Self {
        Self::SourceFetch {
            exchange: exchange.into(),
            pair,
            frequency,
            cause,
        }
    }

    pub fn configuration_mismatch(exchange: impl Into<String>, missing: impl Into<String>) -> Self {
        Self::ConfigurationMismatch {
            exchange: exchange.into(),
            missing: missing.into(),
        }
    }
}

/// Result type alias using IngestError.
pub type Result<T> = std::result::Result<T, IngestError>;
