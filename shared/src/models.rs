use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency pairs tracked across all exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize, Deserialize)]
pub enum CurrencyPair {
    #[serde(rename = "BTC-USD")]
    BtcUsd,
    #[serde(rename = "ETH-USD")]
    EthUsd,
    #[serde(rename = "XRP-EUR")]
    XrpEur,
    #[serde(rename = "XRP-USD")]
    XrpUsd,
}

impl CurrencyPair {
    /// Title stored in the `pairs` table and accepted by the HTTP query.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BtcUsd => "BTC-USD",
            Self::EthUsd => "ETH-USD",
            Self::XrpEur => "XRP-EUR",
            Self::XrpUsd => "XRP-USD",
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|pair| pair.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unsupported currency pair: {}", s))
    }
}

/// Bucket width of a candle series. Persisted as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "lowercase")]
pub enum CandleFrequency {
    #[sea_orm(num_value = 1)]
    Minute,
    #[sea_orm(num_value = 2)]
    Hour,
}

impl fmt::Display for CandleFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minute => f.write_str("minute"),
            Self::Hour => f.write_str("hour"),
        }
    }
}

/// A candle ready to be persisted, already stamped with its foreign keys.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCandle {
    pub exchange_id: i32,
    pub pair_id: i32,
    pub frequency: CandleFrequency,
    /// Start of the bucket, unix seconds
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremeKind {
    Min,
    Max,
}

/// One entry of the daily min/max answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    #[serde(rename = "Type")]
    pub kind: ExtremeKind,
    pub time: DateTime<Utc>,
    pub close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    #[serde(rename = "Exchange")]
    pub exchange: String,
}
