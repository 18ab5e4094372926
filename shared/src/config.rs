use crate::models::CandleFrequency;
use anyhow::Context;
use chrono::Duration;
use dotenv::dotenv;
use std::collections::HashMap;
use std::str::FromStr;

pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub log_level: String,
    /// Per-request timeout for exchange calls, seconds
    pub fetch_timeout_secs: u64,
    pub bitfinex_base_url: String,
    pub kraken_base_url: String,
    pub fill: FillConfig,
}

/// Knobs of a single fill run.
#[derive(Debug, Clone)]
pub struct FillConfig {
    /// A batch is flushed once it holds more than this many rows
    pub batch_size: usize,
    /// Rows older than midnight of (today - retention_days) are pruned
    pub retention_days: u32,
    /// Lookback per frequency; the fetch window ends one minute before now
    pub fetch_windows: HashMap<CandleFrequency, Duration>,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            retention_days: 0,
            fetch_windows: HashMap::from([
                (CandleFrequency::Minute, Duration::days(1)),
                (CandleFrequency::Hour, Duration::days(30)),
            ]),
        }
    }
}

impl FillConfig {
    pub fn fetch_window(&self, frequency: CandleFrequency) -> Option<Duration> {
        self.fetch_windows.get(&frequency).copied()
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

/// Lookback in whole days; a window of zero or fewer days would start after it ends.
fn env_window_days(key: &str, default: i64) -> Result<Duration, anyhow::Error> {
    let days: i64 = env_parse(key, default)?;
    anyhow::ensure!(days > 0, "Invalid {}: {} (must be at least 1 day)", key, days);
    Ok(Duration::days(days))
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let minute_window = env_window_days("MINUTE_WINDOW_DAYS", 1)?;
        let hour_window = env_window_days("HOUR_WINDOW_DAYS", 30)?;

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://candles.sqlite?mode=rwc".to_string()),
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:9999".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            fetch_timeout_secs: env_parse("FETCH_TIMEOUT_SECS", 30)?,
            bitfinex_base_url: std::env::var("BITFINEX_BASE_URL")
                .unwrap_or_else(|_| "https://api-pub.bitfinex.com".to_string()),
            kraken_base_url: std::env::var("KRAKEN_BASE_URL")
                .unwrap_or_else(|_| "https://api.kraken.com".to_string()),
            fill: FillConfig {
                batch_size: env_parse("FILL_BATCH_SIZE", 1000)?,
                retention_days: env_parse("RETENTION_DAYS", 0)?,
                fetch_windows: HashMap::from([
                    (CandleFrequency::Minute, minute_window),
                    (CandleFrequency::Hour, hour_window),
                ]),
            },
        })
    }
}
