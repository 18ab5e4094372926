//! Candle ingestion: exchange connectors and the database filler.
//!
//! # Features
//!
//! - **Connectors**: one per exchange, each translating a pair, frequency and
//!   time window into that exchange's REST call and yielding normalized candles
//! - **Filler**: prunes stale rows, then drives every connector over every pair
//!   and frequency, writing candles in bounded batches and publishing readiness
//!
//! # Example
//!
//! ```no_run
//! use feeder::{build_connectors, DatabaseFiller};
//! use shared::{Config, Readiness, SeaOrmCandleStore};
//! use std::sync::Arc;
//!
//! # async fn run(db: sea_orm::DatabaseConnection) -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let connectors = build_connectors(&config)?;
//! let store = Arc::new(SeaOrmCandleStore::new(db));
//! let filler = DatabaseFiller::new(store, connectors, Readiness::new(), config.fill);
//! filler.fill_database(chrono::Utc::now()).await?;
//! # Ok(())
//! # }
//! ```

pub mod connector;
pub mod error;
pub mod filler;

pub mod prelude {
    pub use crate::connector::*;
    pub use crate::error::*;
    pub use crate::filler::*;
}

pub use connector::{build_connectors, BitfinexConnector, Connector, KrakenConnector, NormalizedCandle};
pub use error::{FetchFailure, IngestError, Result};
pub use filler::{DatabaseFiller, FillReport};
