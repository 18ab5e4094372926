//! Shared building blocks of the candle service: configuration, persistence,
//! readiness and the min/max query.

pub mod config;
pub mod database;
pub mod entity;
pub mod models;
pub mod query;
pub mod readiness;
pub mod store;

pub use config::{Config, FillConfig};
pub use database::get_db_connection;
pub use models::*;
pub use query::pair_extremes;
pub use readiness::{Readiness, ReadinessState};
pub use store::{CandleStore, SeaOrmCandleStore};
