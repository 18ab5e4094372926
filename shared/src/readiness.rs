//! Process-wide ingestion readiness.
//!
//! The filler is the only writer; the HTTP layer (and anything else holding
//! a clone) reads it to decide whether persisted candles may be served.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    /// No fill run has started yet
    #[default]
    Unknown,
    /// A fill run is in progress
    Filling,
    /// The last fill run completed
    Ready,
    /// The last fill run aborted; needs a restart
    Error,
}

impl ReadinessState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Filling => 1,
            Self::Ready => 2,
            Self::Error => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Filling,
            2 => Self::Ready,
            3 => Self::Error,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Filling => write!(f, "filling"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Shared readiness cell. Cloning yields another handle to the same cell.
#[derive(Clone, Default)]
pub struct Readiness {
    inner: Arc<AtomicU8>,
}

impl Readiness {
    /// Create a new cell in the `Unknown` state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ReadinessState {
        ReadinessState::from_u8(self.inner.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: ReadinessState) {
        self.inner.store(state.as_u8(), Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.get() == ReadinessState::Ready
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Readiness").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unknown() {
        let readiness = Readiness::new();
        assert_eq!(readiness.get(), ReadinessState::Unknown);
        assert!(!readiness.is_ready());
    }

    #[test]
    fn test_clones_share_the_cell() {
        let writer = Readiness::new();
        let reader = writer.clone();

        for state in [
            ReadinessState::Filling,
            ReadinessState::Ready,
            ReadinessState::Filling,
            ReadinessState::Error,
        ] {
            writer.set(state);
            assert_eq!(reader.get(), state);
        }
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&ReadinessState::Filling).unwrap();
        assert_eq!(json, "\"filling\"");
    }
}
