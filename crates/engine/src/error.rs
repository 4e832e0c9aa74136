//! Engine Layer Errors.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`OracleError::Unavailable`] | `ORACLE_UNAVAILABLE` | No |
//! | [`OracleError::InvalidWeights`] | `ORACLE_INVALID_WEIGHTS` | No |
//! | [`EngineError::WorkerPool`] | `ENGINE_WORKER_POOL` | No |
//! | [`AutoPlayError::Encode`] | inner code | No |
//! | [`AutoPlayError::Driver`] | inner code | inner |
//!
//! Oracle errors happen at startup, before any game loop begins. "No valid
//! move" is not an error; it is [`crate::Decision::NoValidMove`].

use threes_bridge_core::{DriverError, EncodeError};
use thiserror::Error;

/// The external engine could not be brought up.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// Library missing, not loadable, or lacking a required entry point.
    #[error("oracle unavailable at {path}: {reason}")]
    Unavailable { path: String, reason: String },

    /// The heuristic weight vector has the wrong length.
    #[error("expected {expected} heuristic weights, got {got}")]
    InvalidWeights { expected: usize, got: usize },
}

impl OracleError {
    pub fn code(&self) -> &'static str {
        match self {
            OracleError::Unavailable { .. } => "ORACLE_UNAVAILABLE",
            OracleError::InvalidWeights { .. } => "ORACLE_INVALID_WEIGHTS",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// Orchestrator construction failure.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("worker pool: {0}")]
    WorkerPool(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::WorkerPool(_) => "ENGINE_WORKER_POOL",
        }
    }
}

/// A run of the automation loop stopped abnormally.
#[derive(Debug, Clone, Error)]
pub enum AutoPlayError {
    /// The snapshot could not be normalized or packed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The live instance could not be queried or controlled.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl AutoPlayError {
    pub fn code(&self) -> &'static str {
        match self {
            AutoPlayError::Encode(e) => e.code(),
            AutoPlayError::Driver(e) => e.code(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            AutoPlayError::Encode(e) => e.is_recoverable(),
            AutoPlayError::Driver(e) => e.is_recoverable(),
        }
    }
}

/// A batch of games stopped before finishing.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("game {game}: {source}")]
    Game {
        game: usize,
        #[source]
        source: AutoPlayError,
    },

    #[error("writing results: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoplay_error_forwards_inner_code() {
        let err = AutoPlayError::from(EncodeError::UnknownTileValue(5));
        assert_eq!(err.code(), "UNKNOWN_TILE_VALUE");
        assert_eq!(err.to_string(), "unknown tile value: 5");

        let err = AutoPlayError::from(DriverError::Transport("reset".into()));
        assert_eq!(err.code(), "TRANSPORT_FAILURE");
        assert!(err.is_recoverable());
    }

    #[test]
    fn oracle_errors_are_fatal() {
        let err = OracleError::Unavailable {
            path: "bin/threes.so".into(),
            reason: "not found".into(),
        };
        assert_eq!(err.code(), "ORACLE_UNAVAILABLE");
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "oracle unavailable at bin/threes.so: not found");
    }
}
