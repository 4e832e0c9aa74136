//! Bridge errors.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`EncodeError::UnknownTileValue`] | `UNKNOWN_TILE_VALUE` | No |
//! | [`EncodeError::EncodingRange`] | `ENCODING_RANGE` | No |
//! | [`EncodeError::BonusInvariant`] | `BONUS_INVARIANT` | No |
//! | [`EncodeError::DeckUnderflow`] | `DECK_UNDERFLOW` | No |
//! | [`DriverError::Transport`] | `TRANSPORT_FAILURE` | Yes |
//! | [`DriverError::Malformed`] | `MALFORMED_RESPONSE` | No |
//!
//! Encoding errors mean the snapshot violated an invariant upstream; they
//! abort the current run. Driver errors reach the caller only after the
//! driver has given up retrying.

use thiserror::Error;

/// Failure while normalizing or packing a live snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Face value outside the sixteen known tile values.
    #[error("unknown tile value: {0}")]
    UnknownTileValue(u32),

    /// A rank, deck count or tileset member does not fit its packed field,
    /// or breaks a deck invariant.
    #[error("{field} out of range: {value} (max {max})")]
    EncodingRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// Bonus tile candidates could not be derived from the board maximum.
    #[error("cannot derive bonus tiles from board maximum {max_value}: {reason}")]
    BonusInvariant {
        max_value: u32,
        reason: &'static str,
    },

    /// A tile of this rank was drawn from a deck that holds none.
    #[error("deck has no tile of rank {0} left")]
    DeckUnderflow(u8),
}

impl EncodeError {
    pub fn code(&self) -> &'static str {
        match self {
            EncodeError::UnknownTileValue(_) => "UNKNOWN_TILE_VALUE",
            EncodeError::EncodingRange { .. } => "ENCODING_RANGE",
            EncodeError::BonusInvariant { .. } => "BONUS_INVARIANT",
            EncodeError::DeckUnderflow(_) => "DECK_UNDERFLOW",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        false
    }

    pub(crate) fn range(field: &'static str, value: u32, max: u32) -> Self {
        EncodeError::EncodingRange { field, value, max }
    }
}

/// Failure reported by a live-instance driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The transport could not execute a query or command.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The instance answered, but not with the expected shape.
    #[error("malformed response to {query}: {detail}")]
    Malformed {
        query: &'static str,
        detail: String,
    },
}

impl DriverError {
    pub fn code(&self) -> &'static str {
        match self {
            DriverError::Transport(_) => "TRANSPORT_FAILURE",
            DriverError::Malformed { .. } => "MALFORMED_RESPONSE",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, DriverError::Transport(_))
    }
}
