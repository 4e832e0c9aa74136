//! Core bridge module - pure, deterministic, and testable
//!
//! This module turns what the live game shows into what the oracle reads.
//! It has **zero dependencies** on networking, threads, or the oracle itself:
//!
//! - **Deterministic**: the same snapshot always yields the same encoding
//! - **Strict**: unknown tile values and out-of-range fields are errors, never coerced
//! - **Testable**: every invariant is covered by unit tests
//!
//! # Module Structure
//!
//! - [`rank`]: face value <-> dense rank index normalization
//! - [`deck`]: the 12-tile bag of 1s, 2s and 3s, with epoch resets
//! - [`tileset`]: upcoming-tile classification and bonus candidate derivation
//! - [`encode`]: packing into the oracle's board / deck / tileset words
//! - [`bridge`]: per-iteration resolution and deck tracking across iterations
//! - [`driver`]: the live-instance capability trait
//!
//! # Example
//!
//! ```
//! use threes_bridge_core::{RawSnapshot, StateBridge};
//!
//! let raw = RawSnapshot {
//!     board: [[1, 2, 3, 0], [0, 6, 0, 0], [0, 0, 0, 0], [0, 0, 0, 3]],
//!     deck: Some(vec![1, 2, 2, 3]),
//!     next_tile: 1,
//! };
//!
//! let mut bridge = StateBridge::new();
//! let state = bridge.resolve(&raw).unwrap();
//! let encoded = state.encode().unwrap();
//!
//! // Deck word: two 1s (one pushed back), two 2s, one 3, max rank 4.
//! assert_eq!(encoded.deck, 0x0401_0202);
//! assert_eq!(encoded.tileset, 0b10);
//!
//! bridge.commit(&state).unwrap();
//! assert_eq!(bridge.deck().unwrap().counts(), [1, 2, 1]);
//! ```

pub mod bridge;
pub mod deck;
pub mod driver;
pub mod encode;
pub mod error;
pub mod rank;
pub mod tileset;

pub use threes_bridge_types as types;

// Re-export commonly used types for convenience
pub use bridge::{ResolvedState, StateBridge};
pub use deck::Deck;
pub use driver::{GameDriver, RawSnapshot};
pub use encode::{decode_board, decode_deck, decode_tileset, encode, encode_board, EncodedState};
pub use error::{DriverError, EncodeError};
pub use rank::{board_score, denormalize, max_rank, normalize, normalize_grid};
pub use tileset::{bonus_candidates, Tileset, UpcomingTile};
