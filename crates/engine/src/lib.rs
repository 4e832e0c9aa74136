//! Engine module - decisions and the game loop
//!
//! Everything that needs more than pure data lives here:
//!
//! - [`oracle`]: the scoring contract, implemented by closures and by
//!   [`NativeOracle`] (the search engine loaded as a shared library)
//! - [`orchestrator`]: concurrent fan-out of the four candidate moves and
//!   first-maximum selection
//! - [`autoplay`]: the poll / decide / act state machine for one game
//! - [`batch`]: several games in a row with a CSV record per game
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use threes_bridge_core::EncodedState;
//! use threes_bridge_engine::{Decision, Orchestrator, OrchestratorConfig};
//! use threes_bridge_types::Move;
//!
//! let oracle = Arc::new(|_: &EncodedState, mv: Move| match mv {
//!     Move::Left => 2.0f32,
//!     _ => 1.0,
//! });
//! let orch = Orchestrator::new(oracle, OrchestratorConfig::default()).unwrap();
//! let state = EncodedState { board: 0x21, deck: 0x0204_0303, tileset: 0b10 };
//! assert_eq!(orch.select_best_move(&state), Decision::Play(Move::Left));
//! ```

pub mod autoplay;
pub mod batch;
pub mod error;
pub mod native;
pub mod oracle;
pub mod orchestrator;

pub use autoplay::{AutoPlayConfig, AutoPlayer, GameOver, GameOverReason, MoveRecord, Step};
pub use batch::{run_batch, BatchConfig, GameRecord, BATCH_HEADER};
pub use error::{AutoPlayError, BatchError, EngineError, OracleError};
pub use native::NativeOracle;
pub use oracle::Oracle;
pub use orchestrator::{
    is_playable, select_best, Decision, Orchestrator, OrchestratorConfig, Strategy,
    DEFAULT_WORKERS,
};
