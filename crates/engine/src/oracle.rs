//! Oracle contract.
//!
//! The oracle scores a (state, move) pair. It must be pure, deterministic
//! for identical inputs, and callable from several threads at once after
//! its one-time initialization (which happens when the handle is built).

use threes_bridge_core::EncodedState;
use threes_bridge_types::Move;

use crate::orchestrator::select_best;

/// External decision engine.
pub trait Oracle: Send + Sync {
    /// Score one move; higher is better. Values that are not strictly
    /// positive mean the move is unplayable.
    fn score(&self, state: &EncodedState, mv: Move) -> f32;

    /// Choose a move directly.
    ///
    /// Engines with their own best-move entry point override this; the
    /// default scores all four moves in order.
    fn best_move(&self, state: &EncodedState) -> Option<Move> {
        select_best(&Move::ALL.map(|mv| self.score(state, mv)))
    }
}

/// Closures are oracles; handy for tests and simple heuristics.
impl<F> Oracle for F
where
    F: Fn(&EncodedState, Move) -> f32 + Send + Sync,
{
    fn score(&self, state: &EncodedState, mv: Move) -> f32 {
        self(state, mv)
    }
}
