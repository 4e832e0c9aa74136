//! Move orchestrator - fan out one scoring call per move, pick the best
//!
//! The orchestrator is the explicit context object shared by every game
//! session: it owns the oracle handle and, for the parallel strategy, a
//! fixed pool of scoring workers. Nothing here is global.
//!
//! # Tie-break
//!
//! Scores are paired with their move ordinal, never with completion order.
//! After all four are in, a left-to-right scan keeps the first strictly
//! greater score, so equal scores resolve to the lowest ordinal
//! (Up before Down before Left before Right).

use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use threes_bridge_core::EncodedState;
use threes_bridge_types::Move;
use tracing::debug;

use crate::error::EngineError;
use crate::oracle::Oracle;

/// Default number of scoring workers (one per move).
pub const DEFAULT_WORKERS: usize = 4;

/// How the four candidate moves are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Score the four moves concurrently on the worker pool.
    #[default]
    Parallel,
    /// Score the four moves one after another (oracle not thread-safe).
    Sequential,
    /// Let the oracle pick the move itself.
    Delegate,
}

impl Strategy {
    /// Parse strategy from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "parallel" | "par" => Some(Strategy::Parallel),
            "sequential" | "seq" => Some(Strategy::Sequential),
            "delegate" => Some(Strategy::Delegate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Parallel => "parallel",
            Strategy::Sequential => "sequential",
            Strategy::Delegate => "delegate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub strategy: Strategy,
    /// Worker threads for [`Strategy::Parallel`].
    pub workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Parallel,
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Play(Move),
    /// No candidate move is playable; the game is over.
    NoValidMove,
}

impl Decision {
    pub fn as_move(&self) -> Option<Move> {
        match self {
            Decision::Play(mv) => Some(*mv),
            Decision::NoValidMove => None,
        }
    }
}

impl From<Option<Move>> for Decision {
    fn from(mv: Option<Move>) -> Self {
        mv.map_or(Decision::NoValidMove, Decision::Play)
    }
}

/// Whether an oracle score denotes a playable move.
///
/// NaN, infinities below zero, negative values and zero (the engine's
/// "board did not change" result) are all unplayable.
pub fn is_playable(score: f32) -> bool {
    score > 0.0
}

/// First-maximum-wins selection over scores indexed by move ordinal.
///
/// # Examples
///
/// ```
/// use threes_bridge_engine::select_best;
/// use threes_bridge_types::Move;
///
/// assert_eq!(select_best(&[1.0, 3.0, 3.0, 2.0]), Some(Move::Down));
/// assert_eq!(select_best(&[5.0; 4]), Some(Move::Up));
/// assert_eq!(select_best(&[0.0, -1.0, f32::NAN, f32::NEG_INFINITY]), None);
/// ```
pub fn select_best(scores: &[f32; 4]) -> Option<Move> {
    let mut best: Option<(Move, f32)> = None;
    for (mv, &score) in Move::ALL.iter().zip(scores.iter()) {
        if !is_playable(score) {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((*mv, score)),
        }
    }
    best.map(|(mv, _)| mv)
}

/// Oracle handle plus scoring workers.
pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    pool: Option<ThreadPool>,
    strategy: Strategy,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("strategy", &self.strategy)
            .field("workers", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}

impl Orchestrator {
    /// Build the context once; the pool is created only for the parallel
    /// strategy.
    pub fn new(oracle: Arc<dyn Oracle>, config: OrchestratorConfig) -> Result<Self, EngineError> {
        let pool = match config.strategy {
            Strategy::Parallel => Some(
                ThreadPoolBuilder::new()
                    .num_threads(config.workers.max(1))
                    .thread_name(|i| format!("threes-score-{i}"))
                    .build()
                    .map_err(|e| EngineError::WorkerPool(e.to_string()))?,
            ),
            Strategy::Sequential | Strategy::Delegate => None,
        };
        Ok(Self {
            oracle,
            pool,
            strategy: config.strategy,
        })
    }

    /// Context without workers; never fails.
    pub fn sequential(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            pool: None,
            strategy: Strategy::Sequential,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn oracle(&self) -> &Arc<dyn Oracle> {
        &self.oracle
    }

    /// Score all four moves, indexed by ordinal.
    ///
    /// Returns only after every score is in.
    pub fn score_all(&self, state: &EncodedState) -> [f32; 4] {
        let oracle = &self.oracle;
        match &self.pool {
            Some(pool) => {
                let pairs: Vec<(usize, f32)> = pool.install(|| {
                    Move::ALL
                        .par_iter()
                        .map(|&mv| (mv.ordinal(), oracle.score(state, mv)))
                        .collect()
                });
                let mut scores = [f32::NAN; 4];
                for (i, score) in pairs {
                    scores[i] = score;
                }
                scores
            }
            None => Move::ALL.map(|mv| oracle.score(state, mv)),
        }
    }

    /// Choose the move to play for `state`.
    pub fn select_best_move(&self, state: &EncodedState) -> Decision {
        let decision = match self.strategy {
            Strategy::Delegate => Decision::from(self.oracle.best_move(state)),
            Strategy::Parallel | Strategy::Sequential => {
                let scores = self.score_all(state);
                debug!(?scores, "scored moves");
                Decision::from(select_best(&scores))
            }
        };
        debug!(?decision, strategy = self.strategy.as_str(), "decision");
        decision
    }
}
