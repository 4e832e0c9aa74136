//! Automation loop - poll, decide, act
//!
//! ```text
//!            is_terminated()        NoValidMove
//!   Polling ───────────────► Terminated ◄──────── Deciding
//!      ▲  snapshot + resolve                        │
//!      │ ───────────────────────────────────────────┘
//!      │                                            │ Play(move)
//!      └────────────── Executing ◄──────────────────┘
//!         execute_move + commit draw
//! ```
//!
//! [`AutoPlayer::step`] runs exactly one iteration and reports either
//! [`Step::Continue`] or [`Step::GameOver`]; the caller owns the outer loop.
//! Iterations never overlap: the next snapshot is only taken after the
//! current move has been issued.

use std::thread;
use std::time::Duration;

use threes_bridge_core::{EncodedState, GameDriver, ResolvedState, StateBridge};
use threes_bridge_types::{Move, RankGrid, SETTLE_MS};
use tracing::{debug, info};

use crate::error::AutoPlayError;
use crate::orchestrator::{Decision, Orchestrator};

#[derive(Debug, Clone)]
pub struct AutoPlayConfig {
    /// Pause before each snapshot so the previous move's animation settles.
    pub settle: Duration,
    /// Dismiss the "keep playing" overlay on every poll.
    pub keep_playing: bool,
    /// Stop after this many moves.
    pub max_moves: Option<u64>,
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(SETTLE_MS),
            keep_playing: true,
            max_moves: None,
        }
    }
}

/// One move that was sent to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    /// 1-based move number within the game.
    pub move_no: u64,
    pub mv: Move,
    pub state: EncodedState,
    pub grid: RankGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// The game reported it is over.
    Terminated,
    /// The oracle found no playable move.
    NoValidMove,
    /// The configured move limit was reached.
    MoveLimit,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::Terminated => "terminated",
            GameOverReason::NoValidMove => "no_valid_move",
            GameOverReason::MoveLimit => "move_limit",
        }
    }
}

/// Summary handed to the caller once the loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub reason: GameOverReason,
    pub moves: u64,
    /// Last board seen while polling, if any.
    pub last_grid: Option<RankGrid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue(MoveRecord),
    GameOver(GameOver),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Polling,
    Deciding(ResolvedState),
    Executing {
        resolved: ResolvedState,
        state: EncodedState,
        mv: Move,
    },
    Terminated(GameOverReason),
}

/// One game session: a driver, the shared orchestrator, and the deck it tracks.
pub struct AutoPlayer<'o, D> {
    driver: D,
    orchestrator: &'o Orchestrator,
    bridge: StateBridge,
    config: AutoPlayConfig,
    phase: Phase,
    moves: u64,
    last_grid: Option<RankGrid>,
}

impl<'o, D: GameDriver> AutoPlayer<'o, D> {
    pub fn new(driver: D, orchestrator: &'o Orchestrator, config: AutoPlayConfig) -> Self {
        Self {
            driver,
            orchestrator,
            bridge: StateBridge::new(),
            config,
            phase: Phase::Polling,
            moves: 0,
            last_grid: None,
        }
    }

    /// Use `bridge` (e.g. seeded with a known deck) instead of a fresh one.
    pub fn with_bridge(mut self, bridge: StateBridge) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated(_))
    }

    pub fn bridge(&self) -> &StateBridge {
        &self.bridge
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Forget all per-game state before playing a new game.
    pub fn reset(&mut self) {
        self.bridge.reset();
        self.phase = Phase::Polling;
        self.moves = 0;
        self.last_grid = None;
    }

    /// Run one Polling -> Deciding -> Executing iteration.
    ///
    /// Once the game is over, every further call returns the same
    /// [`Step::GameOver`] without touching the driver.
    pub fn step(&mut self) -> Result<Step, AutoPlayError> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Polling) {
                Phase::Polling => self.phase = self.poll()?,
                Phase::Deciding(resolved) => self.phase = self.decide(resolved)?,
                Phase::Executing { resolved, state, mv } => {
                    self.driver.execute_move(mv)?;
                    self.bridge.commit(&resolved)?;
                    self.moves += 1;
                    debug!(move_no = self.moves, mv = %mv.as_char(), "move sent");
                    return Ok(Step::Continue(MoveRecord {
                        move_no: self.moves,
                        mv,
                        state,
                        grid: resolved.grid,
                    }));
                }
                Phase::Terminated(reason) => {
                    self.phase = Phase::Terminated(reason);
                    return Ok(Step::GameOver(GameOver {
                        reason,
                        moves: self.moves,
                        last_grid: self.last_grid,
                    }));
                }
            }
        }
    }

    /// Step until the game is over.
    pub fn run(&mut self) -> Result<GameOver, AutoPlayError> {
        loop {
            if let Step::GameOver(over) = self.step()? {
                info!(
                    reason = over.reason.as_str(),
                    moves = over.moves,
                    "game over"
                );
                return Ok(over);
            }
        }
    }

    fn poll(&mut self) -> Result<Phase, AutoPlayError> {
        if self.config.max_moves.is_some_and(|limit| self.moves >= limit) {
            return Ok(Phase::Terminated(GameOverReason::MoveLimit));
        }
        if self.driver.is_terminated()? {
            return Ok(Phase::Terminated(GameOverReason::Terminated));
        }
        if self.config.keep_playing {
            self.driver.continue_after_win()?;
        }
        if !self.config.settle.is_zero() {
            thread::sleep(self.config.settle);
        }

        let raw = self.driver.snapshot()?;
        let resolved = self.bridge.resolve(&raw)?;
        self.last_grid = Some(resolved.grid);
        Ok(Phase::Deciding(resolved))
    }

    fn decide(&self, resolved: ResolvedState) -> Result<Phase, AutoPlayError> {
        let state = resolved.encode()?;
        Ok(match self.orchestrator.select_best_move(&state) {
            Decision::Play(mv) => Phase::Executing { resolved, state, mv },
            Decision::NoValidMove => Phase::Terminated(GameOverReason::NoValidMove),
        })
    }
}
