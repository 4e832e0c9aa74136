//! Live instance capability.
//!
//! The bridge never talks to a game directly. Anything that can answer these
//! five calls can be played: a browser tab behind a debugging transport, a
//! scripted fake in tests, or an in-process simulator.

use crate::error::DriverError;
use crate::types::{FaceGrid, Move};

/// One instantaneous view of the live game, still in face values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSnapshot {
    /// Board as displayed.
    pub board: FaceGrid,
    /// Remaining base tiles after the upcoming tile was drawn, if the game
    /// exposes them.
    pub deck: Option<Vec<u32>>,
    /// Upcoming-tile indicator: 1-3 for a normal draw, larger for a bonus.
    pub next_tile: u32,
}

/// Control surface of one running game.
///
/// `snapshot` must return a consistent view, and a move passed to
/// `execute_move` must take effect before the next `snapshot`.
pub trait GameDriver {
    /// True once the game reports it is lost or over.
    fn is_terminated(&mut self) -> Result<bool, DriverError>;

    /// Read board, deck and upcoming tile.
    fn snapshot(&mut self) -> Result<RawSnapshot, DriverError>;

    /// Inject a directional input. The game animates asynchronously.
    fn execute_move(&mut self, mv: Move) -> Result<(), DriverError>;

    /// Reset the game and confirm the reset dialog.
    fn restart(&mut self) -> Result<(), DriverError>;

    /// Dismiss a "you won, keep playing?" overlay. No-op when absent.
    fn continue_after_win(&mut self) -> Result<(), DriverError>;
}

impl<D: GameDriver + ?Sized> GameDriver for &mut D {
    fn is_terminated(&mut self) -> Result<bool, DriverError> {
        (**self).is_terminated()
    }

    fn snapshot(&mut self) -> Result<RawSnapshot, DriverError> {
        (**self).snapshot()
    }

    fn execute_move(&mut self, mv: Move) -> Result<(), DriverError> {
        (**self).execute_move(mv)
    }

    fn restart(&mut self) -> Result<(), DriverError> {
        (**self).restart()
    }

    fn continue_after_win(&mut self) -> Result<(), DriverError> {
        (**self).continue_after_win()
    }
}
