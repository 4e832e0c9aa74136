//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the bridge.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (encoding, move orchestration, live-instance control).
//!
//! # Board Dimensions
//!
//! The Threes playfield is a fixed 4x4 grid:
//!
//! - **Side**: 4 cells (indexed 0-3)
//! - **Cells**: 16, addressed row-major (`row * 4 + col`)
//!
//! # Tile Face Values
//!
//! Every tile on the board carries one of sixteen face values. The bridge
//! never works with face values directly past the normalization step; it
//! uses the dense rank index instead:
//!
//! | Rank | Face | Rank | Face |
//! |------|------|------|------|
//! | 0 | empty | 8 | 96 |
//! | 1 | 1 | 9 | 192 |
//! | 2 | 2 | 10 | 384 |
//! | 3 | 3 | 11 | 768 |
//! | 4 | 6 | 12 | 1536 |
//! | 5 | 12 | 13 | 3072 |
//! | 6 | 24 | 14 | 6144 |
//! | 7 | 48 | 15 | 12288 |
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SETTLE_MS` | 100 | Wait before each snapshot so animations finish |
//! | `KEY_HOLD_MS` | 100 | Delay between synthetic key down and key up |
//!
//! # Examples
//!
//! ```
//! use threes_bridge_types::{Move, KeyAction, BOARD_SIDE, FACE_VALUES};
//!
//! // Moves are ordered Up, Down, Left, Right
//! assert_eq!(Move::Up.ordinal(), 0);
//! assert_eq!(Move::from_ordinal(3), Some(Move::Right));
//!
//! // Parse from string (case-insensitive)
//! assert_eq!(Move::from_str("LEFT"), Some(Move::Left));
//!
//! // Key codes used for input injection
//! assert_eq!(Move::Down.key_code(), 40);
//! assert_eq!(KeyAction::Down.as_str(), "keydown");
//!
//! assert_eq!(BOARD_SIDE, 4);
//! assert_eq!(FACE_VALUES[15], 12288);
//! ```

/// Board side length in cells (4)
pub const BOARD_SIDE: usize = 4;

/// Number of cells on the board (16)
pub const BOARD_CELLS: usize = BOARD_SIDE * BOARD_SIDE;

/// Largest rank index that fits in a 4-bit cell (15 = 12288)
pub const MAX_RANK: u8 = 15;

/// Tile face values indexed by rank
///
/// Index 0 is the empty cell. The mapping is strictly increasing, so the
/// rank order matches the face-value order.
pub const FACE_VALUES: [u32; 16] = [
    0, 1, 2, 3, 6, 12, 24, 48, 96, 192, 384, 768, 1536, 3072, 6144, 12288,
];

/// Largest rank that can be drawn from the deck (3)
pub const DECK_MAX_RANK: u8 = 3;

/// Copies of each base rank (1, 2, 3) in a fresh deck
pub const INITIAL_DECK_PER_RANK: u8 = 4;

/// Size of a fresh deck (12 tiles)
pub const INITIAL_DECK_SIZE: u8 = INITIAL_DECK_PER_RANK * DECK_MAX_RANK;

/// Bonus candidates are derived from the board maximum divided by this factor
pub const BONUS_DIVISOR: u32 = 8;

/// Settle delay before each snapshot (100ms)
pub const SETTLE_MS: u64 = 100;

/// Delay between a synthetic key down and its key up (100ms)
pub const KEY_HOLD_MS: u64 = 100;

/// Key code that resets the game ('R')
pub const KEY_RESTART: u16 = 82;

/// Key code that confirms the reset dialog (space)
pub const KEY_CONFIRM: u16 = 32;

/// A 4x4 grid of raw tile face values, as read from the live game
pub type FaceGrid = [[u32; BOARD_SIDE]; BOARD_SIDE];

/// A 4x4 grid of dense rank indices (0 = empty)
pub type RankGrid = [[u8; BOARD_SIDE]; BOARD_SIDE];

/// The four sliding directions
///
/// The declaration order is load-bearing:
/// - it is the ordinal passed to the oracle (**Up**=0, **Down**=1, **Left**=2, **Right**=3)
/// - it breaks ties when two moves score the same (lowest ordinal wins)
/// - it indexes the key codes used for input injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All moves in ordinal order
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Ordinal index (0-3)
    pub fn ordinal(&self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    /// Convert an ordinal back into a move
    ///
    /// Negative values and values above 3 are not moves. Oracles use a
    /// negative ordinal to say "no legal move".
    ///
    /// # Examples
    ///
    /// ```
    /// use threes_bridge_types::Move;
    ///
    /// assert_eq!(Move::from_ordinal(1), Some(Move::Down));
    /// assert_eq!(Move::from_ordinal(-1), None);
    /// ```
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(Move::Up),
            1 => Some(Move::Down),
            2 => Some(Move::Left),
            3 => Some(Move::Right),
            _ => None,
        }
    }

    /// Browser key code for this direction (arrow keys)
    pub fn key_code(&self) -> u16 {
        match self {
            Move::Up => 38,
            Move::Down => 40,
            Move::Left => 37,
            Move::Right => 39,
        }
    }

    /// Parse move from string (case-insensitive)
    ///
    /// Accepts full names or single letters: "up" | "u", "down" | "d",
    /// "left" | "l", "right" | "r"
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Some(Move::Up),
            "down" | "d" => Some(Move::Down),
            "left" | "l" => Some(Move::Left),
            "right" | "r" => Some(Move::Right),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        }
    }

    /// Single-letter form used in compact move logs ("UDLR")
    pub fn as_char(&self) -> char {
        match self {
            Move::Up => 'U',
            Move::Down => 'D',
            Move::Left => 'L',
            Move::Right => 'R',
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of a synthetic key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Down,
    Up,
}

impl KeyAction {
    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAction::Down => "keydown",
            KeyAction::Up => "keyup",
        }
    }
}
