//! Deck module - the 12-tile bag of base tiles
//!
//! Threes draws its 1s, 2s and 3s from a bag holding four of each. Tiles are
//! drawn until the bag is empty, then a fresh bag starts (a new "epoch").
//! The live game only shows the deck after a draw, so the bridge keeps its
//! own copy and presents the oracle with the pre-draw state.

use crate::error::EncodeError;
use crate::types::{RankGrid, DECK_MAX_RANK, INITIAL_DECK_PER_RANK, INITIAL_DECK_SIZE};

/// Remaining counts of ranks 1, 2 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Deck {
    counts: [u8; 3],
}

impl Default for Deck {
    fn default() -> Self {
        Self::full()
    }
}

impl Deck {
    /// A fresh deck: four of each base rank.
    pub const fn full() -> Self {
        Self {
            counts: [INITIAL_DECK_PER_RANK; 3],
        }
    }

    /// A deck with nothing left in it.
    pub const fn empty() -> Self {
        Self { counts: [0; 3] }
    }

    /// Build a deck from explicit counts of ranks 1, 2, 3.
    ///
    /// Counts are validated against the epoch invariant (at most four of a
    /// rank, at most twelve in total).
    pub fn from_counts(counts: [u8; 3]) -> Result<Self, EncodeError> {
        let deck = Self { counts };
        deck.validate()?;
        Ok(deck)
    }

    /// Build a deck from the live game's remaining-tile list (face values 1-3).
    ///
    /// # Examples
    ///
    /// ```
    /// use threes_bridge_core::Deck;
    ///
    /// let deck = Deck::from_tiles(&[1, 3, 3, 2, 1]).unwrap();
    /// assert_eq!(deck.counts(), [2, 1, 2]);
    /// assert!(Deck::from_tiles(&[6]).is_err());
    /// ```
    pub fn from_tiles(tiles: &[u32]) -> Result<Self, EncodeError> {
        let mut counts = [0u8; 3];
        for &tile in tiles {
            let idx = Self::index(tile)?;
            counts[idx] = counts[idx].saturating_add(1);
        }
        Self::from_counts(counts)
    }

    /// Estimate the deck from the board when the live game does not expose it.
    ///
    /// Starts from a fresh deck and removes one tile for every 1, 2 or 3 on
    /// the board, saturating at zero. If that leaves nothing, a fresh deck is
    /// assumed.
    pub fn from_board_remainder(grid: &RankGrid) -> Self {
        let mut deck = Self::full();
        for &rank in grid.iter().flatten() {
            if (1..=DECK_MAX_RANK).contains(&rank) {
                let idx = (rank - 1) as usize;
                deck.counts[idx] = deck.counts[idx].saturating_sub(1);
            }
        }
        if deck.is_exhausted() {
            Self::full()
        } else {
            deck
        }
    }

    /// Counts of ranks 1, 2, 3.
    pub fn counts(&self) -> [u8; 3] {
        self.counts
    }

    /// Remaining tiles of one base rank (0 for ranks outside 1-3).
    pub fn count(&self, rank: u8) -> u8 {
        match rank {
            1..=3 => self.counts[(rank - 1) as usize],
            _ => 0,
        }
    }

    /// Total remaining tiles.
    pub fn total(&self) -> u8 {
        self.counts.iter().sum()
    }

    pub fn is_exhausted(&self) -> bool {
        self.total() == 0
    }

    /// Put one tile of `rank` back into the deck.
    pub fn push(&mut self, rank: u8) -> Result<(), EncodeError> {
        let idx = Self::index(rank as u32)?;
        if self.counts[idx] >= INITIAL_DECK_PER_RANK {
            return Err(EncodeError::range(
                "deck count",
                self.counts[idx] as u32 + 1,
                INITIAL_DECK_PER_RANK as u32,
            ));
        }
        self.counts[idx] += 1;
        Ok(())
    }

    /// Draw one tile of `rank`.
    ///
    /// When the draw empties the deck, the next epoch starts immediately and
    /// the deck is full again.
    pub fn draw(&mut self, rank: u8) -> Result<(), EncodeError> {
        let idx = Self::index(rank as u32)?;
        if self.counts[idx] == 0 {
            return Err(EncodeError::DeckUnderflow(rank));
        }
        self.counts[idx] -= 1;
        if self.is_exhausted() {
            *self = Self::full();
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), EncodeError> {
        for &count in &self.counts {
            if count > INITIAL_DECK_PER_RANK {
                return Err(EncodeError::range(
                    "deck count",
                    count as u32,
                    INITIAL_DECK_PER_RANK as u32,
                ));
            }
        }
        if self.total() > INITIAL_DECK_SIZE {
            return Err(EncodeError::range(
                "deck total",
                self.total() as u32,
                INITIAL_DECK_SIZE as u32,
            ));
        }
        Ok(())
    }

    fn index(tile: u32) -> Result<usize, EncodeError> {
        match tile {
            1..=3 => Ok((tile - 1) as usize),
            _ => Err(EncodeError::range("deck tile", tile, DECK_MAX_RANK as u32)),
        }
    }
}
