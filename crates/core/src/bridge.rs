//! State bridge - from a live snapshot to oracle input
//!
//! The bridge owns the one piece of state that survives between loop
//! iterations: the deck. Each iteration it
//!
//! 1. normalizes the board,
//! 2. classifies the upcoming tile and builds the tileset,
//! 3. reconstructs the deck as it was *before* the upcoming tile was drawn,
//!
//! and once the move has been sent, [`StateBridge::commit`] records the draw.

use tracing::warn;

use crate::deck::Deck;
use crate::driver::RawSnapshot;
use crate::encode::{encode, EncodedState};
use crate::error::EncodeError;
use crate::rank::{denormalize, max_rank, normalize_grid};
use crate::tileset::{Tileset, UpcomingTile};
use crate::types::RankGrid;

/// Everything the oracle needs for one decision, before packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedState {
    pub grid: RankGrid,
    /// Deck before the upcoming tile was drawn.
    pub deck: Deck,
    pub tileset: Tileset,
    pub upcoming: UpcomingTile,
}

impl ResolvedState {
    pub fn encode(&self) -> Result<EncodedState, EncodeError> {
        encode(&self.grid, &self.deck, &self.tileset)
    }
}

/// Deck tracking across loop iterations.
#[derive(Debug, Clone, Default)]
pub struct StateBridge {
    deck: Option<Deck>,
}

impl StateBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known pre-draw deck instead of estimating one.
    pub fn with_deck(deck: Deck) -> Self {
        Self { deck: Some(deck) }
    }

    /// Tracked pre-draw deck for the next iteration, if any.
    pub fn deck(&self) -> Option<Deck> {
        self.deck
    }

    /// Forget the tracked deck (new game).
    pub fn reset(&mut self) {
        self.deck = None;
    }

    /// Turn a raw snapshot into a resolved state.
    ///
    /// Does not change the tracked deck; call [`StateBridge::commit`] after
    /// the move has been sent.
    pub fn resolve(&self, raw: &RawSnapshot) -> Result<ResolvedState, EncodeError> {
        let grid = normalize_grid(&raw.board)?;
        let upcoming = UpcomingTile::from_indicator(raw.next_tile)?;

        let tileset = match upcoming {
            UpcomingTile::Normal(rank) => Tileset::single(rank)?,
            UpcomingTile::Bonus => Tileset::bonus(denormalize(max_rank(&grid))?)?,
        };

        let deck = match raw.deck.as_deref() {
            Some(tiles) => pre_draw_deck(Deck::from_tiles(tiles)?, upcoming),
            None => self.tracked_deck(&grid, upcoming)?,
        };

        Ok(ResolvedState {
            grid,
            deck,
            tileset,
            upcoming,
        })
    }

    /// Record that the upcoming tile of `state` has been drawn.
    pub fn commit(&mut self, state: &ResolvedState) -> Result<(), EncodeError> {
        let mut deck = state.deck;
        if let UpcomingTile::Normal(rank) = state.upcoming {
            deck.draw(rank)?;
        }
        self.deck = Some(deck);
        Ok(())
    }

    fn tracked_deck(&self, grid: &RankGrid, upcoming: UpcomingTile) -> Result<Deck, EncodeError> {
        let mut deck = self
            .deck
            .unwrap_or_else(|| Deck::from_board_remainder(grid));
        if let UpcomingTile::Normal(rank) = upcoming {
            if deck.count(rank) == 0 {
                warn!(rank, counts = ?deck.counts(), "tracked deck has drifted from the game");
                deck.push(rank)?;
            }
        }
        Ok(deck)
    }
}

/// The observed deck is post-draw; put the upcoming tile back.
///
/// If the game already refilled its deck after the draw, there is no room
/// for the tile and the pre-draw deck held only that tile.
fn pre_draw_deck(observed: Deck, upcoming: UpcomingTile) -> Deck {
    let UpcomingTile::Normal(rank) = upcoming else {
        return observed;
    };
    let mut deck = observed;
    if deck.push(rank).is_ok() {
        return deck;
    }
    let mut counts = [0u8; 3];
    counts[(rank - 1) as usize] = 1;
    Deck::from_counts(counts).unwrap_or(observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(deck: Option<Vec<u32>>, next_tile: u32) -> RawSnapshot {
        RawSnapshot {
            board: [[1, 2, 3, 0], [0, 6, 12, 0], [0, 0, 96, 0], [0, 0, 0, 0]],
            deck,
            next_tile,
        }
    }

    #[test]
    fn observed_deck_gets_upcoming_tile_back() {
        let bridge = StateBridge::new();
        let state = bridge.resolve(&snapshot(Some(vec![1, 1, 2, 3]), 2)).unwrap();
        assert_eq!(state.deck.counts(), [2, 2, 1]);
        assert_eq!(state.tileset, Tileset::single(2).unwrap());
        assert_eq!(state.upcoming, UpcomingTile::Normal(2));
    }

    #[test]
    fn refilled_observed_deck_means_last_tile_of_epoch() {
        let bridge = StateBridge::new();
        let full = vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3];
        let state = bridge.resolve(&snapshot(Some(full), 3)).unwrap();
        assert_eq!(state.deck.counts(), [0, 0, 1]);
    }

    #[test]
    fn bonus_keeps_observed_deck_and_derives_tileset() {
        let bridge = StateBridge::new();
        let state = bridge.resolve(&snapshot(Some(vec![1, 2]), 12)).unwrap();
        assert_eq!(state.deck.counts(), [1, 1, 0]);
        assert_eq!(state.tileset.ranks().collect::<Vec<_>>(), vec![4, 5]);
        assert!(state.upcoming.is_bonus());
    }

    #[test]
    fn bonus_sentinel_indicator_derives_tileset_from_board() {
        let bridge = StateBridge::new();
        let state = bridge.resolve(&snapshot(Some(vec![1, 2]), 4)).unwrap();
        assert_eq!(state.deck.counts(), [1, 1, 0]);
        assert_eq!(state.tileset.ranks().collect::<Vec<_>>(), vec![4, 5]);
        assert!(state.upcoming.is_bonus());
    }

    #[test]
    fn untracked_deck_starts_from_board_remainder() {
        let bridge = StateBridge::new();
        let state = bridge.resolve(&snapshot(None, 1)).unwrap();
        assert_eq!(state.deck.counts(), [3, 3, 3]);
    }

    #[test]
    fn commit_draws_from_tracked_deck() {
        let mut bridge = StateBridge::with_deck(Deck::from_counts([1, 0, 0]).unwrap());
        let state = bridge.resolve(&snapshot(None, 1)).unwrap();
        assert_eq!(state.deck.counts(), [1, 0, 0]);
        bridge.commit(&state).unwrap();
        // Last tile of the epoch: the deck starts over.
        assert_eq!(bridge.deck(), Some(Deck::full()));
    }

    #[test]
    fn drifted_tracked_deck_is_repaired() {
        let bridge = StateBridge::with_deck(Deck::from_counts([0, 2, 0]).unwrap());
        let state = bridge.resolve(&snapshot(None, 3)).unwrap();
        assert_eq!(state.deck.counts(), [0, 2, 1]);
    }

    #[test]
    fn unknown_board_value_aborts_resolution() {
        let mut raw = snapshot(None, 1);
        raw.board[3][3] = 5;
        assert_eq!(
            StateBridge::new().resolve(&raw),
            Err(EncodeError::UnknownTileValue(5))
        );
    }
}
