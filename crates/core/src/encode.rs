//! Encode module - packing state into the oracle's fixed-width words
//!
//! # Layout
//!
//! ```text
//! board   (u64): cell i occupies bits 4i..4i+3, cells row-major
//! deck    (u32): byte 0 = #1s, byte 1 = #2s, byte 2 = #3s, byte 3 = max board rank
//! tileset (u16): bit r set iff rank r can appear next
//! ```

use std::fmt;

use crate::deck::Deck;
use crate::error::EncodeError;
use crate::rank::max_rank;
use crate::tileset::Tileset;
use crate::types::{RankGrid, BOARD_SIDE, MAX_RANK};

/// The only state representation the oracle accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedState {
    pub board: u64,
    pub deck: u32,
    pub tileset: u16,
}

/// Pack a full state.
///
/// # Examples
///
/// ```
/// use threes_bridge_core::{encode, Deck, Tileset};
///
/// let mut grid = [[0u8; 4]; 4];
/// grid[0][0] = 3;
/// grid[3][3] = 5;
/// let state = encode(&grid, &Deck::full(), &Tileset::single(1).unwrap()).unwrap();
/// assert_eq!(state.board, 0x5000_0000_0000_0003);
/// assert_eq!(state.deck, 0x0504_0404);
/// assert_eq!(state.tileset, 0b10);
/// ```
pub fn encode(grid: &RankGrid, deck: &Deck, tileset: &Tileset) -> Result<EncodedState, EncodeError> {
    if tileset.is_empty() {
        return Err(EncodeError::range("tileset size", 0, MAX_RANK as u32 + 1));
    }
    // Re-validate in case the deck was assembled from raw counts elsewhere.
    let deck = Deck::from_counts(deck.counts())?;
    let board = encode_board(grid)?;
    Ok(EncodedState {
        board,
        deck: encode_deck(&deck, max_rank(grid)),
        tileset: tileset.bits(),
    })
}

/// Pack a rank grid, 4 bits per cell.
pub fn encode_board(grid: &RankGrid) -> Result<u64, EncodeError> {
    let mut board = 0u64;
    for (i, &rank) in grid.iter().flatten().enumerate() {
        if rank > MAX_RANK {
            return Err(EncodeError::range("rank", rank as u32, MAX_RANK as u32));
        }
        board |= (rank as u64) << (4 * i);
    }
    Ok(board)
}

/// Unpack a board word. Exact inverse of [`encode_board`].
pub fn decode_board(board: u64) -> RankGrid {
    let mut grid = [[0u8; BOARD_SIDE]; BOARD_SIDE];
    for (i, cell) in grid.iter_mut().flatten().enumerate() {
        *cell = ((board >> (4 * i)) & 0xf) as u8;
    }
    grid
}

fn encode_deck(deck: &Deck, max_rank: u8) -> u32 {
    let [ones, twos, threes] = deck.counts();
    (ones as u32) | (twos as u32) << 8 | (threes as u32) << 16 | (max_rank as u32) << 24
}

/// Unpack a deck word into its counts and the recorded maximum rank.
pub fn decode_deck(word: u32) -> Result<(Deck, u8), EncodeError> {
    let counts = [word as u8, (word >> 8) as u8, (word >> 16) as u8];
    Ok((Deck::from_counts(counts)?, (word >> 24) as u8))
}

pub fn decode_tileset(word: u16) -> Tileset {
    Tileset::from_bits(word)
}

impl fmt::Display for EncodedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "board={:016x} deck={:08x} tileset={:04x}", self.board, self.deck, self.tileset)?;
        for row in decode_board(self.board) {
            for rank in row {
                write!(f, "{:x}", rank)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> RankGrid {
        [[0, 1, 2, 3], [4, 5, 6, 7], [8, 9, 10, 11], [12, 13, 14, 15]]
    }

    #[test]
    fn board_packs_row_major_low_nibble_first() {
        let board = encode_board(&sample_grid()).unwrap();
        assert_eq!(board, 0xfedc_ba98_7654_3210);
        assert_eq!(decode_board(board), sample_grid());
    }

    #[test]
    fn board_rejects_wide_cells() {
        let mut grid = sample_grid();
        grid[1][1] = 16;
        assert_eq!(
            encode_board(&grid),
            Err(EncodeError::range("rank", 16, 15))
        );
    }

    #[test]
    fn deck_word_carries_counts_and_max_rank() {
        let mut grid = [[0u8; 4]; 4];
        grid[2][2] = 9;
        let deck = Deck::from_counts([1, 2, 3]).unwrap();
        let state = encode(&grid, &deck, &Tileset::single(3).unwrap()).unwrap();
        assert_eq!(state.deck, 0x0903_0201);
        let (decoded, max) = decode_deck(state.deck).unwrap();
        assert_eq!(decoded, deck);
        assert_eq!(max, 9);
    }

    #[test]
    fn empty_tileset_is_rejected() {
        let grid = [[0u8; 4]; 4];
        let err = encode(&grid, &Deck::full(), &Tileset::default()).unwrap_err();
        assert!(matches!(err, EncodeError::EncodingRange { field: "tileset size", .. }));
    }

    #[test]
    fn display_shows_words_and_grid() {
        let state = EncodedState {
            board: encode_board(&sample_grid()).unwrap(),
            deck: 0x0f04_0404,
            tileset: 0x0002,
        };
        let text = state.to_string();
        assert!(text.starts_with("board=fedcba9876543210 deck=0f040404 tileset=0002"));
        assert!(text.contains("\n0123\n"));
        assert!(text.ends_with("cdef\n"));
    }
}
