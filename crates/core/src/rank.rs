//! Rank module - face value <-> rank index normalization
//!
//! Face values form a fixed, strictly increasing table, so normalization is
//! the unique order-preserving bijection onto 0..=15. Unknown values are
//! rejected, never rounded.

use crate::error::EncodeError;
use crate::types::{FaceGrid, RankGrid, BOARD_SIDE, FACE_VALUES, MAX_RANK};

/// Map a raw tile face value to its rank index.
///
/// # Examples
///
/// ```
/// use threes_bridge_core::rank::normalize;
///
/// assert_eq!(normalize(0), Ok(0));
/// assert_eq!(normalize(3), Ok(3));
/// assert_eq!(normalize(96), Ok(8));
/// assert!(normalize(4).is_err());
/// ```
pub fn normalize(face: u32) -> Result<u8, EncodeError> {
    FACE_VALUES
        .binary_search(&face)
        .map(|rank| rank as u8)
        .map_err(|_| EncodeError::UnknownTileValue(face))
}

/// Map a rank index back to its face value.
pub fn denormalize(rank: u8) -> Result<u32, EncodeError> {
    FACE_VALUES
        .get(rank as usize)
        .copied()
        .ok_or_else(|| EncodeError::range("rank", rank as u32, MAX_RANK as u32))
}

/// Normalize every cell of a face-value grid.
pub fn normalize_grid(faces: &FaceGrid) -> Result<RankGrid, EncodeError> {
    let mut grid = [[0u8; BOARD_SIDE]; BOARD_SIDE];
    for (row, face_row) in grid.iter_mut().zip(faces.iter()) {
        for (cell, &face) in row.iter_mut().zip(face_row.iter()) {
            *cell = normalize(face)?;
        }
    }
    Ok(grid)
}

/// Highest rank on the board (0 for an empty board).
pub fn max_rank(grid: &RankGrid) -> u8 {
    grid.iter().flatten().copied().max().unwrap_or(0)
}

/// Board score under the game's rules.
///
/// Tiles of rank 3 and above score `3^(rank - 2)`; 1s, 2s and empty cells
/// score nothing.
pub fn board_score(grid: &RankGrid) -> u64 {
    grid.iter()
        .flatten()
        .filter(|&&rank| rank >= 3)
        .map(|&rank| 3u64.pow(rank as u32 - 2))
        .sum()
}
