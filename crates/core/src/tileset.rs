//! Tileset module - which tile can appear next
//!
//! The live game shows an "upcoming tile" indicator. A value of 1, 2 or 3 is
//! the exact next tile. Anything larger announces a bonus tile whose value
//! is drawn from a range derived from the board maximum, so the tileset
//! holds every candidate.

use arrayvec::ArrayVec;

use crate::error::EncodeError;
use crate::rank::normalize;
use crate::types::{BONUS_DIVISOR, DECK_MAX_RANK, MAX_RANK};

/// Set of rank indices, one bit per rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tileset {
    bits: u16,
}

impl Tileset {
    /// Tileset containing exactly one rank.
    pub fn single(rank: u8) -> Result<Self, EncodeError> {
        Self::from_ranks(&[rank])
    }

    /// Tileset from a list of ranks.
    pub fn from_ranks(ranks: &[u8]) -> Result<Self, EncodeError> {
        let mut bits = 0u16;
        for &rank in ranks {
            if rank > MAX_RANK {
                return Err(EncodeError::range("tileset rank", rank as u32, MAX_RANK as u32));
            }
            bits |= 1 << rank;
        }
        Ok(Self { bits })
    }

    /// Tileset from its packed word.
    pub const fn from_bits(bits: u16) -> Self {
        Self { bits }
    }

    /// Tileset of bonus candidates for a board whose maximum face value is
    /// `max_value`.
    pub fn bonus(max_value: u32) -> Result<Self, EncodeError> {
        let mut bits = 0u16;
        for value in bonus_candidates(max_value)? {
            bits |= 1 << normalize(value)?;
        }
        Ok(Self { bits })
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    pub fn contains(&self, rank: u8) -> bool {
        rank <= MAX_RANK && self.bits & (1 << rank) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Ranks in ascending order.
    pub fn ranks(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=MAX_RANK).filter(move |&r| self.contains(r))
    }
}

/// Derive bonus tile face values from the board maximum.
///
/// Starts at `max_value / 8` and keeps halving while the value is above 3,
/// collecting each step. Board values above 3 are always `3 * 2^k`; this is
/// checked rather than assumed, so a maximum that does not divide evenly or a
/// step that is not a tile value is an error, as is an empty result.
///
/// # Examples
///
/// ```
/// use threes_bridge_core::tileset::bonus_candidates;
///
/// assert_eq!(bonus_candidates(96).unwrap().as_slice(), &[12, 6]);
/// assert_eq!(bonus_candidates(48).unwrap().as_slice(), &[6]);
/// assert!(bonus_candidates(24).is_err());
/// ```
pub fn bonus_candidates(max_value: u32) -> Result<ArrayVec<u32, 16>, EncodeError> {
    if max_value % BONUS_DIVISOR != 0 {
        return Err(EncodeError::BonusInvariant {
            max_value,
            reason: "maximum is not a multiple of 8",
        });
    }

    let mut out = ArrayVec::new();
    let mut value = max_value / BONUS_DIVISOR;
    while value > DECK_MAX_RANK as u32 {
        if normalize(value).is_err() {
            return Err(EncodeError::BonusInvariant {
                max_value,
                reason: "candidate is not a tile value",
            });
        }
        // At most 12 candidates fit below 12288 / 8.
        out.push(value);
        if value % 2 != 0 {
            break;
        }
        value /= 2;
    }

    if out.is_empty() {
        return Err(EncodeError::BonusInvariant {
            max_value,
            reason: "no candidate above 3",
        });
    }
    Ok(out)
}

/// Interpretation of the live game's upcoming-tile indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpcomingTile {
    /// A concrete 1, 2 or 3 drawn from the deck.
    Normal(u8),
    /// A bonus tile; candidates depend on the board maximum.
    Bonus,
}

impl UpcomingTile {
    /// Classify a raw indicator value.
    ///
    /// 1-3 are normal draws and anything above 3 announces a bonus. The
    /// indicator's own value carries no information for a bonus draw, so
    /// sentinels such as 4 are accepted. 0 is rejected.
    pub fn from_indicator(value: u32) -> Result<Self, EncodeError> {
        match value {
            0 => Err(EncodeError::UnknownTileValue(value)),
            1..=3 => Ok(UpcomingTile::Normal(value as u8)),
            _ => Ok(UpcomingTile::Bonus),
        }
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self, UpcomingTile::Bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonus_from_96_is_12_and_6() {
        let values = bonus_candidates(96).unwrap();
        assert_eq!(values.as_slice(), &[12, 6]);
        let tileset = Tileset::bonus(96).unwrap();
        assert_eq!(tileset.ranks().collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn bonus_from_largest_tile() {
        let values = bonus_candidates(12288).unwrap();
        assert_eq!(values.first(), Some(&1536));
        assert_eq!(values.last(), Some(&6));
        assert_eq!(values.len(), 9);
    }

    #[test]
    fn bonus_rejects_values_outside_invariant() {
        assert!(matches!(
            bonus_candidates(100),
            Err(EncodeError::BonusInvariant { max_value: 100, .. })
        ));
        assert!(matches!(
            bonus_candidates(24),
            Err(EncodeError::BonusInvariant { reason: "no candidate above 3", .. })
        ));
        assert!(bonus_candidates(0).is_err());
    }

    #[test]
    fn single_tileset_bits() {
        let t = Tileset::single(2).unwrap();
        assert_eq!(t.bits(), 0b100);
        assert!(t.contains(2));
        assert_eq!(t.len(), 1);
        assert!(Tileset::single(16).is_err());
    }

    #[test]
    fn indicator_classification() {
        assert_eq!(UpcomingTile::from_indicator(1), Ok(UpcomingTile::Normal(1)));
        assert_eq!(UpcomingTile::from_indicator(3), Ok(UpcomingTile::Normal(3)));
        assert_eq!(UpcomingTile::from_indicator(6), Ok(UpcomingTile::Bonus));
        assert_eq!(
            UpcomingTile::from_indicator(0),
            Err(EncodeError::UnknownTileValue(0))
        );
    }

    #[test]
    fn any_indicator_above_three_is_bonus() {
        for value in [4, 5, 7, 100] {
            assert_eq!(UpcomingTile::from_indicator(value), Ok(UpcomingTile::Bonus));
        }
    }
}
