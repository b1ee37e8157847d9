//! # Plot Tier Structures
//!
//! A plot is a column of up to 100 blocks divided into 1 to 5 tiers.
//! The packed properties word stores the tier count, five cumulative
//! depth boundaries, and the current mining offset; this module is the
//! typed pack/unpack layer over that layout.

use alloy_primitives::U256;
use deepmine_core::{EngineError, EngineResult, PackedWord};
use deepmine_token::layout::plot;

/// Validated tier layout of a plot: cumulative depth boundaries, the last
/// of which is the plot's total depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierStructure {
    count: u8,
    boundaries: [u8; plot::MAX_TIERS as usize],
}

impl TierStructure {
    /// Builds a structure from cumulative boundaries.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for zero or more than five tiers, non-increasing
    /// boundaries, or a total depth past 100.
    pub fn new(boundaries: &[u8]) -> EngineResult<Self> {
        if boundaries.is_empty() || boundaries.len() > usize::from(plot::MAX_TIERS) {
            return Err(EngineError::InvalidArgument(format!(
                "plot needs 1..={} tiers, got {}",
                plot::MAX_TIERS,
                boundaries.len()
            )));
        }
        let mut previous = 0u8;
        for &boundary in boundaries {
            if boundary <= previous {
                return Err(EngineError::InvalidArgument(format!(
                    "tier boundary {boundary} does not increase past {previous}"
                )));
            }
            previous = boundary;
        }
        if previous > plot::MAX_DEPTH {
            return Err(EngineError::InvalidArgument(format!(
                "total depth {previous} exceeds {}",
                plot::MAX_DEPTH
            )));
        }
        let mut padded = [0u8; plot::MAX_TIERS as usize];
        padded[..boundaries.len()].copy_from_slice(boundaries);
        Ok(Self {
            count: boundaries.len() as u8,
            boundaries: padded,
        })
    }

    /// Decodes and validates a structure from a plot properties word.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the packed fields do not form a valid
    /// structure.
    pub fn from_word(word: PackedWord) -> EngineResult<Self> {
        let count = word.read_u64(plot::TIER_COUNT_OFFSET, plot::TIER_COUNT_BITS)? as usize;
        if count == 0 || count > usize::from(plot::MAX_TIERS) {
            return Err(EngineError::InvalidArgument(format!(
                "packed tier count {count} out of range"
            )));
        }
        let mut boundaries = [0u8; plot::MAX_TIERS as usize];
        for (index, slot) in boundaries.iter_mut().enumerate().take(count) {
            let offset = plot::BOUNDARIES_OFFSET + index as u32 * plot::BOUNDARY_BITS;
            *slot = word.read_u64(offset, plot::BOUNDARY_BITS)? as u8;
        }
        Self::new(&boundaries[..count])
    }

    /// Encodes the structure into a fresh properties word with a zero
    /// offset.
    ///
    /// # Errors
    ///
    /// Never fails for a validated structure; the window writes are
    /// statically in range.
    pub fn to_word(&self) -> EngineResult<PackedWord> {
        let mut word = PackedWord::ZERO.write_u64(
            u64::from(self.count),
            plot::TIER_COUNT_OFFSET,
            plot::TIER_COUNT_BITS,
        )?;
        for index in 0..usize::from(self.count) {
            let offset = plot::BOUNDARIES_OFFSET + index as u32 * plot::BOUNDARY_BITS;
            word = word.write_u64(
                u64::from(self.boundaries[index]),
                offset,
                plot::BOUNDARY_BITS,
            )?;
        }
        Ok(word)
    }

    /// Number of tiers.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.count
    }

    /// Cumulative end boundary of a zero-based tier index.
    #[must_use]
    pub fn boundary(&self, tier: usize) -> u8 {
        self.boundaries[tier.min(usize::from(self.count) - 1)]
    }

    /// Cumulative start boundary of a zero-based tier index.
    #[must_use]
    pub fn tier_start(&self, tier: usize) -> u8 {
        if tier == 0 {
            0
        } else {
            self.boundary(tier - 1)
        }
    }

    /// Total depth of the plot.
    #[must_use]
    pub fn total_depth(&self) -> u8 {
        self.boundaries[usize::from(self.count) - 1]
    }

    /// Deepest block a gem of `level` can mine to. Levels 1..=5 unlock one
    /// tier each; a level at or past the tier count reaches full depth.
    #[must_use]
    pub fn mines_to(&self, level: u8) -> u8 {
        if level == 0 {
            return 0;
        }
        if level >= self.count {
            self.total_depth()
        } else {
            self.boundaries[usize::from(level) - 1]
        }
    }

    /// Zero-based tier index containing block `offset`.
    #[must_use]
    pub fn tier_of(&self, offset: u8) -> usize {
        for tier in 0..usize::from(self.count) {
            if offset < self.boundaries[tier] {
                return tier;
            }
        }
        usize::from(self.count) - 1
    }
}

/// Reads the current mining offset out of a plot properties word.
///
/// # Errors
///
/// `InvalidArgument` is unreachable for the fixed window; propagated for
/// uniformity.
pub fn read_offset(word: PackedWord) -> EngineResult<u8> {
    Ok(word.read_u64(plot::OFFSET_OFFSET, plot::OFFSET_BITS)? as u8)
}

/// The offset window as a `(value, offset, bits)` write, for the token
/// engine's role-gated property writes.
#[must_use]
pub fn offset_window(new_offset: u8) -> (U256, u32, u32) {
    (
        U256::from(new_offset),
        plot::OFFSET_OFFSET,
        plot::OFFSET_BITS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_validation() {
        assert!(TierStructure::new(&[]).is_err());
        assert!(TierStructure::new(&[10, 10]).is_err());
        assert!(TierStructure::new(&[30, 20]).is_err());
        assert!(TierStructure::new(&[101]).is_err());
        assert!(TierStructure::new(&[10, 20, 30, 40, 50, 60]).is_err());
        assert!(TierStructure::new(&[35, 65, 85, 95, 100]).is_ok());
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let tiers = TierStructure::new(&[35, 65, 85, 95, 100]).unwrap();
        let word = tiers.to_word().unwrap();
        assert_eq!(TierStructure::from_word(word).unwrap(), tiers);
        assert_eq!(read_offset(word).unwrap(), 0);
    }

    #[test]
    fn test_mines_to_by_level() {
        let tiers = TierStructure::new(&[35, 65, 85, 95, 100]).unwrap();
        assert_eq!(tiers.mines_to(1), 35);
        assert_eq!(tiers.mines_to(3), 85);
        assert_eq!(tiers.mines_to(5), 100);
        // A single-tier plot is fully reachable at level 1.
        let single = TierStructure::new(&[100]).unwrap();
        assert_eq!(single.mines_to(1), 100);
        assert_eq!(single.mines_to(5), 100);
    }

    #[test]
    fn test_tier_of_offset() {
        let tiers = TierStructure::new(&[35, 65, 100]).unwrap();
        assert_eq!(tiers.tier_of(0), 0);
        assert_eq!(tiers.tier_of(34), 0);
        assert_eq!(tiers.tier_of(35), 1);
        assert_eq!(tiers.tier_of(99), 2);
        assert_eq!(tiers.tier_start(0), 0);
        assert_eq!(tiers.tier_start(2), 65);
    }

    #[test]
    fn test_corrupt_word_rejected() {
        let word = PackedWord::ZERO;
        assert!(TierStructure::from_word(word).is_err());
    }
}
