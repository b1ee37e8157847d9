//! # Packed Attribute Layouts
//!
//! Bit-window tables for the token properties words. These layouts are the
//! wire format shared with every existing packed word on the ledger -
//! changing an offset or width here corrupts all stored state.

/// Gem properties word layout.
///
/// ```text
/// bits [  0,  32)  grade   (value [0,24), type [24,32))
/// bits [ 32,  40)  level   (1-5)
/// bits [ 40,  48)  color   (1-12, calendar months)
/// bits [ 48,  80)  energetic age at the anchor, seconds
/// bits [ 80, 112)  last mining rate, micro-units
/// bits [112, 144)  age anchor, unix seconds of the last age write
/// ```
///
/// A resting gem's effective age is the stored age plus the seconds
/// elapsed since the anchor; accrual pauses while the gem is locked into
/// mining.
pub mod gem {
    /// Grade window offset (type and value combined).
    pub const GRADE_OFFSET: u32 = 0;
    /// Grade window width.
    pub const GRADE_BITS: u32 = 32;
    /// Grade value offset (within the word).
    pub const GRADE_VALUE_OFFSET: u32 = 0;
    /// Grade value width.
    pub const GRADE_VALUE_BITS: u32 = 24;
    /// Grade type offset.
    pub const GRADE_TYPE_OFFSET: u32 = 24;
    /// Grade type width.
    pub const GRADE_TYPE_BITS: u32 = 8;
    /// Level offset.
    pub const LEVEL_OFFSET: u32 = 32;
    /// Level width.
    pub const LEVEL_BITS: u32 = 8;
    /// Color offset.
    pub const COLOR_OFFSET: u32 = 40;
    /// Color width.
    pub const COLOR_BITS: u32 = 8;
    /// Width of the externally visible `color:level:grade` concatenation.
    pub const PROPERTIES_BITS: u32 = 48;
    /// Energetic age offset.
    pub const AGE_OFFSET: u32 = 48;
    /// Energetic age width.
    pub const AGE_BITS: u32 = 32;
    /// Last mining rate offset.
    pub const RATE_OFFSET: u32 = 80;
    /// Last mining rate width.
    pub const RATE_BITS: u32 = 32;
    /// Age anchor offset.
    pub const AGE_ANCHOR_OFFSET: u32 = 112;
    /// Age anchor width.
    pub const AGE_ANCHOR_BITS: u32 = 32;

    /// Highest gem level.
    pub const MAX_LEVEL: u8 = 5;
    /// Number of grade types (1-6).
    pub const GRADE_TYPES: u8 = 6;
    /// Exclusive upper bound on grade values.
    pub const GRADE_VALUES: u32 = 1_000_000;
    /// Number of colors (1-12, matching calendar months).
    pub const COLORS: u8 = 12;
}

/// Plot properties word layout.
///
/// ```text
/// bits [ 0,  8)  tier count (1-5)
/// bits [ 8, 48)  five 8-bit cumulative depth boundaries
/// bits [48, 56)  current offset (0..=total depth)
/// ```
pub mod plot {
    /// Tier count offset.
    pub const TIER_COUNT_OFFSET: u32 = 0;
    /// Tier count width.
    pub const TIER_COUNT_BITS: u32 = 8;
    /// Offset of the first tier boundary.
    pub const BOUNDARIES_OFFSET: u32 = 8;
    /// Width of each tier boundary.
    pub const BOUNDARY_BITS: u32 = 8;
    /// Maximum number of tiers.
    pub const MAX_TIERS: u8 = 5;
    /// Current-offset window offset.
    pub const OFFSET_OFFSET: u32 = 48;
    /// Current-offset window width.
    pub const OFFSET_BITS: u32 = 8;
    /// Deepest depth a plot can reach.
    pub const MAX_DEPTH: u8 = 100;
}

/// State bit set while a token is bound to an active mining operation.
pub const STATE_MINING: u32 = 1 << 0;

/// Transfer lock shipped with every new engine instance: mining tokens
/// stay put.
pub const DEFAULT_TRANSFER_LOCK: u32 = STATE_MINING;
