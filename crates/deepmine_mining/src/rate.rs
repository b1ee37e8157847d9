//! # Mining Rate
//!
//! A gem's mining rate is the product of its level multiplier, its grade
//! component, a color-of-the-month bonus, and an optional special-gem
//! override, all in micro-units. The grade component interpolates linearly
//! between the current grade type's multiplier and the next type's,
//! weighted by the grade value, so every grade-value point buys a sliver
//! of rate.
//!
//! One block of a plot costs [`BLOCK_MINING_TIME`] effective seconds,
//! where one effective second is one real second scaled by the rate.

use crate::energy::MICRO;

/// Effective seconds needed to mine one plot block.
pub const BLOCK_MINING_TIME: u64 = 100;

/// Per-level rate multipliers, micro-units, levels 1..=5.
pub const LEVEL_MULTIPLIERS: [u64; 5] = [1_000_000, 1_050_000, 1_100_000, 1_150_000, 1_200_000];

/// Per-grade-type base multipliers, micro-units, types 1..=6.
pub const GRADE_TYPE_MULTIPLIERS: [u64; 6] =
    [1_000_000, 1_100_000, 1_250_000, 1_450_000, 1_700_000, 2_000_000];

/// Interpolation ceiling above the highest grade type.
pub const GRADE_CEILING: u64 = 2_500_000;

/// Bonus applied when the gem's color matches the calendar month.
pub const COLOR_MATCH_MULTIPLIER: u64 = 1_050_000;

/// Upper bound on special-gem override multipliers, micro-units (100x).
/// With the level, grade, and color factors maxed out, a rate built under
/// this bound stays below `u32::MAX` and its intermediate product below
/// `u64::MAX`.
pub const MAX_SPECIAL_MULTIPLIER: u64 = 100_000_000;

/// Calendar month (1..=12) of a unix timestamp, civil calendar, integer
/// arithmetic only.
#[must_use]
pub fn month_of(unix_secs: u64) -> u8 {
    let z = (unix_secs / 86_400) as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    month as u8
}

/// Grade component of the rate: the type's base multiplier plus the
/// grade-value fraction of the distance to the next type.
#[must_use]
pub fn grade_multiplier(grade_type: u8, grade_value: u32) -> u64 {
    let index = usize::from(grade_type.clamp(1, 6)) - 1;
    let base = GRADE_TYPE_MULTIPLIERS[index];
    let next = GRADE_TYPE_MULTIPLIERS
        .get(index + 1)
        .copied()
        .unwrap_or(GRADE_CEILING);
    base + (next - base) * u64::from(grade_value) / MICRO
}

/// The micro-unit mining rate of a gem.
///
/// `special` replaces nothing; it is one more multiplicative factor,
/// micro-scaled, for gems carrying an override. Overrides past
/// [`MAX_SPECIAL_MULTIPLIER`] clamp to it.
#[must_use]
pub fn mining_rate(
    level: u8,
    grade_type: u8,
    grade_value: u32,
    color: u8,
    now: u64,
    special: Option<u64>,
) -> u64 {
    let level_index = usize::from(level.clamp(1, 5)) - 1;
    let mut rate = LEVEL_MULTIPLIERS[level_index];
    rate = rate * grade_multiplier(grade_type, grade_value) / MICRO;
    if color == month_of(now) {
        rate = rate * COLOR_MATCH_MULTIPLIER / MICRO;
    }
    if let Some(special) = special {
        rate = rate * special.min(MAX_SPECIAL_MULTIPLIER) / MICRO;
    }
    rate
}

/// Whole blocks minable from `effective_seconds` of credit at `rate`.
#[must_use]
pub fn blocks_minable(effective_seconds: u64, rate: u64) -> u64 {
    let micro_seconds = u128::from(effective_seconds) * u128::from(rate);
    (micro_seconds / (u128::from(MICRO) * u128::from(BLOCK_MINING_TIME))) as u64
}

/// Effective seconds consumed by mining `blocks` whole blocks at `rate`.
/// Floor division, so the caller keeps any fractional remainder as credit.
#[must_use]
pub fn seconds_for_blocks(blocks: u64, rate: u64) -> u64 {
    if rate == 0 {
        return 0;
    }
    let micro = u128::from(blocks) * u128::from(BLOCK_MINING_TIME) * u128::from(MICRO);
    (micro / u128::from(rate)) as u64
}
