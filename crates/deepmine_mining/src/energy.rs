//! # Resting Energy Curve
//!
//! A resting gem accrues mining potential as a function of its energetic
//! age. The curve is quadratic up to a breakpoint, linear after it, and
//! saturates at [`ENERGY_CAP`]:
//!
//! ```text
//! R(a) = min(floor(-7e-6 * min(a,h)^2 + 0.5406 * min(a,h)
//!                  + 0.0199 * max(a-h, 0)), 65535)
//! ```
//!
//! Everything is evaluated in micro-units (x1,000,000) with integer
//! arithmetic, so the result is bit-exact across platforms. The inverse
//! runs Newton's method for a fixed iteration count, which keeps the gas
//! cost of the on-ledger form constant and makes the result deterministic.

/// Saturation ceiling of the resting-energy curve.
pub const ENERGY_CAP: u32 = 65_535;

/// Age at which the curve switches from quadratic to linear, in seconds.
pub const CURVE_BREAKPOINT: u64 = 37_193;

/// Newton iterations for the quadratic-segment inverse. Six is enough for
/// the root to land within one unit of integer rounding over the whole
/// domain.
pub const NEWTON_ITERATIONS: u32 = 6;

/// Micro-unit scale shared by the whole mining subsystem.
pub const MICRO: u64 = 1_000_000;

// Curve coefficients, pre-scaled by MICRO. The quadratic segment is
// 540_600*a - 7*a^2 micro-units; the tail adds 19_900 per second.
const QUAD_LINEAR: i128 = 540_600;
const QUAD_SQUARE: i128 = 7;
const TAIL_SLOPE: i128 = 19_900;
const MICRO_I: i128 = MICRO as i128;

/// Micro-unit energy of the quadratic segment at age `a <= h`.
#[inline]
fn quad_micro(a: i128) -> i128 {
    QUAD_LINEAR * a - QUAD_SQUARE * a * a
}

/// Resting energy accrued after `age` seconds of rest.
#[must_use]
pub fn resting_energy(age: u64) -> u32 {
    let capped = i128::from(age.min(CURVE_BREAKPOINT));
    let tail = i128::from(age.saturating_sub(CURVE_BREAKPOINT));
    let micro = quad_micro(capped) + TAIL_SLOPE * tail;
    let energy = micro / MICRO_I;
    if energy >= i128::from(ENERGY_CAP) {
        ENERGY_CAP
    } else {
        energy as u32
    }
}

/// Numeric inverse of [`resting_energy`]: the age that yields `energy`.
///
/// The linear tail inverts directly. The quadratic segment solves
/// `7a^2 - 540_600a + energy*1e6 = 0` for the lower root with Newton's
/// method from the underestimate `energy*1e6 / 540_600`; the iterate
/// increases monotonically toward the root, so a fixed iteration count
/// can never overshoot the true age by more than a rounding unit.
///
/// The forward curve floors to whole energy units, so the round trip
/// `age -> energy -> age` is close but not exact.
#[must_use]
pub fn unused_energetic_age(energy: u32) -> u64 {
    let energy = energy.min(ENERGY_CAP);
    if energy == 0 {
        return 0;
    }
    let target = i128::from(energy) * MICRO_I;
    let knee = quad_micro(i128::from(CURVE_BREAKPOINT));
    if target > knee {
        return CURVE_BREAKPOINT + ((target - knee) / TAIL_SLOPE) as u64;
    }
    let mut a = target / QUAD_LINEAR;
    for _ in 0..NEWTON_ITERATIONS {
        let f = QUAD_SQUARE * a * a - QUAD_LINEAR * a + target;
        let fp = 2 * QUAD_SQUARE * a - QUAD_LINEAR;
        if fp == 0 {
            break;
        }
        a -= f / fp;
    }
    a as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_shape() {
        assert_eq!(resting_energy(0), 0);
        // Quadratic segment: 540_600 - 7 micro-units at one second.
        assert_eq!(resting_energy(1), 0);
        assert_eq!(resting_energy(2), 1);
        // The curve is monotonically non-decreasing.
        let mut previous = 0;
        for age in (0..4_000_000).step_by(9_973) {
            let energy = resting_energy(age);
            assert!(energy >= previous, "curve dipped at age {age}");
            previous = energy;
        }
        // And saturates.
        assert_eq!(resting_energy(u64::MAX), ENERGY_CAP);
        assert_eq!(previous, ENERGY_CAP);
    }

    #[test]
    fn test_breakpoint_energy() {
        // 540_600*h - 7*h^2 at h = 37_193 is 10_423_301_057 micro-units.
        assert_eq!(resting_energy(CURVE_BREAKPOINT), 10_423);
        // One second into the tail adds 19_900 micro-units, not a full unit.
        assert_eq!(resting_energy(CURVE_BREAKPOINT + 1), 10_423);
        assert_eq!(resting_energy(CURVE_BREAKPOINT + 100), 10_425);
    }

    #[test]
    fn test_round_trip_bound() {
        // |inverse(curve(age)) - age| / (age + 239) < 0.01 over sampled ages,
        // both segments included.
        for age in (0..2_500_000u64).step_by(1_237) {
            let energy = resting_energy(age);
            if energy >= ENERGY_CAP {
                break;
            }
            let back = unused_energetic_age(energy);
            let deviation = back.abs_diff(age);
            assert!(
                deviation * 100 < age + 239,
                "age {age} -> energy {energy} -> {back}, deviation {deviation}"
            );
        }
    }

    #[test]
    fn test_inverse_never_overshoots() {
        // The Newton iterate approaches from below: the returned age never
        // produces more energy than was asked for.
        for energy in (1..ENERGY_CAP).step_by(997) {
            let age = unused_energetic_age(energy);
            assert!(resting_energy(age) <= energy, "overshoot at {energy}");
        }
    }

    #[test]
    fn test_inverse_edges() {
        assert_eq!(unused_energetic_age(0), 0);
        // Values past the cap clamp to the cap's age.
        assert_eq!(
            unused_energetic_age(u32::MAX),
            unused_energetic_age(ENERGY_CAP)
        );
        assert!(unused_energetic_age(ENERGY_CAP) > CURVE_BREAKPOINT);
    }
}
