//! # Clock Seam
//!
//! The engines never read wall-clock time directly. Every component takes
//! a [`Clock`] at construction; production wires in [`SystemClock`], tests
//! wire in [`ManualClock`] and fast-forward or rewind it at will. Expiry
//! checks (multisig requests, mining progress) are all relative to this
//! seam, which is what keeps them reproducible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time, in unix seconds.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp in seconds since the unix epoch.
    fn now(&self) -> u64;
}

/// Wall-clock time. Production only.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}

/// A hand-cranked clock for tests and simulations.
///
/// Time only moves when the test says so.
#[derive(Debug)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    /// Creates a clock frozen at `start` seconds.
    #[must_use]
    pub const fn new(start: u64) -> Self {
        Self(AtomicU64::new(start))
    }

    /// Jumps to an absolute timestamp.
    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    /// Moves forward by `seconds`.
    pub fn advance(&self, seconds: u64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Moves backward by `seconds`, saturating at zero.
    pub fn rewind(&self, seconds: u64) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_sub(seconds))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_moves_only_on_demand() {
        let clock = ManualClock::new(1_500_000_000);
        assert_eq!(clock.now(), 1_500_000_000);
        clock.advance(120);
        assert_eq!(clock.now(), 1_500_000_120);
        clock.rewind(20);
        assert_eq!(clock.now(), 1_500_000_100);
        clock.set(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn test_rewind_saturates_at_zero() {
        let clock = ManualClock::new(10);
        clock.rewind(100);
        assert_eq!(clock.now(), 0);
    }
}
