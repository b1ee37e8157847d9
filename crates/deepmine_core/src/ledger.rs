//! # Serialized Ledger
//!
//! The contract engines assume a single-threaded, strictly serialized
//! ledger: every state-mutating call is atomic and totally ordered.
//! Outside such an environment the guarantee has to be made explicit:
//! [`Ledger`] wraps one contract instance behind a mutex so that
//! read-modify-write sequences (role grants, nonce increments, offset
//! updates, transfers) never interleave.
//!
//! No operation blocks indefinitely - transactions run to completion and
//! either fully succeed or fully fail; the caller decides about retries.

use parking_lot::Mutex;

use crate::error::EngineResult;

/// A contract instance behind a transaction lock.
///
/// One `Ledger` per instance preserves per-entity linearizability; two
/// independent instances (as the access-control replay tests exercise)
/// never contend with each other.
pub struct Ledger<T> {
    inner: Mutex<T>,
}

impl<T> Ledger<T> {
    /// Wraps a contract state.
    #[must_use]
    pub const fn new(state: T) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    /// Runs one atomic read-modify-write transaction.
    ///
    /// The closure observes and mutates the state under the lock; its
    /// result is the transaction's result.
    ///
    /// # Errors
    ///
    /// Propagates whatever the transaction body returns.
    pub fn transact<R>(&self, tx: impl FnOnce(&mut T) -> EngineResult<R>) -> EngineResult<R> {
        tx(&mut self.inner.lock())
    }

    /// Runs a read-only view under the lock.
    pub fn view<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.inner.lock())
    }

    /// Unwraps the inner state, consuming the ledger.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
