//! # DEEPMINE Core
//!
//! Shared foundation for the DEEPMINE on-ledger engines.
//!
//! ## What Lives Here
//!
//! - [`PackedWord`]: the 256-bit bit-packed attribute store that every
//!   token type persists its state in
//! - [`Clock`]: the injectable time seam (tests rewind and fast-forward it)
//! - [`EntropySource`]: the injectable randomness seam (seeded, never
//!   wall-clock based)
//! - [`EngineError`]: the error taxonomy shared by every engine
//! - [`Ledger`]: the per-instance transaction serializer
//!
//! ## Determinism
//!
//! Everything in this crate is bit-for-bit reproducible: identical inputs
//! produce identical outputs on all hardware. That property is what lets
//! the engines run inside a strictly serialized ledger.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bitfield;
pub mod clock;
pub mod entropy;
pub mod error;
pub mod ledger;

pub use bitfield::{PackedWord, WORD_BITS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entropy::{EntropySource, SeededEntropy};
pub use error::{EngineError, EngineResult};
pub use ledger::Ledger;
