//! # DEEPMINE Token Engine
//!
//! ERC721-style ownership with per-token attributes packed into single
//! 256-bit words. One [`TokenEngine`] instance per token class (gems,
//! plots); the gem attribute layer adds typed accessors over the gem
//! packing layout.
//!
//! ## Storage Model
//!
//! Each token is one [`TokenRecord`]: an owner, a state bitmask, four
//! modification timestamps, and one packed properties word. All attribute
//! reads and writes go through the
//! [`PackedWord`](deepmine_core::PackedWord) bit-window contract, so the
//! on-ledger layouts in [`layout`] are preserved exactly.
//!
//! ## Gating
//!
//! Transfers are feature-gated, attribute writes are role-gated, and a
//! token whose state intersects the contract-wide transfer lock cannot be
//! moved by anyone until the intersecting bits clear.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod engine;
pub mod gem;
pub mod layout;

pub use engine::{Erc721Receiver, TokenEngine, TokenRecord};
