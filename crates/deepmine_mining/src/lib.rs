//! # DEEPMINE Mining Engine
//!
//! Gems mine plots. A resting gem accrues energy along a saturating
//! closed-form curve; binding it to a plot spends that energy on blocks
//! and, when the energy falls short, locks both tokens and lets elapsed
//! time finish the job. Every mined block rolls against a tier's drop
//! table for loot.
//!
//! The whole subsystem runs on fixed-point micro-unit integers and a
//! seeded entropy stream, so identical inputs reproduce identical state
//! on every platform.
//!
//! ## Modules
//!
//! - [`energy`]: the resting-energy curve and its Newton's-method inverse
//! - [`rate`]: the level/grade/color/special rate product
//! - [`plot`]: packed tier structures and offset windows
//! - [`loot`]: cumulative drop tables, TOML-overridable
//! - [`engine`]: the bind/evaluate/update/release state machine

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod energy;
pub mod engine;
pub mod loot;
pub mod plot;
pub mod rate;

pub use engine::{Binding, FungibleMinter, LootMinters, MiningEngine, TallyMinter};
pub use loot::{LootConfig, LOOT_BUCKETS};
pub use plot::TierStructure;
