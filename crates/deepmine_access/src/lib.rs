//! # DEEPMINE Access Control
//!
//! Role-based access control with multisig governance. Every other engine
//! in the workspace embeds an [`AccessRegistry`] and routes its permission
//! checks through it.
//!
//! ## Model
//!
//! - The **owner** (deployer) implicitly holds every role bit
//! - **Operators** are addresses holding a non-zero role mask, granted by
//!   a role manager - and only ever a subset of what the granter holds
//! - **Features** are global on/off switches in a shared bitmask
//! - The **multisig gateway** gates role and feature updates behind
//!   nonce-bound, expiring, independently signed requests
//!
//! ## Failure Semantics
//!
//! Every permission check rejects the whole call with a typed
//! [`EngineError`](deepmine_core::EngineError) - no partial mutation ever
//! survives a failed check.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod msig;
pub mod registry;
pub mod roles;

pub use msig::{signer_address, MsigGateway, MsigSignature};
pub use registry::AccessRegistry;
pub use roles::RoleSet;
