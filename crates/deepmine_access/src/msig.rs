//! # Multisig Gateway
//!
//! Governance actions (role and feature updates) as signable requests:
//! nonce-bound, expiring, and executed exactly once.
//!
//! ## Request Lifecycle
//!
//! ```text
//! Idle -> Requested -> { Executed | Expired }
//! ```
//!
//! A request digest commits to the gateway's own address and its current
//! nonce, so a signature can never be replayed - neither on this instance
//! (the nonce moved) nor on another deployment with identical parameters
//! and signers (the address differs).
//!
//! ## Quorum
//!
//! Every signature must verify against the digest and resolve to a distinct
//! signer holding `ROLE_ACCESS_MANAGER`. The sender counts as one implicit
//! extra signer when it qualifies and did not also sign. A single-signature
//! request whose signer *is* the sender is always rejected - one key must
//! never clear a two-party gate alone.

use alloy_primitives::{keccak256, Address, B256};
use deepmine_core::{Clock, EngineError, EngineResult};
use ed25519_dalek::{Signature, VerifyingKey};

use crate::registry::AccessRegistry;
use crate::roles::RoleSet;

/// Domain tag prefixed to every request digest.
const MSIG_DOMAIN_TAG: &[u8; 16] = b"deepmine/msig/v1";

/// One signature over a request digest, with the key that produced it.
#[derive(Clone, Debug)]
pub struct MsigSignature {
    /// The signer's verifying key. The on-ledger signer address is derived
    /// from it - see [`signer_address`].
    pub key: VerifyingKey,
    /// Ed25519 signature over the request digest.
    pub signature: Signature,
}

/// Derives the on-ledger address of a verifying key: the low 20 bytes of
/// `keccak256(key_bytes)`.
#[must_use]
pub fn signer_address(key: &VerifyingKey) -> Address {
    Address::from_slice(&keccak256(key.as_bytes())[12..])
}

/// An [`AccessRegistry`] whose governance runs through signed requests.
#[derive(Debug, Clone)]
pub struct MsigGateway {
    registry: AccessRegistry,
    /// Strictly increases after each successful execution.
    nonce: u64,
    /// Distinct qualifying signers (sender included) required per request.
    required_signers: usize,
}

impl MsigGateway {
    /// Wraps a registry with the default two-signer requirement.
    #[must_use]
    pub fn new(registry: AccessRegistry) -> Self {
        Self::with_required_signers(registry, 2)
    }

    /// Wraps a registry requiring `required` distinct qualifying signers
    /// per request (minimum 2; lower values are clamped).
    #[must_use]
    pub fn with_required_signers(registry: AccessRegistry, required: usize) -> Self {
        Self {
            registry,
            nonce: 0,
            required_signers: required.max(2),
        }
    }

    /// Read access to the wrapped registry.
    #[must_use]
    pub const fn registry(&self) -> &AccessRegistry {
        &self.registry
    }

    /// Mutable access to the wrapped registry, for plain (pre-multisig)
    /// governance.
    pub fn registry_mut(&mut self) -> &mut AccessRegistry {
        &mut self.registry
    }

    /// The nonce the next request must be signed under.
    #[inline]
    #[must_use]
    pub const fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Builds the canonical signable digest for an update request.
    ///
    /// The encoding commits to the domain tag, this gateway's address, the
    /// current nonce, the target, the role mask, and the expiry.
    ///
    /// # Errors
    ///
    /// `Expired` when `expires_on` is not in the future.
    pub fn construct_update_request(
        &self,
        target: Address,
        role: RoleSet,
        expires_on: u64,
        clock: &dyn Clock,
    ) -> EngineResult<B256> {
        if expires_on <= clock.now() {
            return Err(EngineError::Expired(format!(
                "request expiry {expires_on} is not in the future"
            )));
        }
        Ok(self.request_digest(target, role, expires_on))
    }

    /// Verifies a signed request and applies it exactly once.
    ///
    /// On success the role update (or, when `target` is the gateway's own
    /// address, the feature update) is applied and the nonce increments -
    /// strictly before returning, so resubmitting the same signatures
    /// fails from then on.
    ///
    /// # Errors
    ///
    /// - `Expired`: past the request's expiry
    /// - `InvalidArgument`: no signatures supplied
    /// - `Unauthorized`: a signature fails verification, a signer repeats,
    ///   a signer lacks `ROLE_ACCESS_MANAGER`, the sole signer is the
    ///   sender, or the qualifying count is below the requirement
    pub fn update_msig(
        &mut self,
        caller: Address,
        target: Address,
        role: RoleSet,
        expires_on: u64,
        signatures: &[MsigSignature],
        clock: &dyn Clock,
    ) -> EngineResult<()> {
        if expires_on <= clock.now() {
            return Err(EngineError::Expired(format!(
                "request expired at {expires_on}"
            )));
        }
        if signatures.is_empty() {
            return Err(EngineError::InvalidArgument(
                "at least one signature is required".into(),
            ));
        }

        let digest = self.request_digest(target, role, expires_on);
        let mut signers: Vec<Address> = Vec::with_capacity(signatures.len());
        for entry in signatures {
            entry
                .key
                .verify_strict(digest.as_slice(), &entry.signature)
                .map_err(|_| {
                    EngineError::Unauthorized("signature does not verify against the request".into())
                })?;
            let signer = signer_address(&entry.key);
            if signers.contains(&signer) {
                return Err(EngineError::Unauthorized(format!(
                    "duplicate signer {signer}"
                )));
            }
            if !self.registry.has_role(signer, RoleSet::ROLE_ACCESS_MANAGER) {
                return Err(EngineError::Unauthorized(format!(
                    "signer {signer} lacks the access manager role"
                )));
            }
            signers.push(signer);
        }

        // One key plus its own transaction never clears a two-party gate.
        if signers.len() == 1 && signers[0] == caller {
            return Err(EngineError::Unauthorized(
                "self-signed single-signature request".into(),
            ));
        }

        let sender_qualifies = self.registry.has_role(caller, RoleSet::ROLE_ACCESS_MANAGER)
            && !signers.contains(&caller);
        let qualifying = signers.len() + usize::from(sender_qualifies);
        if qualifying < self.required_signers {
            return Err(EngineError::Unauthorized(format!(
                "{qualifying} qualifying signers, {} required",
                self.required_signers
            )));
        }

        if target == self.registry.address() {
            self.registry.set_features(role);
        } else {
            self.registry.set_roles(target, role);
        }
        self.nonce += 1;
        tracing::info!(
            "msig request executed: target {target}, nonce now {}",
            self.nonce
        );
        Ok(())
    }

    fn request_digest(&self, target: Address, role: RoleSet, expires_on: u64) -> B256 {
        let mut message = Vec::with_capacity(16 + 20 + 8 + 20 + 32 + 8);
        message.extend_from_slice(MSIG_DOMAIN_TAG);
        message.extend_from_slice(self.registry.address().as_slice());
        message.extend_from_slice(&self.nonce.to_be_bytes());
        message.extend_from_slice(target.as_slice());
        message.extend_from_slice(&role.raw().to_be_bytes::<32>());
        message.extend_from_slice(&expires_on.to_be_bytes());
        keccak256(&message)
    }
}
