//! # Token Engine
//!
//! Ownership table, enumeration indices, and the transfer/approval state
//! machine. One instance per token class; every mutation takes an explicit
//! caller and is gated through the embedded access registry.
//!
//! ## Transferability Lock
//!
//! A token whose `state` intersects the engine's `transfer_lock` mask is
//! frozen for everyone, its owner included. The mining engine locks bound
//! gems and plots exactly this way.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use deepmine_access::{AccessRegistry, RoleSet};
use deepmine_core::{Clock, EngineError, EngineResult, PackedWord};

use crate::layout::DEFAULT_TRANSFER_LOCK;

/// Receipt acknowledgment for safe transfers into contract accounts.
///
/// A destination that is a contract must accept the token; rejecting (or
/// failing to acknowledge) aborts the transfer with no state change.
pub trait Erc721Receiver {
    /// Called before the transfer commits. Return `true` to accept.
    fn on_erc721_received(
        &self,
        operator: Address,
        from: Address,
        token_id: U256,
        data: &[u8],
    ) -> bool;
}

/// One token's on-ledger record.
#[derive(Clone, Debug)]
pub struct TokenRecord {
    /// Packed attributes word.
    pub properties: PackedWord,
    /// Current owner. Non-zero for as long as the token exists.
    pub owner: Address,
    /// State bitmask, checked against the engine's transfer lock.
    pub state: u32,
    /// Timestamp the token was minted at.
    pub creation_time: u64,
    /// Timestamp of the last ownership change.
    pub ownership_modified: u64,
    /// Timestamp of the last properties write.
    pub properties_modified: u64,
    /// Timestamp of the last state write.
    pub state_modified: u64,
}

/// ERC721-style token engine with packed per-token attributes.
pub struct TokenEngine {
    access: AccessRegistry,
    clock: Arc<dyn Clock>,
    tokens: HashMap<U256, TokenRecord>,
    /// Global enumeration, in mint order.
    all_tokens: Vec<U256>,
    /// Per-owner enumeration, order preserved across transfers.
    owned: HashMap<Address, Vec<U256>>,
    /// Single-token approvals. At most one operator per token.
    approvals: HashMap<U256, Address>,
    /// Blanket (owner, operator) approvals.
    operator_approvals: HashSet<(Address, Address)>,
    transfer_lock: u32,
}

impl TokenEngine {
    /// Creates an engine deployed at `address`, owned by `owner`.
    #[must_use]
    pub fn new(address: Address, owner: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            access: AccessRegistry::new(address, owner),
            clock,
            tokens: HashMap::new(),
            all_tokens: Vec::new(),
            owned: HashMap::new(),
            approvals: HashMap::new(),
            operator_approvals: HashSet::new(),
            transfer_lock: DEFAULT_TRANSFER_LOCK,
        }
    }

    /// The embedded access registry.
    #[must_use]
    pub const fn registry(&self) -> &AccessRegistry {
        &self.access
    }

    /// Mutable access to the embedded registry (role/feature management).
    pub fn registry_mut(&mut self) -> &mut AccessRegistry {
        &mut self.access
    }

    /// Current time from the injected clock.
    pub(crate) fn now(&self) -> u64 {
        self.clock.now()
    }

    /// The contract-wide transfer lock mask.
    #[inline]
    #[must_use]
    pub const fn transfer_lock(&self) -> u32 {
        self.transfer_lock
    }

    /// Replaces the transfer lock mask.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_TRANSFER_LOCK_PROVIDER`.
    pub fn set_transfer_lock(&mut self, caller: Address, mask: u32) -> EngineResult<()> {
        self.require_role(caller, RoleSet::ROLE_TRANSFER_LOCK_PROVIDER)?;
        self.transfer_lock = mask;
        Ok(())
    }

    // =========================================================================
    // Supply and enumeration
    // =========================================================================

    /// True when a token with this id exists.
    #[must_use]
    pub fn exists(&self, id: U256) -> bool {
        self.tokens.contains_key(&id)
    }

    /// Total number of live tokens.
    #[must_use]
    pub fn total_supply(&self) -> usize {
        self.all_tokens.len()
    }

    /// Number of tokens held by `owner`.
    #[must_use]
    pub fn balance_of(&self, owner: Address) -> usize {
        self.owned.get(&owner).map_or(0, Vec::len)
    }

    /// Token id at global enumeration index `index`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the index is out of range.
    pub fn token_by_index(&self, index: usize) -> EngineResult<U256> {
        self.all_tokens
            .get(index)
            .copied()
            .ok_or_else(|| EngineError::NotFound(format!("no token at index {index}")))
    }

    /// Token id at `owner`'s enumeration index `index`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the index is out of range for that owner.
    pub fn token_of_owner_by_index(&self, owner: Address, index: usize) -> EngineResult<U256> {
        self.owned
            .get(&owner)
            .and_then(|ids| ids.get(index))
            .copied()
            .ok_or_else(|| EngineError::NotFound(format!("{owner} has no token at index {index}")))
    }

    /// Every token of `owner` as `(id, packed properties word)`, in
    /// enumeration order. The bulk read downstream statistics consume.
    #[must_use]
    pub fn get_packed_collection(&self, owner: Address) -> Vec<(U256, U256)> {
        self.owned
            .get(&owner)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.tokens.get(id).map(|t| (*id, t.properties.raw())))
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // Record access
    // =========================================================================

    /// The full record of a token.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn token(&self, id: U256) -> EngineResult<&TokenRecord> {
        self.tokens
            .get(&id)
            .ok_or_else(|| EngineError::NotFound(format!("token {id} does not exist")))
    }

    /// Current owner of a token.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn owner_of(&self, id: U256) -> EngineResult<Address> {
        Ok(self.token(id)?.owner)
    }

    /// A token's state bitmask.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn get_state(&self, id: U256) -> EngineResult<u32> {
        Ok(self.token(id)?.state)
    }

    /// A token's full packed properties word.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn get_properties(&self, id: U256) -> EngineResult<PackedWord> {
        Ok(self.token(id)?.properties)
    }

    /// Reads a bit window out of a token's properties word.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing token, `InvalidArgument` for a bad window.
    pub fn read_properties(&self, id: U256, offset: u32, length: u32) -> EngineResult<U256> {
        self.token(id)?.properties.read(offset, length)
    }

    // =========================================================================
    // Minting and burning
    // =========================================================================

    /// Mints a new token.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without `ROLE_TOKEN_CREATOR`
    /// - `InvalidArgument` for a zero id, zero destination, or minting to
    ///   the engine itself
    /// - `AlreadyExists` when the id is taken (ids are never reused)
    pub fn mint(
        &mut self,
        caller: Address,
        to: Address,
        id: U256,
        properties: PackedWord,
    ) -> EngineResult<()> {
        self.require_role(caller, RoleSet::ROLE_TOKEN_CREATOR)?;
        if id == U256::ZERO {
            return Err(EngineError::InvalidArgument("token id must be non-zero".into()));
        }
        if to == Address::ZERO || to == self.access.address() {
            return Err(EngineError::InvalidArgument(format!(
                "cannot mint to {to}"
            )));
        }
        if self.exists(id) {
            return Err(EngineError::AlreadyExists(format!("token {id} already minted")));
        }
        let now = self.clock.now();
        self.tokens.insert(
            id,
            TokenRecord {
                properties,
                owner: to,
                state: 0,
                creation_time: now,
                ownership_modified: 0,
                properties_modified: 0,
                state_modified: 0,
            },
        );
        self.all_tokens.push(id);
        self.owned.entry(to).or_default().push(id);
        tracing::debug!("token {id} minted to {to}");
        Ok(())
    }

    /// Burns a token, removing it from both enumerations.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_TOKEN_DESTROYER`; `NotFound` for a
    /// missing token.
    pub fn burn(&mut self, caller: Address, id: U256) -> EngineResult<()> {
        self.require_role(caller, RoleSet::ROLE_TOKEN_DESTROYER)?;
        let Some(record) = self.tokens.remove(&id) else {
            return Err(EngineError::NotFound(format!("token {id} does not exist")));
        };
        self.all_tokens.retain(|t| *t != id);
        if let Some(ids) = self.owned.get_mut(&record.owner) {
            ids.retain(|t| *t != id);
        }
        self.approvals.remove(&id);
        tracing::debug!("token {id} burned");
        Ok(())
    }

    // =========================================================================
    // Approvals
    // =========================================================================

    /// The approved operator of a token, if any.
    #[must_use]
    pub fn approved_of(&self, id: U256) -> Option<Address> {
        self.approvals.get(&id).copied()
    }

    /// True when `operator` holds a blanket approval from `owner`.
    #[must_use]
    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operator_approvals.contains(&(owner, operator))
    }

    /// Approves `to` to move one token. Replaces any previous approval.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing token; `Unauthorized` unless the caller
    /// owns it; `InvalidArgument` for approving zero or the owner itself.
    pub fn approve(&mut self, caller: Address, to: Address, id: U256) -> EngineResult<()> {
        let owner = self.owner_of(id)?;
        if caller != owner {
            return Err(EngineError::Unauthorized(format!(
                "{caller} does not own token {id}"
            )));
        }
        if to == Address::ZERO {
            return Err(EngineError::InvalidArgument(
                "cannot approve the zero address; revoke instead".into(),
            ));
        }
        if to == owner {
            return Err(EngineError::InvalidArgument(
                "cannot approve the token owner".into(),
            ));
        }
        self.approvals.insert(id, to);
        Ok(())
    }

    /// Clears a token's approval.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing token or when no approval exists;
    /// `Unauthorized` unless the caller owns the token.
    pub fn revoke_approval(&mut self, caller: Address, id: U256) -> EngineResult<()> {
        let owner = self.owner_of(id)?;
        if caller != owner {
            return Err(EngineError::Unauthorized(format!(
                "{caller} does not own token {id}"
            )));
        }
        if self.approvals.remove(&id).is_none() {
            return Err(EngineError::NotFound(format!(
                "token {id} has no approval to revoke"
            )));
        }
        Ok(())
    }

    /// Grants or revokes a blanket operator approval for all of the
    /// caller's tokens.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero or self operator; `NotFound` when
    /// revoking an approval that was never granted.
    pub fn set_approval_for_all(
        &mut self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> EngineResult<()> {
        if operator == Address::ZERO || operator == caller {
            return Err(EngineError::InvalidArgument(format!(
                "invalid blanket operator {operator}"
            )));
        }
        if approved {
            self.operator_approvals.insert((caller, operator));
            Ok(())
        } else if self.operator_approvals.remove(&(caller, operator)) {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!(
                "{operator} holds no blanket approval from {caller}"
            )))
        }
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Owner-initiated transfer.
    ///
    /// # Errors
    ///
    /// See [`TokenEngine::transfer_from`]; the caller must be the owner.
    pub fn transfer(&mut self, caller: Address, to: Address, id: U256) -> EngineResult<()> {
        let from = self.owner_of(id)?;
        self.transfer_from(caller, from, to, id)
    }

    /// Transfers a token, by its owner or an approved operator.
    ///
    /// # Errors
    ///
    /// - `NotFound`: token does not exist
    /// - `Unauthorized`: the relevant transfer feature is disabled, or the
    ///   caller is neither owner nor approved
    /// - `InvalidArgument`: `from` is not the owner, or the destination is
    ///   zero, the current owner, or the engine itself
    /// - `StateConflict`: the token's state intersects the transfer lock
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: U256,
    ) -> EngineResult<()> {
        self.check_transfer(caller, from, to, id)?;
        self.commit_transfer(from, to, id);
        Ok(())
    }

    /// Transfer requiring the destination, if a contract, to acknowledge
    /// receipt. `receiver` is `Some` exactly when the destination is a
    /// contract account; a rejecting or absent acknowledgment aborts the
    /// transfer before any state changes.
    ///
    /// # Errors
    ///
    /// As [`TokenEngine::transfer_from`], plus `StateConflict` when the
    /// receiver rejects the token.
    pub fn safe_transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: U256,
        data: &[u8],
        receiver: Option<&dyn Erc721Receiver>,
    ) -> EngineResult<()> {
        self.check_transfer(caller, from, to, id)?;
        if let Some(receiver) = receiver {
            if !receiver.on_erc721_received(caller, from, id, data) {
                return Err(EngineError::StateConflict(format!(
                    "destination {to} rejected token {id}"
                )));
            }
        }
        self.commit_transfer(from, to, id);
        Ok(())
    }

    // =========================================================================
    // State and properties
    // =========================================================================

    /// Rewrites a token's state bitmask.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_STATE_PROVIDER`; `NotFound` for a
    /// missing token.
    pub fn set_state(&mut self, caller: Address, id: U256, state: u32) -> EngineResult<()> {
        self.require_role(caller, RoleSet::ROLE_STATE_PROVIDER)?;
        let now = self.clock.now();
        let record = self.token_mut(id)?;
        record.state = state;
        record.state_modified = now;
        Ok(())
    }

    /// Writes a bit window of a token's properties word, gated by
    /// `required_role`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the role, `NotFound` for a missing token,
    /// `InvalidArgument` for a bad window.
    pub fn write_properties(
        &mut self,
        caller: Address,
        id: U256,
        value: U256,
        offset: u32,
        length: u32,
        required_role: RoleSet,
    ) -> EngineResult<()> {
        self.require_role(caller, required_role)?;
        let now = self.clock.now();
        let record = self.token_mut(id)?;
        record.properties = record.properties.write(value, offset, length)?;
        record.properties_modified = now;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn token_mut(&mut self, id: U256) -> EngineResult<&mut TokenRecord> {
        self.tokens
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("token {id} does not exist")))
    }

    fn require_role(&self, caller: Address, role: RoleSet) -> EngineResult<()> {
        if self.access.has_role(caller, role) {
            Ok(())
        } else {
            Err(EngineError::Unauthorized(format!(
                "{caller} lacks the required role"
            )))
        }
    }

    /// All transfer validation, no mutation. Keeps safe transfers
    /// all-or-nothing around the receiver callback.
    fn check_transfer(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        id: U256,
    ) -> EngineResult<()> {
        let record = self.token(id)?;
        if record.owner != from {
            return Err(EngineError::InvalidArgument(format!(
                "{from} is not the owner of token {id}"
            )));
        }
        if caller == from {
            if !self.access.feature_enabled(RoleSet::FEATURE_TRANSFERS) {
                return Err(EngineError::Unauthorized("transfers are disabled".into()));
            }
        } else {
            if !self.access.feature_enabled(RoleSet::FEATURE_TRANSFERS_ON_BEHALF) {
                return Err(EngineError::Unauthorized(
                    "transfers on behalf are disabled".into(),
                ));
            }
            let approved = self.approved_of(id) == Some(caller)
                || self.is_approved_for_all(from, caller);
            if !approved {
                return Err(EngineError::Unauthorized(format!(
                    "{caller} is neither owner nor approved for token {id}"
                )));
            }
        }
        if to == Address::ZERO || to == from || to == self.access.address() {
            return Err(EngineError::InvalidArgument(format!(
                "invalid transfer destination {to}"
            )));
        }
        if record.state & self.transfer_lock != 0 {
            return Err(EngineError::StateConflict(format!(
                "token {id} is transfer-locked"
            )));
        }
        Ok(())
    }

    fn commit_transfer(&mut self, from: Address, to: Address, id: U256) {
        let now = self.clock.now();
        self.approvals.remove(&id);
        if let Some(ids) = self.owned.get_mut(&from) {
            ids.retain(|t| *t != id);
        }
        self.owned.entry(to).or_default().push(id);
        if let Some(record) = self.tokens.get_mut(&id) {
            record.owner = to;
            record.ownership_modified = now;
        }
        tracing::debug!("token {id} transferred {from} -> {to}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepmine_core::ManualClock;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    const OWNER: u8 = 1;
    const ALICE: u8 = 2;
    const BOB: u8 = 3;

    fn engine() -> (TokenEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let mut engine = TokenEngine::new(addr(0xEE), addr(OWNER), clock.clone());
        engine
            .registry_mut()
            .update_features(
                addr(OWNER),
                RoleSet::FEATURE_TRANSFERS.with(RoleSet::FEATURE_TRANSFERS_ON_BEHALF),
            )
            .unwrap();
        (engine, clock)
    }

    fn id(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_mint_sets_creation_time_and_enumeration() {
        let (mut engine, clock) = engine();
        clock.set(5_000);
        engine
            .mint(addr(OWNER), addr(ALICE), id(7), PackedWord::ZERO)
            .unwrap();
        assert_eq!(engine.token(id(7)).unwrap().creation_time, 5_000);
        assert_eq!(engine.total_supply(), 1);
        assert_eq!(engine.balance_of(addr(ALICE)), 1);
        assert_eq!(engine.token_by_index(0).unwrap(), id(7));
        assert_eq!(engine.token_of_owner_by_index(addr(ALICE), 0).unwrap(), id(7));
    }

    #[test]
    fn test_mint_rejections() {
        let (mut engine, _) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        assert!(matches!(
            engine.mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO),
            Err(EngineError::AlreadyExists(_))
        ));
        assert!(matches!(
            engine.mint(addr(OWNER), Address::ZERO, id(2), PackedWord::ZERO),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.mint(addr(OWNER), addr(0xEE), id(2), PackedWord::ZERO),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.mint(addr(OWNER), addr(ALICE), U256::ZERO, PackedWord::ZERO),
            Err(EngineError::InvalidArgument(_))
        ));
        // No minter role.
        assert!(matches!(
            engine.mint(addr(BOB), addr(ALICE), id(2), PackedWord::ZERO),
            Err(EngineError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_transfer_moves_enumeration_and_clears_approval() {
        let (mut engine, clock) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        engine.approve(addr(ALICE), addr(BOB), id(1)).unwrap();
        clock.advance(10);
        engine.transfer(addr(ALICE), addr(BOB), id(1)).unwrap();
        assert_eq!(engine.owner_of(id(1)).unwrap(), addr(BOB));
        assert_eq!(engine.balance_of(addr(ALICE)), 0);
        assert_eq!(engine.balance_of(addr(BOB)), 1);
        assert_eq!(engine.approved_of(id(1)), None);
        assert_eq!(engine.token(id(1)).unwrap().ownership_modified, 1_000_010);
    }

    #[test]
    fn test_transfer_feature_gating() {
        let (mut engine, _) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        engine
            .registry_mut()
            .update_features(addr(OWNER), RoleSet::NONE)
            .unwrap();
        assert!(matches!(
            engine.transfer(addr(ALICE), addr(BOB), id(1)),
            Err(EngineError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_operator_transfer_requires_approval_and_feature() {
        let (mut engine, _) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        // Not approved.
        assert!(matches!(
            engine.transfer_from(addr(BOB), addr(ALICE), addr(BOB), id(1)),
            Err(EngineError::Unauthorized(_))
        ));
        engine
            .set_approval_for_all(addr(ALICE), addr(BOB), true)
            .unwrap();
        engine
            .transfer_from(addr(BOB), addr(ALICE), addr(BOB), id(1))
            .unwrap();
        assert_eq!(engine.owner_of(id(1)).unwrap(), addr(BOB));
    }

    #[test]
    fn test_transfer_lock_blocks_everyone_until_cleared() {
        let (mut engine, _) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        engine
            .set_state(addr(OWNER), id(1), crate::layout::STATE_MINING)
            .unwrap();
        // Owner blocked.
        assert!(matches!(
            engine.transfer(addr(ALICE), addr(BOB), id(1)),
            Err(EngineError::StateConflict(_))
        ));
        // Approved operator blocked too.
        engine.approve(addr(ALICE), addr(BOB), id(1)).unwrap();
        assert!(matches!(
            engine.transfer_from(addr(BOB), addr(ALICE), addr(BOB), id(1)),
            Err(EngineError::StateConflict(_))
        ));
        // Clearing the intersecting bits re-enables transfer.
        engine.set_state(addr(OWNER), id(1), 0).unwrap();
        engine.transfer(addr(ALICE), addr(BOB), id(1)).unwrap();
    }

    struct Accepting;
    impl Erc721Receiver for Accepting {
        fn on_erc721_received(&self, _: Address, _: Address, _: U256, _: &[u8]) -> bool {
            true
        }
    }

    struct Rejecting;
    impl Erc721Receiver for Rejecting {
        fn on_erc721_received(&self, _: Address, _: Address, _: U256, _: &[u8]) -> bool {
            false
        }
    }

    #[test]
    fn test_safe_transfer_receiver_acknowledgment() {
        let (mut engine, _) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        // Rejecting receiver aborts with no state change.
        assert!(matches!(
            engine.safe_transfer_from(addr(ALICE), addr(ALICE), addr(BOB), id(1), &[], Some(&Rejecting)),
            Err(EngineError::StateConflict(_))
        ));
        assert_eq!(engine.owner_of(id(1)).unwrap(), addr(ALICE));
        // Accepting receiver commits.
        engine
            .safe_transfer_from(addr(ALICE), addr(ALICE), addr(BOB), id(1), &[], Some(&Accepting))
            .unwrap();
        assert_eq!(engine.owner_of(id(1)).unwrap(), addr(BOB));
    }

    #[test]
    fn test_approval_rules() {
        let (mut engine, _) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        assert!(matches!(
            engine.approve(addr(BOB), addr(BOB), id(1)),
            Err(EngineError::Unauthorized(_))
        ));
        assert!(matches!(
            engine.approve(addr(ALICE), addr(ALICE), id(1)),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.revoke_approval(addr(ALICE), id(1)),
            Err(EngineError::NotFound(_))
        ));
        engine.approve(addr(ALICE), addr(BOB), id(1)).unwrap();
        engine.revoke_approval(addr(ALICE), id(1)).unwrap();
        assert!(matches!(
            engine.set_approval_for_all(addr(ALICE), addr(BOB), false),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_burn_removes_token() {
        let (mut engine, _) = engine();
        engine
            .mint(addr(OWNER), addr(ALICE), id(1), PackedWord::ZERO)
            .unwrap();
        engine.burn(addr(OWNER), id(1)).unwrap();
        assert!(!engine.exists(id(1)));
        assert_eq!(engine.total_supply(), 0);
        assert_eq!(engine.balance_of(addr(ALICE)), 0);
        assert!(matches!(
            engine.burn(addr(OWNER), id(1)),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_packed_collection_in_enumeration_order() {
        let (mut engine, _) = engine();
        for n in 1..=3u64 {
            let word = PackedWord::ZERO.write_u64(n, 0, 32).unwrap();
            engine.mint(addr(OWNER), addr(ALICE), id(n), word).unwrap();
        }
        let collection = engine.get_packed_collection(addr(ALICE));
        assert_eq!(collection.len(), 3);
        for (n, (token_id, word)) in collection.iter().enumerate() {
            let n = n as u64 + 1;
            assert_eq!(*token_id, id(n));
            assert_eq!(*word, U256::from(n));
        }
    }

    #[test]
    fn test_getters_fail_on_missing_token() {
        let (engine, _) = engine();
        assert!(matches!(engine.owner_of(id(9)), Err(EngineError::NotFound(_))));
        assert!(matches!(engine.get_state(id(9)), Err(EngineError::NotFound(_))));
        assert!(matches!(
            engine.read_properties(id(9), 0, 8),
            Err(EngineError::NotFound(_))
        ));
    }
}
