//! # Access Registry
//!
//! Per-address role masks, the global feature register, and the
//! owner/operator hierarchy. One registry per contract instance - the
//! tests instantiate several to prove instances never leak state into
//! each other.
//!
//! The central invariant: the effective grant of any role mutation is
//! `requested & roles(caller)`. A manager can delegate only what it holds.

use std::collections::HashMap;

use alloy_primitives::Address;
use deepmine_core::{EngineError, EngineResult};

use crate::roles::RoleSet;

/// Role registers for one contract instance.
#[derive(Debug, Clone)]
pub struct AccessRegistry {
    /// This instance's own address (domain separation for multisig).
    address: Address,
    /// The deployer. Holds every role bit implicitly, forever.
    owner: Address,
    /// Granted capabilities per address. Never holds a zero mask.
    user_roles: HashMap<Address, RoleSet>,
    /// Global on/off switches.
    features: RoleSet,
}

impl AccessRegistry {
    /// Creates a registry for the instance deployed at `address`, owned by
    /// `owner` with the full mask.
    #[must_use]
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            user_roles: HashMap::new(),
            features: RoleSet::NONE,
        }
    }

    /// This instance's own address.
    #[inline]
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The deployer address.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// The global feature register.
    #[inline]
    #[must_use]
    pub const fn features(&self) -> RoleSet {
        self.features
    }

    /// Roles held by `address`. The owner implicitly holds everything.
    #[must_use]
    pub fn roles_of(&self, address: Address) -> RoleSet {
        if address == self.owner {
            RoleSet::FULL
        } else {
            self.user_roles.get(&address).copied().unwrap_or(RoleSet::NONE)
        }
    }

    /// True when `address` holds every bit of `role`.
    #[must_use]
    pub fn has_role(&self, address: Address, role: RoleSet) -> bool {
        self.roles_of(address).contains(role)
    }

    /// True when every bit of `feature` is switched on.
    #[must_use]
    pub fn feature_enabled(&self, feature: RoleSet) -> bool {
        self.features.contains(feature)
    }

    /// Atomically replaces the feature register.
    ///
    /// Idempotent: setting the current mask again is a no-op success.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when the caller lacks `ROLE_FEATURE_MANAGER`, or
    /// while multisig governance is active.
    pub fn update_features(&mut self, caller: Address, mask: RoleSet) -> EngineResult<()> {
        self.require_plain_governance()?;
        if !self.has_role(caller, RoleSet::ROLE_FEATURE_MANAGER) {
            return Err(EngineError::Unauthorized(format!(
                "{caller} lacks the feature manager role"
            )));
        }
        tracing::debug!("features {:x} -> {:x}", self.features.raw(), mask.raw());
        self.features = mask;
        Ok(())
    }

    /// Registers a new operator with `requested & roles(caller)`.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: caller lacks `ROLE_ROLE_MANAGER`, holds none of
    ///   the requested bits, or multisig governance is active
    /// - `AlreadyExists`: the target already holds a non-zero mask
    /// - `InvalidArgument`: zero target address
    pub fn add_operator(
        &mut self,
        caller: Address,
        target: Address,
        requested: RoleSet,
    ) -> EngineResult<()> {
        self.require_plain_governance()?;
        self.require_role_manager(caller)?;
        if target == Address::ZERO {
            return Err(EngineError::InvalidArgument(
                "operator address must be non-zero".into(),
            ));
        }
        if !self.roles_of(target).is_empty() || target == self.owner {
            return Err(EngineError::AlreadyExists(format!(
                "{target} is already an operator; remove it first"
            )));
        }
        let effective = requested.intersect(self.roles_of(caller));
        if effective.is_empty() {
            return Err(EngineError::Unauthorized(format!(
                "{caller} holds none of the requested role bits"
            )));
        }
        tracing::debug!("operator {target} added with {:x}", effective.raw());
        self.user_roles.insert(target, effective);
        Ok(())
    }

    /// Deletes an operator, zeroing its mask.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: caller lacks `ROLE_ROLE_MANAGER`, or multisig
    ///   governance is active
    /// - `NotFound`: the target holds no roles
    /// - `InvalidArgument`: self-removal
    pub fn remove_operator(&mut self, caller: Address, target: Address) -> EngineResult<()> {
        self.require_plain_governance()?;
        self.require_role_manager(caller)?;
        if target == caller {
            return Err(EngineError::InvalidArgument(
                "an operator cannot remove itself".into(),
            ));
        }
        if self.user_roles.remove(&target).is_none() {
            return Err(EngineError::NotFound(format!("{target} is not an operator")));
        }
        tracing::debug!("operator {target} removed");
        Ok(())
    }

    /// ORs `requested & roles(caller)` into an existing operator's mask.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: caller lacks `ROLE_ROLE_MANAGER`, holds none of
    ///   the requested bits, or multisig governance is active
    /// - `NotFound`: the target is not an operator
    pub fn add_role(
        &mut self,
        caller: Address,
        target: Address,
        requested: RoleSet,
    ) -> EngineResult<()> {
        self.require_plain_governance()?;
        self.require_role_manager(caller)?;
        let effective = requested.intersect(self.roles_of(caller));
        if effective.is_empty() {
            return Err(EngineError::Unauthorized(format!(
                "{caller} holds none of the requested role bits"
            )));
        }
        let Some(existing) = self.user_roles.get_mut(&target) else {
            return Err(EngineError::NotFound(format!("{target} is not an operator")));
        };
        *existing = existing.with(effective);
        Ok(())
    }

    /// Clears `requested & roles(caller)` from an existing operator's mask.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: caller lacks `ROLE_ROLE_MANAGER`, holds none of
    ///   the requested bits, or multisig governance is active
    /// - `NotFound`: the target is not an operator
    pub fn remove_role(
        &mut self,
        caller: Address,
        target: Address,
        requested: RoleSet,
    ) -> EngineResult<()> {
        self.require_plain_governance()?;
        self.require_role_manager(caller)?;
        let effective = requested.intersect(self.roles_of(caller));
        if effective.is_empty() {
            return Err(EngineError::Unauthorized(format!(
                "{caller} holds none of the requested role bits"
            )));
        }
        let Some(existing) = self.user_roles.get_mut(&target) else {
            return Err(EngineError::NotFound(format!("{target} is not an operator")));
        };
        *existing = existing.without(effective);
        if existing.is_empty() {
            self.user_roles.remove(&target);
        }
        Ok(())
    }

    /// Full role replace, bypassing subset checks. Multisig execution path
    /// only - quorum was already verified there.
    pub(crate) fn set_roles(&mut self, target: Address, role: RoleSet) {
        if role.is_empty() {
            self.user_roles.remove(&target);
        } else {
            self.user_roles.insert(target, role);
        }
    }

    /// Feature register replace for the multisig execution path.
    pub(crate) fn set_features(&mut self, mask: RoleSet) {
        self.features = mask;
    }

    fn require_role_manager(&self, caller: Address) -> EngineResult<()> {
        if self.has_role(caller, RoleSet::ROLE_ROLE_MANAGER) {
            Ok(())
        } else {
            Err(EngineError::Unauthorized(format!(
                "{caller} lacks the role manager role"
            )))
        }
    }

    /// Plain entry points fail unconditionally while the multisig feature
    /// is active.
    fn require_plain_governance(&self) -> EngineResult<()> {
        if self.feature_enabled(RoleSet::FEATURE_MSIG_ENABLED) {
            Err(EngineError::Unauthorized(
                "multisig governance is active; use the msig gateway".into(),
            ))
        } else {
            Ok(())
        }
    }
}
