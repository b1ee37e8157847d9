//! # Role and Feature Bitmasks
//!
//! A role is one bit in a 256-bit mask; an address's capabilities are the
//! union of its bits. Features live in a separate register but share the
//! same mask type. The only algebra the engines ever need is subset,
//! intersection, and union - all O(1) on the packed mask.

use alloy_primitives::U256;

/// A 256-bit capability bitmask (roles of an address, or the global
/// feature register).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RoleSet(U256);

impl RoleSet {
    /// No capabilities.
    pub const NONE: Self = Self(U256::ZERO);
    /// Every capability bit set - the owner's implicit mask.
    pub const FULL: Self = Self(U256::MAX);

    /// Permission to add/remove operators and grant/revoke role bits.
    pub const ROLE_ROLE_MANAGER: Self = Self(U256::from_limbs([1 << 0, 0, 0, 0]));
    /// Permission to update the global feature register.
    pub const ROLE_FEATURE_MANAGER: Self = Self(U256::from_limbs([1 << 1, 0, 0, 0]));
    /// Qualifies an address as a multisig request signer.
    pub const ROLE_ACCESS_MANAGER: Self = Self(U256::from_limbs([1 << 2, 0, 0, 0]));
    /// Permission to mint tokens.
    pub const ROLE_TOKEN_CREATOR: Self = Self(U256::from_limbs([1 << 3, 0, 0, 0]));
    /// Permission to burn tokens.
    pub const ROLE_TOKEN_DESTROYER: Self = Self(U256::from_limbs([1 << 4, 0, 0, 0]));
    /// Permission to rewrite a token's state bits.
    pub const ROLE_STATE_PROVIDER: Self = Self(U256::from_limbs([1 << 5, 0, 0, 0]));
    /// Permission to change the contract-wide transfer lock mask.
    pub const ROLE_TRANSFER_LOCK_PROVIDER: Self = Self(U256::from_limbs([1 << 6, 0, 0, 0]));
    /// Permission to raise a gem's level.
    pub const ROLE_LEVEL_PROVIDER: Self = Self(U256::from_limbs([1 << 7, 0, 0, 0]));
    /// Permission to upgrade a gem's grade.
    pub const ROLE_GRADE_PROVIDER: Self = Self(U256::from_limbs([1 << 8, 0, 0, 0]));
    /// Permission to rewrite a gem's energetic age and mining rate.
    pub const ROLE_AGE_PROVIDER: Self = Self(U256::from_limbs([1 << 9, 0, 0, 0]));
    /// Permission to force-release mining bindings and register special gems.
    pub const ROLE_MINING_OPERATOR: Self = Self(U256::from_limbs([1 << 10, 0, 0, 0]));

    /// Feature: owner-initiated token transfers are enabled.
    pub const FEATURE_TRANSFERS: Self = Self(U256::from_limbs([1 << 0, 0, 0, 0]));
    /// Feature: approved-operator transfers are enabled.
    pub const FEATURE_TRANSFERS_ON_BEHALF: Self = Self(U256::from_limbs([1 << 1, 0, 0, 0]));
    /// Feature: governance goes through the multisig gateway; plain role
    /// and feature updates are rejected while this is set.
    pub const FEATURE_MSIG_ENABLED: Self = Self(U256::from_limbs([1 << 2, 0, 0, 0]));
    /// Feature: plot mining is enabled.
    pub const FEATURE_MINING: Self = Self(U256::from_limbs([1 << 3, 0, 0, 0]));

    /// Creates a mask from a raw 256-bit value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Returns the raw 256-bit mask.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> U256 {
        self.0
    }

    /// True when every bit of `required` is present in `self`.
    #[inline]
    #[must_use]
    pub fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// True when at least one bit is shared with `other`.
    #[inline]
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != U256::ZERO
    }

    /// True when `self` is a subset of `granted`.
    #[inline]
    #[must_use]
    pub fn is_subset(self, granted: Self) -> bool {
        granted.contains(self)
    }

    /// Union of two masks.
    #[inline]
    #[must_use]
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `self` with every bit of `other` cleared.
    #[inline]
    #[must_use]
    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Intersection of two masks.
    #[inline]
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// True when no bit is set.
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == U256::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_bits_are_disjoint() {
        let all = [
            RoleSet::ROLE_ROLE_MANAGER,
            RoleSet::ROLE_FEATURE_MANAGER,
            RoleSet::ROLE_ACCESS_MANAGER,
            RoleSet::ROLE_TOKEN_CREATOR,
            RoleSet::ROLE_TOKEN_DESTROYER,
            RoleSet::ROLE_STATE_PROVIDER,
            RoleSet::ROLE_TRANSFER_LOCK_PROVIDER,
            RoleSet::ROLE_LEVEL_PROVIDER,
            RoleSet::ROLE_GRADE_PROVIDER,
            RoleSet::ROLE_AGE_PROVIDER,
            RoleSet::ROLE_MINING_OPERATOR,
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                assert_eq!(a.intersects(*b), i == j);
            }
        }
    }

    #[test]
    fn test_subset_algebra() {
        let granted = RoleSet::ROLE_ROLE_MANAGER.with(RoleSet::ROLE_TOKEN_CREATOR);
        assert!(RoleSet::ROLE_ROLE_MANAGER.is_subset(granted));
        assert!(!RoleSet::ROLE_ACCESS_MANAGER.is_subset(granted));
        assert!(RoleSet::NONE.is_subset(granted));
        assert!(granted.is_subset(RoleSet::FULL));
    }

    #[test]
    fn test_intersect_drops_unheld_bits() {
        let requested = RoleSet::from_raw(U256::from(0xFFFFu64));
        let held = RoleSet::from_raw(U256::from(0xF0F0u64));
        assert_eq!(requested.intersect(held), held);
    }

    #[test]
    fn test_without_clears_exactly() {
        let mask = RoleSet::ROLE_ROLE_MANAGER
            .with(RoleSet::ROLE_STATE_PROVIDER)
            .without(RoleSet::ROLE_ROLE_MANAGER);
        assert_eq!(mask, RoleSet::ROLE_STATE_PROVIDER);
    }
}
