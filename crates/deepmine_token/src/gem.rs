//! # Gem Attribute Layer
//!
//! Typed accessors over the gem packing layout in [`crate::layout::gem`].
//! Everything here funnels through the packed-word windows of the token
//! engine, so gem state stays bit-compatible with the raw properties word.
//!
//! Level and grade only ever move up. Energetic age and the last mining
//! rate are maintenance fields owned by the mining engine.

use alloy_primitives::{Address, U256};
use deepmine_access::RoleSet;
use deepmine_core::{EngineError, EngineResult, PackedWord};

use crate::engine::TokenEngine;
use crate::layout::{gem, STATE_MINING};

/// Splits a 32-bit grade into `(type, value)`.
///
/// # Errors
///
/// `InvalidArgument` when the type is outside 1..=6 or the value is not
/// below one million.
pub fn split_grade(grade: u32) -> EngineResult<(u8, u32)> {
    let grade_type = (grade >> gem::GRADE_TYPE_OFFSET) as u8;
    let grade_value = grade & ((1 << gem::GRADE_VALUE_BITS) - 1);
    if grade_type < 1 || grade_type > gem::GRADE_TYPES {
        return Err(EngineError::InvalidArgument(format!(
            "grade type {grade_type} outside 1..={}",
            gem::GRADE_TYPES
        )));
    }
    if grade_value >= gem::GRADE_VALUES {
        return Err(EngineError::InvalidArgument(format!(
            "grade value {grade_value} must be below {}",
            gem::GRADE_VALUES
        )));
    }
    Ok((grade_type, grade_value))
}

impl TokenEngine {
    /// Mints a gem with validated initial attributes. Age and last mining
    /// rate start at zero.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an out-of-range color, level, or grade; all
    /// the mint errors of [`TokenEngine::mint`] otherwise.
    pub fn mint_gem(
        &mut self,
        caller: Address,
        to: Address,
        id: U256,
        color: u8,
        level: u8,
        grade: u32,
    ) -> EngineResult<()> {
        if color < 1 || color > gem::COLORS {
            return Err(EngineError::InvalidArgument(format!(
                "gem color {color} outside 1..={}",
                gem::COLORS
            )));
        }
        if level < 1 || level > gem::MAX_LEVEL {
            return Err(EngineError::InvalidArgument(format!(
                "gem level {level} outside 1..={}",
                gem::MAX_LEVEL
            )));
        }
        split_grade(grade)?;
        let word = PackedWord::ZERO
            .write_u64(u64::from(grade), gem::GRADE_OFFSET, gem::GRADE_BITS)?
            .write_u64(u64::from(level), gem::LEVEL_OFFSET, gem::LEVEL_BITS)?
            .write_u64(u64::from(color), gem::COLOR_OFFSET, gem::COLOR_BITS)?
            .write_u64(self.now(), gem::AGE_ANCHOR_OFFSET, gem::AGE_ANCHOR_BITS)?;
        self.mint(caller, to, id, word)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The 48-bit `color:level:grade` concatenation, the externally visible
    /// identity of a gem.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn gem_properties(&self, id: U256) -> EngineResult<u64> {
        self.get_properties(id)?.read_u64(0, gem::PROPERTIES_BITS)
    }

    /// Gem color (1..=12).
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn gem_color(&self, id: U256) -> EngineResult<u8> {
        Ok(self
            .get_properties(id)?
            .read_u64(gem::COLOR_OFFSET, gem::COLOR_BITS)? as u8)
    }

    /// Gem level (1..=5).
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn gem_level(&self, id: U256) -> EngineResult<u8> {
        Ok(self
            .get_properties(id)?
            .read_u64(gem::LEVEL_OFFSET, gem::LEVEL_BITS)? as u8)
    }

    /// Combined 32-bit grade, type in the high byte.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn gem_grade(&self, id: U256) -> EngineResult<u32> {
        Ok(self
            .get_properties(id)?
            .read_u64(gem::GRADE_OFFSET, gem::GRADE_BITS)? as u32)
    }

    /// Grade type component (1..=6).
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn gem_grade_type(&self, id: U256) -> EngineResult<u8> {
        Ok(self
            .get_properties(id)?
            .read_u64(gem::GRADE_TYPE_OFFSET, gem::GRADE_TYPE_BITS)? as u8)
    }

    /// Grade value component (below one million).
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn gem_grade_value(&self, id: U256) -> EngineResult<u32> {
        Ok(self
            .get_properties(id)?
            .read_u64(gem::GRADE_VALUE_OFFSET, gem::GRADE_VALUE_BITS)? as u32)
    }

    /// Accumulated energetic age in seconds.
    ///
    /// A resting gem keeps aging on its own: the effective age is the
    /// stored age plus the seconds elapsed since the anchor written by the
    /// last age write. While the gem is locked into mining the stored age
    /// is returned as-is.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn energetic_age(&self, id: U256) -> EngineResult<u64> {
        let record = self.token(id)?;
        let stored = record.properties.read_u64(gem::AGE_OFFSET, gem::AGE_BITS)?;
        if record.state & STATE_MINING != 0 {
            return Ok(stored);
        }
        let anchor = record
            .properties
            .read_u64(gem::AGE_ANCHOR_OFFSET, gem::AGE_ANCHOR_BITS)?;
        Ok(stored + self.now().saturating_sub(anchor))
    }

    /// The mining rate recorded at the end of the last evaluation, in
    /// micro-units.
    ///
    /// # Errors
    ///
    /// `NotFound` when the token does not exist.
    pub fn last_mining_rate(&self, id: U256) -> EngineResult<u32> {
        Ok(self
            .get_properties(id)?
            .read_u64(gem::RATE_OFFSET, gem::RATE_BITS)? as u32)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Raises a gem's level by `levels`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_LEVEL_PROVIDER`; `InvalidArgument` for
    /// a zero increment or a result past the level cap; `NotFound` for a
    /// missing token.
    pub fn level_up_by(&mut self, caller: Address, id: U256, levels: u8) -> EngineResult<()> {
        if levels == 0 {
            return Err(EngineError::InvalidArgument(
                "level can only move up".into(),
            ));
        }
        let current = self.gem_level(id)?;
        let next = current.checked_add(levels).filter(|l| *l <= gem::MAX_LEVEL);
        let Some(next) = next else {
            return Err(EngineError::InvalidArgument(format!(
                "level {current} + {levels} exceeds the cap of {}",
                gem::MAX_LEVEL
            )));
        };
        self.write_properties(
            caller,
            id,
            U256::from(next),
            gem::LEVEL_OFFSET,
            gem::LEVEL_BITS,
            RoleSet::ROLE_LEVEL_PROVIDER,
        )
    }

    /// Replaces a gem's grade. The `(type, value)` pair must strictly
    /// increase, value-within-type ordering.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_GRADE_PROVIDER`; `InvalidArgument` for
    /// a malformed or non-increasing grade; `NotFound` for a missing token.
    pub fn upgrade(&mut self, caller: Address, id: U256, grade: u32) -> EngineResult<()> {
        let (new_type, new_value) = split_grade(grade)?;
        let current_type = self.gem_grade_type(id)?;
        let current_value = self.gem_grade_value(id)?;
        if (new_type, new_value) <= (current_type, current_value) {
            return Err(EngineError::InvalidArgument(format!(
                "grade ({new_type}, {new_value}) does not improve on \
                 ({current_type}, {current_value})"
            )));
        }
        self.write_properties(
            caller,
            id,
            U256::from(grade),
            gem::GRADE_OFFSET,
            gem::GRADE_BITS,
            RoleSet::ROLE_GRADE_PROVIDER,
        )
    }

    /// Rewrites a gem's energetic age and re-anchors resting accrual at the
    /// current time.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_AGE_PROVIDER`; `NotFound` for a missing
    /// token.
    pub fn set_energetic_age(&mut self, caller: Address, id: U256, age: u32) -> EngineResult<()> {
        let now = self.now();
        self.write_properties(
            caller,
            id,
            U256::from(age),
            gem::AGE_OFFSET,
            gem::AGE_BITS,
            RoleSet::ROLE_AGE_PROVIDER,
        )?;
        self.write_properties(
            caller,
            id,
            U256::from(now),
            gem::AGE_ANCHOR_OFFSET,
            gem::AGE_ANCHOR_BITS,
            RoleSet::ROLE_AGE_PROVIDER,
        )
    }

    /// Records the rate the last evaluation ended at.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_AGE_PROVIDER`; `NotFound` for a missing
    /// token.
    pub fn set_last_mining_rate(
        &mut self,
        caller: Address,
        id: U256,
        rate: u32,
    ) -> EngineResult<()> {
        self.write_properties(
            caller,
            id,
            U256::from(rate),
            gem::RATE_OFFSET,
            gem::RATE_BITS,
            RoleSet::ROLE_AGE_PROVIDER,
        )
    }
}
