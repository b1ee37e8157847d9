//! # Mining Engine
//!
//! Binds gems to plots and drives the `Unbound -> Bound -> Mining ->
//! Released` state machine. The engine owns two token engines (gems and
//! plots) and acts on them through its own operator identity, which holds
//! the creator, state, and age provider roles in both registries.
//!
//! Binding consumes the gem's resting energy instantly. If that energy
//! alone mines at least one block the offset advances on the spot and
//! nothing locks; otherwise both tokens enter the `MINING` state and
//! elapsed time does the work, with the residual energy carried as a
//! head-start credit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use deepmine_access::{AccessRegistry, RoleSet};
use deepmine_core::{Clock, EngineError, EngineResult, EntropySource};
use deepmine_token::layout::{gem, STATE_MINING};
use deepmine_token::TokenEngine;
use parking_lot::Mutex;

use crate::energy::{resting_energy, unused_energetic_age};
use crate::loot::{LootConfig, BUCKET_ARTIFACTS, BUCKET_GOLD, BUCKET_KEYS, BUCKET_SILVER, LOOT_BUCKETS};
use crate::plot::{offset_window, read_offset, TierStructure};
use crate::rate::{blocks_minable, mining_rate, seconds_for_blocks, MAX_SPECIAL_MULTIPLIER};

/// Minting hook for the fungible loot currencies. The mining engine only
/// ever mints; transfer mechanics live with the currency itself.
pub trait FungibleMinter: Send + Sync {
    /// Mints `amount` units to `to`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; a failure aborts the loot distribution.
    fn mint(&self, to: Address, amount: u64) -> EngineResult<()>;
}

/// The four fungible loot sinks.
pub struct LootMinters {
    /// Silver currency sink.
    pub silver: Arc<dyn FungibleMinter>,
    /// Gold currency sink.
    pub gold: Arc<dyn FungibleMinter>,
    /// Artifact sink.
    pub artifacts: Arc<dyn FungibleMinter>,
    /// Key sink.
    pub keys: Arc<dyn FungibleMinter>,
}

impl LootMinters {
    /// Four in-memory tally minters, returned alongside handles for
    /// balance inspection. Used by tests and local simulation.
    #[must_use]
    pub fn tallies() -> (Self, [Arc<TallyMinter>; 4]) {
        let silver = Arc::new(TallyMinter::default());
        let gold = Arc::new(TallyMinter::default());
        let artifacts = Arc::new(TallyMinter::default());
        let keys = Arc::new(TallyMinter::default());
        let handles = [silver.clone(), gold.clone(), artifacts.clone(), keys.clone()];
        (
            Self {
                silver,
                gold,
                artifacts,
                keys,
            },
            handles,
        )
    }
}

/// In-memory [`FungibleMinter`] keeping per-address tallies.
#[derive(Default)]
pub struct TallyMinter {
    tallies: Mutex<HashMap<Address, u64>>,
}

impl TallyMinter {
    /// Units minted to `who` so far.
    #[must_use]
    pub fn balance(&self, who: Address) -> u64 {
        self.tallies.lock().get(&who).copied().unwrap_or(0)
    }
}

impl FungibleMinter for TallyMinter {
    fn mint(&self, to: Address, amount: u64) -> EngineResult<()> {
        *self.tallies.lock().entry(to).or_insert(0) += amount;
        Ok(())
    }
}

/// An active gem-to-plot binding.
#[derive(Clone, Copy, Debug)]
pub struct Binding {
    /// The bound gem.
    pub gem_id: U256,
    /// Timestamp the binding locked at.
    pub bound_at: u64,
    /// Plot offset when the binding locked.
    pub offset_at_bind: u8,
    /// Deepest block this gem can reach on this plot.
    pub mines_to: u8,
    /// Resting energy carried into the binding, in energy units.
    pub energy_credit: u64,
    /// Mining rate frozen at bind time, micro-units.
    pub rate: u64,
}

impl Binding {
    /// Whole blocks minable at `now`, capped at the gem's reach.
    #[must_use]
    fn blocks_at(&self, now: u64) -> u64 {
        let elapsed = now.saturating_sub(self.bound_at);
        let total = blocks_minable(self.energy_credit + elapsed, self.rate);
        total.min(u64::from(self.mines_to - self.offset_at_bind))
    }
}

/// The mining engine: two token engines, the binding table, and the loot
/// pipeline.
pub struct MiningEngine {
    access: AccessRegistry,
    gems: TokenEngine,
    plots: TokenEngine,
    bindings: HashMap<U256, Binding>,
    bound_gems: HashSet<U256>,
    special_rates: HashMap<U256, u64>,
    loot: LootConfig,
    minters: LootMinters,
    operator: Address,
    clock: Arc<dyn Clock>,
    next_loot_gem: u64,
}

impl MiningEngine {
    /// Deploys the engine at `address` with fresh gem and plot engines at
    /// their own addresses, all owned by `owner`. The engine address is
    /// granted the operating roles in both token registries, and mining
    /// is feature-enabled from the start.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the three addresses are not distinct and
    /// non-zero.
    pub fn new(
        address: Address,
        gems_address: Address,
        plots_address: Address,
        owner: Address,
        clock: Arc<dyn Clock>,
        minters: LootMinters,
    ) -> EngineResult<Self> {
        if address == Address::ZERO
            || address == gems_address
            || address == plots_address
            || gems_address == plots_address
        {
            return Err(EngineError::InvalidArgument(
                "engine addresses must be distinct and non-zero".into(),
            ));
        }
        let mut access = AccessRegistry::new(address, owner);
        access.update_features(owner, RoleSet::FEATURE_MINING)?;

        let mut gems = TokenEngine::new(gems_address, owner, clock.clone());
        gems.registry_mut().add_operator(
            owner,
            address,
            RoleSet::ROLE_TOKEN_CREATOR
                .with(RoleSet::ROLE_STATE_PROVIDER)
                .with(RoleSet::ROLE_AGE_PROVIDER),
        )?;

        let mut plots = TokenEngine::new(plots_address, owner, clock.clone());
        plots.registry_mut().add_operator(
            owner,
            address,
            RoleSet::ROLE_TOKEN_CREATOR.with(RoleSet::ROLE_STATE_PROVIDER),
        )?;

        Ok(Self {
            access,
            gems,
            plots,
            bindings: HashMap::new(),
            bound_gems: HashSet::new(),
            special_rates: HashMap::new(),
            loot: LootConfig::default(),
            minters,
            operator: address,
            clock,
            next_loot_gem: 1_000_000_001,
        })
    }

    /// Replaces the compiled-in loot tables.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the tables are malformed.
    pub fn with_loot_config(mut self, config: LootConfig) -> EngineResult<Self> {
        config.validate()?;
        self.loot = config;
        Ok(self)
    }

    /// The mining access registry.
    #[must_use]
    pub const fn registry(&self) -> &AccessRegistry {
        &self.access
    }

    /// Mutable mining access registry.
    pub fn registry_mut(&mut self) -> &mut AccessRegistry {
        &mut self.access
    }

    /// The gem token engine.
    #[must_use]
    pub const fn gems(&self) -> &TokenEngine {
        &self.gems
    }

    /// Mutable gem token engine.
    pub fn gems_mut(&mut self) -> &mut TokenEngine {
        &mut self.gems
    }

    /// The plot token engine.
    #[must_use]
    pub const fn plots(&self) -> &TokenEngine {
        &self.plots
    }

    /// Mutable plot token engine.
    pub fn plots_mut(&mut self) -> &mut TokenEngine {
        &mut self.plots
    }

    /// The active binding of a plot, if any.
    #[must_use]
    pub fn binding(&self, plot_id: U256) -> Option<&Binding> {
        self.bindings.get(&plot_id)
    }

    /// True while the gem is locked into a binding.
    #[must_use]
    pub fn is_gem_bound(&self, gem_id: U256) -> bool {
        self.bound_gems.contains(&gem_id)
    }

    /// Sets a special-gem rate override, micro-units. The multiplier is
    /// bounded by [`MAX_SPECIAL_MULTIPLIER`] so the resulting rate always
    /// fits the gem's 32-bit rate window.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_MINING_OPERATOR`; `InvalidArgument`
    /// for a zero or out-of-bounds multiplier.
    pub fn set_special_rate(
        &mut self,
        caller: Address,
        gem_id: U256,
        multiplier: u64,
    ) -> EngineResult<()> {
        self.require_operator(caller)?;
        if multiplier == 0 || multiplier > MAX_SPECIAL_MULTIPLIER {
            return Err(EngineError::InvalidArgument(format!(
                "special rate multiplier must be within 1..={MAX_SPECIAL_MULTIPLIER}"
            )));
        }
        self.special_rates.insert(gem_id, multiplier);
        Ok(())
    }

    /// Removes a special-gem override.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without `ROLE_MINING_OPERATOR`; `NotFound` when no
    /// override exists.
    pub fn clear_special_rate(&mut self, caller: Address, gem_id: U256) -> EngineResult<()> {
        self.require_operator(caller)?;
        if self.special_rates.remove(&gem_id).is_none() {
            return Err(EngineError::NotFound(format!(
                "gem {gem_id} carries no special rate"
            )));
        }
        Ok(())
    }

    /// Mints a plot token carrying the packed tier structure.
    ///
    /// # Errors
    ///
    /// Everything [`TokenEngine::mint`] rejects, under the plot registry's
    /// roles.
    pub fn mint_plot(
        &mut self,
        caller: Address,
        to: Address,
        id: U256,
        tiers: &TierStructure,
    ) -> EngineResult<()> {
        let word = tiers.to_word()?;
        self.plots.mint(caller, to, id, word)
    }

    // =========================================================================
    // State machine
    // =========================================================================

    /// Binds a gem to a plot and consumes the gem's resting energy.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: mining disabled, or the caller does not own both
    ///   tokens
    /// - `NotFound`: either token missing
    /// - `StateConflict`: either token already bound, or the plot offset
    ///   already reached the gem's reach
    pub fn bind(
        &mut self,
        caller: Address,
        plot_id: U256,
        gem_id: U256,
        entropy: &mut dyn EntropySource,
    ) -> EngineResult<()> {
        if !self.access.feature_enabled(RoleSet::FEATURE_MINING) {
            return Err(EngineError::Unauthorized("mining is disabled".into()));
        }
        if self.gems.owner_of(gem_id)? != caller {
            return Err(EngineError::Unauthorized(format!(
                "{caller} does not own gem {gem_id}"
            )));
        }
        if self.plots.owner_of(plot_id)? != caller {
            return Err(EngineError::Unauthorized(format!(
                "{caller} does not own plot {plot_id}"
            )));
        }
        if self.bindings.contains_key(&plot_id) {
            return Err(EngineError::StateConflict(format!(
                "plot {plot_id} is already being mined"
            )));
        }
        if self.bound_gems.contains(&gem_id) {
            return Err(EngineError::StateConflict(format!(
                "gem {gem_id} is already mining"
            )));
        }

        let word = self.plots.get_properties(plot_id)?;
        let tiers = TierStructure::from_word(word)?;
        let offset = read_offset(word)?;
        let level = self.gems.gem_level(gem_id)?;
        let mines_to = tiers.mines_to(level);
        if offset >= mines_to {
            return Err(EngineError::StateConflict(format!(
                "plot {plot_id} is already mined to this gem's reach ({mines_to})"
            )));
        }

        let now = self.clock.now();
        let rate = mining_rate(
            level,
            self.gems.gem_grade_type(gem_id)?,
            self.gems.gem_grade_value(gem_id)?,
            self.gems.gem_color(gem_id)?,
            now,
            self.special_rates.get(&gem_id).copied(),
        );
        let energy = u64::from(resting_energy(self.gems.energetic_age(gem_id)?));
        let instant = blocks_minable(energy, rate).min(u64::from(mines_to - offset));

        if instant >= 1 {
            // Resting energy alone mines whole blocks: advance now, give
            // the unused remainder back as age, and never lock.
            let new_offset = offset + instant as u8;
            self.generate_loot(caller, plot_id, &tiers, offset, new_offset, entropy)?;
            let (value, at, bits) = offset_window(new_offset);
            self.plots
                .write_properties(self.operator, plot_id, value, at, bits, RoleSet::ROLE_STATE_PROVIDER)?;
            let leftover = energy - seconds_for_blocks(instant, rate);
            self.gems
                .set_energetic_age(self.operator, gem_id, unused_energetic_age(leftover as u32) as u32)?;
            self.gems
                .set_last_mining_rate(self.operator, gem_id, rate as u32)?;
            tracing::info!(
                "gem {gem_id} instant-mined plot {plot_id}: {offset} -> {new_offset}"
            );
            return Ok(());
        }

        self.bindings.insert(
            plot_id,
            Binding {
                gem_id,
                bound_at: now,
                offset_at_bind: offset,
                mines_to,
                energy_credit: energy,
                rate,
            },
        );
        self.bound_gems.insert(gem_id);
        self.gems.set_state(self.operator, gem_id, STATE_MINING)?;
        self.plots.set_state(self.operator, plot_id, STATE_MINING)?;
        self.gems.set_energetic_age(self.operator, gem_id, 0)?;
        self.gems
            .set_last_mining_rate(self.operator, gem_id, rate as u32)?;
        tracing::info!("gem {gem_id} bound to plot {plot_id} at offset {offset}");
        Ok(())
    }

    /// Blocks the binding would commit right now, beyond the persisted
    /// offset.
    ///
    /// # Errors
    ///
    /// `StateConflict` when the plot is not bound or no progress is
    /// possible yet.
    pub fn evaluate(&self, plot_id: U256) -> EngineResult<u64> {
        let binding = self.bindings.get(&plot_id).ok_or_else(|| {
            EngineError::StateConflict(format!("plot {plot_id} is not bound"))
        })?;
        let offset = read_offset(self.plots.get_properties(plot_id)?)?;
        let mined = u64::from(offset - binding.offset_at_bind);
        let delta = binding.blocks_at(self.clock.now()).saturating_sub(mined);
        if delta == 0 {
            return Err(EngineError::StateConflict(format!(
                "plot {plot_id} has no progress to commit"
            )));
        }
        Ok(delta)
    }

    /// Commits evaluated progress: generates loot for the newly mined
    /// blocks and persists the advanced offset. Returns the blocks
    /// committed.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless the caller owns the plot or holds
    /// `ROLE_MINING_OPERATOR`; `StateConflict` when the offset would not
    /// change.
    pub fn update(
        &mut self,
        caller: Address,
        plot_id: U256,
        entropy: &mut dyn EntropySource,
    ) -> EngineResult<u64> {
        if self.plots.owner_of(plot_id)? != caller
            && !self.access.has_role(caller, RoleSet::ROLE_MINING_OPERATOR)
        {
            return Err(EngineError::Unauthorized(format!(
                "{caller} cannot update plot {plot_id}"
            )));
        }
        let delta = self.evaluate(plot_id)?;
        let word = self.plots.get_properties(plot_id)?;
        let tiers = TierStructure::from_word(word)?;
        let offset = read_offset(word)?;
        let new_offset = offset + delta as u8;
        let owner = self.plots.owner_of(plot_id)?;
        self.generate_loot(owner, plot_id, &tiers, offset, new_offset, entropy)?;
        let (value, at, bits) = offset_window(new_offset);
        self.plots
            .write_properties(self.operator, plot_id, value, at, bits, RoleSet::ROLE_STATE_PROVIDER)?;
        tracing::info!("plot {plot_id} advanced {offset} -> {new_offset}");
        Ok(delta)
    }

    /// Releases a finished binding, or any binding when the caller holds
    /// `ROLE_MINING_OPERATOR`. Unused energy credit flows back to the gem
    /// as energetic age.
    ///
    /// # Errors
    ///
    /// `StateConflict` when the plot is not bound or mining is still in
    /// progress; `Unauthorized` for a caller who neither owns the plot
    /// nor operates the engine.
    pub fn release(&mut self, caller: Address, plot_id: U256) -> EngineResult<()> {
        let Some(binding) = self.bindings.get(&plot_id).copied() else {
            return Err(EngineError::StateConflict(format!(
                "plot {plot_id} is not bound"
            )));
        };
        let is_operator = self.access.has_role(caller, RoleSet::ROLE_MINING_OPERATOR);
        if self.plots.owner_of(plot_id)? != caller && !is_operator {
            return Err(EngineError::Unauthorized(format!(
                "{caller} cannot release plot {plot_id}"
            )));
        }
        let offset = read_offset(self.plots.get_properties(plot_id)?)?;
        if offset < binding.mines_to && !is_operator {
            return Err(EngineError::StateConflict(format!(
                "plot {plot_id} is mined to {offset} of {}",
                binding.mines_to
            )));
        }

        // Unconsumed energy goes back to the gem as age. The refund is
        // capped at the original credit: elapsed overshoot past the last
        // block is not bankable.
        let elapsed = self.clock.now().saturating_sub(binding.bound_at);
        let consumed = seconds_for_blocks(u64::from(offset - binding.offset_at_bind), binding.rate);
        let leftover = (binding.energy_credit + elapsed)
            .saturating_sub(consumed)
            .min(binding.energy_credit);
        self.gems.set_energetic_age(
            self.operator,
            binding.gem_id,
            unused_energetic_age(leftover as u32) as u32,
        )?;

        self.gems.set_state(self.operator, binding.gem_id, 0)?;
        self.plots.set_state(self.operator, plot_id, 0)?;
        self.bound_gems.remove(&binding.gem_id);
        self.bindings.remove(&plot_id);
        tracing::info!("plot {plot_id} released at offset {offset}");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_operator(&self, caller: Address) -> EngineResult<()> {
        if self.access.has_role(caller, RoleSet::ROLE_MINING_OPERATOR) {
            Ok(())
        } else {
            Err(EngineError::Unauthorized(format!(
                "{caller} lacks the mining operator role"
            )))
        }
    }

    /// Rolls loot for blocks `[from, to)` and distributes it to `to_owner`.
    fn generate_loot(
        &mut self,
        to_owner: Address,
        plot_id: U256,
        tiers: &TierStructure,
        from: u8,
        to: u8,
        entropy: &mut dyn EntropySource,
    ) -> EngineResult<()> {
        let mut acc = [0u64; LOOT_BUCKETS];
        self.loot.tiers_loot(tiers, from, to, &mut acc, entropy)?;
        for level in 1..=5u8 {
            for _ in 0..acc[usize::from(level) - 1] {
                let id = U256::from(self.next_loot_gem);
                self.next_loot_gem += 1;
                let color = 1 + entropy.next_byte() % 12;
                let grade_value = u32::from(entropy.next_u16());
                let grade = (1 << gem::GRADE_TYPE_OFFSET) | grade_value;
                self.gems.mint_gem(self.operator, to_owner, id, color, level, grade)?;
            }
        }
        if acc[BUCKET_SILVER] > 0 {
            self.minters.silver.mint(to_owner, acc[BUCKET_SILVER])?;
        }
        if acc[BUCKET_GOLD] > 0 {
            self.minters.gold.mint(to_owner, acc[BUCKET_GOLD])?;
        }
        if acc[BUCKET_ARTIFACTS] > 0 {
            self.minters.artifacts.mint(to_owner, acc[BUCKET_ARTIFACTS])?;
        }
        if acc[BUCKET_KEYS] > 0 {
            self.minters.keys.mint(to_owner, acc[BUCKET_KEYS])?;
        }
        tracing::debug!("plot {plot_id}: loot for blocks [{from}, {to}) distributed");
        Ok(())
    }
}
