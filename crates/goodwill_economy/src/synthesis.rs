//! # Synthesis Engine
//!
//! **Two Items In, One Item Out**
//!
//! ```text
//! base   = max(tier(a), tier(b))
//! chance = min(cap, base_chance + per_luck * (luck - 1))     cap < 1
//! target = min(MAX, base + 1) if roll < chance else base
//! output = uniform pick from the catalog's target tier
//! ```
//!
//! Inputs are consumed before the output is produced. Validation happens
//! up front, and the inventory is restored from a snapshot if anything
//! fails after consumption, so a failed synthesis never costs the owner an
//! item.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{Catalog, ItemId, RewardItem};
use crate::error::{EconomyError, EconomyResult};
use crate::inventory::Inventory;
use crate::rarity::{check_roll, RarityTable, RarityTier};
use crate::rng::RollSource;

/// Default upgrade chance at luck 1.0.
pub const DEFAULT_BASE_UPGRADE_CHANCE: f64 = 0.25;

/// Default upgrade chance gained per point of luck above 1.0.
pub const DEFAULT_UPGRADE_CHANCE_PER_LUCK: f64 = 0.05;

/// Default ceiling on the upgrade chance. Must stay below 1.
pub const DEFAULT_UPGRADE_CHANCE_CAP: f64 = 0.75;

/// Upgrade chance tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisRules {
    /// Upgrade chance at luck 1.0.
    pub base_upgrade_chance: f64,
    /// Upgrade chance gained per point of luck above 1.0.
    pub upgrade_chance_per_luck: f64,
    /// Ceiling on the upgrade chance (strictly below 1).
    pub upgrade_chance_cap: f64,
}

impl SynthesisRules {
    /// Checks the rules.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` unless
    /// `0 <= base <= cap < 1` and `per_luck >= 0`.
    pub fn validate(&self) -> EconomyResult<()> {
        let finite = self.base_upgrade_chance.is_finite()
            && self.upgrade_chance_per_luck.is_finite()
            && self.upgrade_chance_cap.is_finite();
        if !finite
            || self.base_upgrade_chance < 0.0
            || self.upgrade_chance_per_luck < 0.0
            || self.base_upgrade_chance > self.upgrade_chance_cap
            || self.upgrade_chance_cap >= 1.0
        {
            return Err(EconomyError::InvalidConfig(format!(
                "synthesis rules must satisfy 0 <= base <= cap < 1 and per_luck >= 0: {self:?}"
            )));
        }
        Ok(())
    }

    /// Upgrade chance at a luck factor. Never reaches 1.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` if `luck_factor` is below 1.0
    /// or not finite.
    pub fn upgrade_chance(&self, luck_factor: f64) -> EconomyResult<f64> {
        if !luck_factor.is_finite() || luck_factor < 1.0 {
            return Err(EconomyError::InvalidState(format!(
                "luck factor {luck_factor} must be a finite value >= 1"
            )));
        }
        let chance =
            self.base_upgrade_chance + self.upgrade_chance_per_luck * (luck_factor - 1.0);
        Ok(chance.min(self.upgrade_chance_cap))
    }
}

impl Default for SynthesisRules {
    fn default() -> Self {
        Self {
            base_upgrade_chance: DEFAULT_BASE_UPGRADE_CHANCE,
            upgrade_chance_per_luck: DEFAULT_UPGRADE_CHANCE_PER_LUCK,
            upgrade_chance_cap: DEFAULT_UPGRADE_CHANCE_CAP,
        }
    }
}

/// Result of a synthesis.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisOutcome {
    /// The two consumed items, in call order.
    pub consumed: [ItemId; 2],
    /// The produced item.
    pub item: Arc<RewardItem>,
    /// Higher tier of the two inputs.
    pub base_tier: RarityTier,
    /// Tier after the upgrade roll.
    pub target_tier: RarityTier,
    /// Upgrade chance that was applied.
    pub upgrade_chance: f64,
    /// Sum of the inputs' power weights.
    pub power_consumed: u32,
    /// Power weight of the output.
    pub power_produced: u32,
}

impl SynthesisOutcome {
    /// Returns true if the output tier exceeds both inputs.
    #[must_use]
    pub fn upgraded(&self) -> bool {
        self.target_tier > self.base_tier
    }
}

/// Combines owned items.
#[derive(Clone, Debug)]
pub struct SynthesisEngine {
    catalog: Arc<Catalog>,
    rarity: Arc<RarityTable>,
    rules: SynthesisRules,
}

impl SynthesisEngine {
    /// Creates a synthesis engine.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if the rules are invalid.
    pub fn new(
        catalog: Arc<Catalog>,
        rarity: Arc<RarityTable>,
        rules: SynthesisRules,
    ) -> EconomyResult<Self> {
        rules.validate()?;
        Ok(Self {
            catalog,
            rarity,
            rules,
        })
    }

    /// The active rules.
    #[must_use]
    pub const fn rules(&self) -> &SynthesisRules {
        &self.rules
    }

    /// Consumes `item_a` and `item_b` from `inventory` and adds one new item.
    ///
    /// # Errors
    ///
    /// - `EconomyError::SameItem` if `item_a == item_b`
    /// - `EconomyError::ItemNotOwned` if either input is missing
    /// - `EconomyError::InvalidState` for invalid luck or a roll outside
    ///   `[0, 1)`
    ///
    /// The inventory is unchanged on every error.
    pub fn synthesize<R: RollSource + ?Sized>(
        &self,
        inventory: &mut Inventory,
        item_a: ItemId,
        item_b: ItemId,
        luck_factor: f64,
        rolls: &mut R,
    ) -> EconomyResult<SynthesisOutcome> {
        if item_a == item_b {
            return Err(EconomyError::SameItem(item_a));
        }
        inventory.require(item_a)?;
        inventory.require(item_b)?;
        let tier_a = self.catalog.item(item_a)?.rarity;
        let tier_b = self.catalog.item(item_b)?.rarity;
        let upgrade_chance = self.rules.upgrade_chance(luck_factor)?;

        let power_consumed = self.rarity.power_for(tier_a) + self.rarity.power_for(tier_b);
        let snapshot = inventory.snapshot();
        let outcome = match self.transform(
            inventory,
            [item_a, item_b],
            tier_a.max(tier_b),
            upgrade_chance,
            power_consumed,
            rolls,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                inventory.restore(snapshot);
                return Err(err);
            }
        };

        tracing::debug!(
            owner_id = inventory.owner_id(),
            item_a,
            item_b,
            produced = outcome.item.id,
            tier = %outcome.target_tier,
            upgraded = outcome.upgraded(),
            "synthesis complete"
        );

        Ok(outcome)
    }

    /// Consume-then-produce. Caller restores the snapshot on error.
    fn transform<R: RollSource + ?Sized>(
        &self,
        inventory: &mut Inventory,
        consumed: [ItemId; 2],
        base_tier: RarityTier,
        upgrade_chance: f64,
        power_consumed: u32,
        rolls: &mut R,
    ) -> EconomyResult<SynthesisOutcome> {
        for item_id in consumed {
            inventory.remove(item_id)?;
        }

        let upgrade_roll = rolls.next_roll();
        check_roll(upgrade_roll)?;
        let target_tier = if upgrade_roll < upgrade_chance {
            base_tier.upgraded()
        } else {
            base_tier
        };
        let pick_roll = rolls.next_roll();
        check_roll(pick_roll)?;
        let item = Arc::clone(self.catalog.pick(target_tier, pick_roll)?);
        inventory.add(item.id)?;

        Ok(SynthesisOutcome {
            consumed,
            power_produced: self.rarity.power_for(item.rarity),
            item,
            base_tier,
            target_tier,
            upgrade_chance,
            power_consumed,
        })
    }
}
