//! # Reward Roller
//!
//! **Pack Opening**
//!
//! Each draw consumes two rolls:
//!
//! ```text
//! roll #1 -> RarityTable::tier_for(roll, luck) -> rolled tier
//!            pool falls back to the nearest non-empty tier below
//! roll #2 -> uniform pick inside that tier
//! ```
//!
//! All draws are resolved before the inventory is touched, and the inventory
//! is rolled back if any insert fails, so a pack either lands in full or not
//! at all. Charging for the pack is the caller's job and must happen first
//! (see [`crate::engine::EconomyEngine::purchase_pack`]).

use std::sync::Arc;

use crate::catalog::{Catalog, PoolId, RewardItem};
use crate::error::{EconomyError, EconomyResult};
use crate::inventory::Inventory;
use crate::rarity::{check_roll, RarityTable, RarityTier};
use crate::rng::RollSource;

/// One drawn reward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draw {
    /// The item granted.
    pub item: Arc<RewardItem>,
    /// Tier the roll landed on before pool fallback.
    pub rolled_tier: RarityTier,
}

/// Result of opening a pack.
#[derive(Clone, Debug, PartialEq)]
pub struct PackOpening {
    /// Pool the pack was drawn from.
    pub pool_id: PoolId,
    /// Luck factor applied to every draw.
    pub luck_factor: f64,
    /// Draws in order.
    pub draws: Vec<Draw>,
}

impl PackOpening {
    /// Drawn items in order.
    pub fn items(&self) -> impl Iterator<Item = &RewardItem> + '_ {
        self.draws.iter().map(|d| d.item.as_ref())
    }

    /// Number of draws at each tier, indexed by [`RarityTier::index`].
    #[must_use]
    pub fn tier_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for draw in &self.draws {
            counts[draw.item.rarity.index()] += 1;
        }
        counts
    }
}

/// Draws rewards from catalog pools.
#[derive(Clone, Debug)]
pub struct RewardRoller {
    catalog: Arc<Catalog>,
    rarity: Arc<RarityTable>,
}

impl RewardRoller {
    /// Creates a roller over shared catalog data.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, rarity: Arc<RarityTable>) -> Self {
        Self { catalog, rarity }
    }

    /// Resolves `count` draws without touching any inventory.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` for a zero count, invalid
    /// luck or a roll outside `[0, 1)`, and `EconomyError::UnknownPool` for an unknown pool.
    pub fn draw<R: RollSource + ?Sized>(
        &self,
        pool_id: PoolId,
        count: u32,
        luck_factor: f64,
        rolls: &mut R,
    ) -> EconomyResult<Vec<Draw>> {
        if count == 0 {
            return Err(EconomyError::InvalidState(
                "pack must contain at least one draw".to_string(),
            ));
        }
        let pool = self.catalog.pool(pool_id)?;

        let mut draws = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let roll = rolls.next_roll();
            let rolled_tier = self.rarity.tier_for(roll, luck_factor)?;
            let pick_roll = rolls.next_roll();
            check_roll(pick_roll)?;
            let item_id = pool.pick(rolled_tier, pick_roll).ok_or_else(|| {
                EconomyError::InvalidState(format!("pool {pool_id} has no common items"))
            })?;
            tracing::trace!(pool_id, roll, tier = %rolled_tier, item_id, "pack draw");
            draws.push(Draw {
                item: Arc::clone(self.catalog.item(item_id)?),
                rolled_tier,
            });
        }
        Ok(draws)
    }

    /// Opens a pack into `inventory`.
    ///
    /// # Errors
    ///
    /// Any error from [`RewardRoller::draw`], or
    /// `EconomyError::ArithmeticOverflow` if a stack count overflows. On
    /// error the inventory is unchanged.
    pub fn open_pack<R: RollSource + ?Sized>(
        &self,
        inventory: &mut Inventory,
        pool_id: PoolId,
        count: u32,
        luck_factor: f64,
        rolls: &mut R,
    ) -> EconomyResult<PackOpening> {
        let draws = self.draw(pool_id, count, luck_factor, rolls)?;

        let snapshot = inventory.snapshot();
        for draw in &draws {
            if let Err(err) = inventory.add(draw.item.id) {
                inventory.restore(snapshot);
                return Err(err);
            }
        }

        tracing::debug!(
            owner_id = inventory.owner_id(),
            pool_id,
            count,
            luck_factor,
            "pack opened"
        );

        Ok(PackOpening {
            pool_id,
            luck_factor,
            draws,
        })
    }
}
