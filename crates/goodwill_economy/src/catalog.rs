//! # Reward Catalog
//!
//! Read-only item templates and the pools packs are drawn from.
//! Loaded once at startup and shared behind `Arc` for the life of the
//! process; nothing here is mutated at runtime.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{EconomyError, EconomyResult};
use crate::rarity::RarityTier;
use crate::rng::pick_index;

/// Unique identifier for an item template.
pub type ItemId = u32;

/// Unique identifier for a pack pool.
pub type PoolId = u32;

/// An immutable reward template (card or soul).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    /// Unique identifier.
    pub id: ItemId,
    /// Display title.
    pub title: String,
    /// Attribute / category (e.g. "environment", "social").
    pub attribute: String,
    /// Rarity tier.
    pub rarity: RarityTier,
    /// Named stat bonuses.
    #[serde(default)]
    pub stats: BTreeMap<String, i32>,
}

/// Pool definition as it appears in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Unique identifier.
    pub id: PoolId,
    /// Display name.
    pub name: String,
    /// Goodwill Coin cost of one draw.
    #[serde(default)]
    pub price: u64,
    /// Item templates this pool can yield.
    pub items: Vec<ItemId>,
}

/// Item ids grouped by tier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct TierIndex {
    by_tier: [Vec<ItemId>; 4],
}

impl TierIndex {
    fn insert(&mut self, tier: RarityTier, item_id: ItemId) {
        self.by_tier[tier.index()].push(item_id);
    }

    fn items(&self, tier: RarityTier) -> &[ItemId] {
        &self.by_tier[tier.index()]
    }

    /// The requested tier, or the nearest non-empty tier below it.
    fn settle(&self, tier: RarityTier) -> Option<RarityTier> {
        RarityTier::ALL[..=tier.index()]
            .iter()
            .rev()
            .copied()
            .find(|t| !self.items(*t).is_empty())
    }

    /// Picks one item uniformly from the settled tier.
    fn pick(&self, tier: RarityTier, roll: f64) -> Option<ItemId> {
        let items = self.items(self.settle(tier)?);
        Some(items[pick_index(roll, items.len())])
    }
}

/// A pack pool with its items indexed by tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pool {
    id: PoolId,
    name: String,
    price: u64,
    index: TierIndex,
}

impl Pool {
    /// Pool identifier.
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Goodwill Coin cost of one draw.
    #[must_use]
    pub const fn price(&self) -> u64 {
        self.price
    }

    /// Items of exactly one tier in this pool.
    #[must_use]
    pub fn items_of(&self, tier: RarityTier) -> &[ItemId] {
        self.index.items(tier)
    }

    /// Tier actually drawn when `tier` is rolled (falls back downward).
    #[must_use]
    pub fn settle(&self, tier: RarityTier) -> RarityTier {
        self.index.settle(tier).unwrap_or(RarityTier::Common)
    }

    pub(crate) fn pick(&self, tier: RarityTier, roll: f64) -> Option<ItemId> {
        self.index.pick(tier, roll)
    }
}

/// All item templates and pools.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: HashMap<ItemId, Arc<RewardItem>>,
    pools: HashMap<PoolId, Pool>,
    index: TierIndex,
}

impl Catalog {
    /// Builds a validated catalog.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` on duplicate ids, pools that
    /// reference unknown items, or when the catalog or any pool has no
    /// Common item (fallback must always terminate).
    pub fn new(items: Vec<RewardItem>, pools: Vec<PoolSpec>) -> EconomyResult<Self> {
        let mut catalog = Self::default();

        for item in items {
            if catalog.items.contains_key(&item.id) {
                return Err(EconomyError::InvalidConfig(format!(
                    "item ID {} already exists",
                    item.id
                )));
            }
            catalog.index.insert(item.rarity, item.id);
            catalog.items.insert(item.id, Arc::new(item));
        }

        if catalog.index.items(RarityTier::Common).is_empty() {
            return Err(EconomyError::InvalidConfig(
                "catalog must contain at least one common item".to_string(),
            ));
        }

        for spec in pools {
            if catalog.pools.contains_key(&spec.id) {
                return Err(EconomyError::InvalidConfig(format!(
                    "pool ID {} already exists",
                    spec.id
                )));
            }

            let mut seen = HashSet::new();
            let mut index = TierIndex::default();
            for item_id in &spec.items {
                let item = catalog.items.get(item_id).ok_or_else(|| {
                    EconomyError::InvalidConfig(format!(
                        "pool {} references unknown item {item_id}",
                        spec.id
                    ))
                })?;
                if !seen.insert(*item_id) {
                    return Err(EconomyError::InvalidConfig(format!(
                        "pool {} lists item {item_id} twice",
                        spec.id
                    )));
                }
                index.insert(item.rarity, *item_id);
            }

            if index.items(RarityTier::Common).is_empty() {
                return Err(EconomyError::InvalidConfig(format!(
                    "pool {} must contain at least one common item",
                    spec.id
                )));
            }

            catalog.pools.insert(
                spec.id,
                Pool {
                    id: spec.id,
                    name: spec.name,
                    price: spec.price,
                    index,
                },
            );
        }

        Ok(catalog)
    }

    /// Looks up an item template.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::UnknownItem` if the id is not in the catalog.
    pub fn item(&self, item_id: ItemId) -> EconomyResult<&Arc<RewardItem>> {
        self.items
            .get(&item_id)
            .ok_or(EconomyError::UnknownItem(item_id))
    }

    /// Looks up a pool.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::UnknownPool` if the id is not in the catalog.
    pub fn pool(&self, pool_id: PoolId) -> EconomyResult<&Pool> {
        self.pools
            .get(&pool_id)
            .ok_or(EconomyError::UnknownPool(pool_id))
    }

    /// Number of item templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the catalog holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over pool ids.
    pub fn pool_ids(&self) -> impl Iterator<Item = PoolId> + '_ {
        self.pools.keys().copied()
    }

    /// Items of exactly one tier across the whole catalog.
    #[must_use]
    pub fn items_of(&self, tier: RarityTier) -> &[ItemId] {
        self.index.items(tier)
    }

    /// Picks one catalog-wide item of `tier` (or the nearest tier below).
    pub(crate) fn pick(&self, tier: RarityTier, roll: f64) -> EconomyResult<&Arc<RewardItem>> {
        let item_id = self.index.pick(tier, roll).ok_or_else(|| {
            EconomyError::InvalidState("catalog has no common items".to_string())
        })?;
        self.item(item_id)
    }
}
