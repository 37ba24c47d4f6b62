//! # Economy Engine
//!
//! **The public API the presentation layer calls.**
//!
//! Owns the shared, read-only balance data and an owner-keyed store of
//! accounts (inventory + progression + pending events).
//!
//! ## Locking
//!
//! ```text
//! accounts: RwLock<HashMap<OwnerId, Arc<Mutex<Account>>>>
//!              │                          │
//!              │ held to find an account, └─ held for the whole operation,
//!              │ or for a new owner's        serializes one owner's ops
//!              │ first operation
//!              ▼
//!        catalog / rarity / resolver: immutable, shared by every thread
//! ```
//!
//! Operations on different owners never wait on each other beyond the
//! brief map lookup, except while a new owner's first operation runs under
//! the map lock. Accounts are stored only once an operation on them
//! succeeds. Nothing blocks on I/O.
//!
//! ## Atomicity
//!
//! Every operation validates first and mutates last. Multi-step operations
//! (`purchase_pack`, `complete_quest`) stage progression changes on a copy
//! and commit only after every step succeeds.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{Catalog, ItemId, PoolId};
use crate::config::EconomyConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::inventory::{Inventory, InventorySlot};
use crate::market::{MarketExchange, Sale};
use crate::modifiers::{ModifierResolver, Modifiers};
use crate::progression::{LevelUp, ProgressionState};
use crate::rarity::{RarityTable, RarityTier};
use crate::roller::{PackOpening, RewardRoller};
use crate::rng::RollSource;
use crate::synthesis::{SynthesisEngine, SynthesisOutcome};

/// Owner / persona identifier.
pub type OwnerId = u64;

/// Something that changed, queued per owner for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum EconomyEvent {
    /// A pack was opened.
    PackOpened {
        /// Owner that opened it.
        owner_id: OwnerId,
        /// Source pool.
        pool_id: PoolId,
        /// Items drawn, in order.
        items: Vec<ItemId>,
    },
    /// An Epic or Legendary item was drawn (celebration effects).
    RarePull {
        /// Owner that drew it.
        owner_id: OwnerId,
        /// The item.
        item_id: ItemId,
        /// Its tier.
        tier: RarityTier,
    },
    /// Two items were synthesized into one.
    Synthesized {
        /// Owner.
        owner_id: OwnerId,
        /// Inputs.
        consumed: [ItemId; 2],
        /// Output.
        produced: ItemId,
        /// Whether the output tier beat both inputs.
        upgraded: bool,
    },
    /// An item was sold.
    Sold {
        /// Seller.
        owner_id: OwnerId,
        /// Item sold.
        item_id: ItemId,
        /// Goodwill Coin credited.
        price: u64,
    },
    /// A persona gained one or more levels.
    LevelUp(LevelUp),
    /// A quest reward was applied.
    QuestCompleted {
        /// Persona rewarded.
        persona_id: OwnerId,
        /// Experience granted after the multiplier.
        experience: u64,
        /// Goodwill added.
        goodwill: f64,
        /// Goodwill Coin credited.
        currency: u64,
    },
}

/// Base rewards for a completed quest.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuestReward {
    /// Experience before the experience multiplier.
    pub experience: u64,
    /// Goodwill to add.
    pub goodwill: f64,
    /// Goodwill Coin to credit.
    pub currency: u64,
}

/// What a quest reward actually did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuestOutcome {
    /// Experience granted (`floor(base * exp_multiplier)`).
    pub experience_granted: u64,
    /// Multiplier that was applied.
    pub exp_multiplier: f64,
    /// Level transition, if any.
    pub level_up: Option<LevelUp>,
    /// Goodwill after the reward.
    pub goodwill_value: f64,
    /// Balance after the reward.
    pub currency_balance: u64,
}

/// A paid pack.
#[derive(Clone, Debug, PartialEq)]
pub struct PackPurchase {
    /// Goodwill Coin debited.
    pub cost: u64,
    /// Balance after the debit.
    pub balance: u64,
    /// The opened pack.
    pub opening: PackOpening,
}

/// Read-only view of one account.
#[derive(Clone, Debug, PartialEq)]
pub struct AccountView {
    /// Owner.
    pub owner_id: OwnerId,
    /// Owned items in id order.
    pub owned: Vec<InventorySlot>,
    /// Equipped item ids in id order.
    pub equipped: Vec<ItemId>,
    /// Accumulated experience.
    pub experience: u64,
    /// Current level.
    pub level: u64,
    /// Accumulated goodwill.
    pub goodwill_value: f64,
    /// Goodwill Coin balance.
    pub currency_balance: u64,
    /// Current modifiers.
    pub modifiers: Modifiers,
}

/// One owner's mutable state.
#[derive(Clone, Debug)]
struct Account {
    inventory: Inventory,
    progression: ProgressionState,
    events: Vec<EconomyEvent>,
}

impl Account {
    fn new(owner_id: OwnerId, level_step: u64, max_equipped: usize) -> EconomyResult<Self> {
        Ok(Self {
            inventory: Inventory::new(owner_id, max_equipped),
            progression: ProgressionState::new(owner_id, level_step)?,
            events: Vec::new(),
        })
    }

    fn luck_factor(&self, resolver: &ModifierResolver) -> EconomyResult<f64> {
        Ok(self.progression.modifiers(resolver)?.luck_factor)
    }

    fn record_opening(&mut self, opening: &PackOpening) {
        let owner_id = self.inventory.owner_id();
        self.events.push(EconomyEvent::PackOpened {
            owner_id,
            pool_id: opening.pool_id,
            items: opening.items().map(|item| item.id).collect(),
        });
        for item in opening.items().filter(|item| item.rarity >= RarityTier::Epic) {
            self.events.push(EconomyEvent::RarePull {
                owner_id,
                item_id: item.id,
                tier: item.rarity,
            });
        }
    }

    fn view(&self, resolver: &ModifierResolver) -> EconomyResult<AccountView> {
        Ok(AccountView {
            owner_id: self.inventory.owner_id(),
            owned: self.inventory.list_owned(),
            equipped: self.inventory.list_equipped(),
            experience: self.progression.experience(),
            level: self.progression.level(),
            goodwill_value: self.progression.goodwill_value(),
            currency_balance: self.progression.currency_balance(),
            modifiers: self.progression.modifiers(resolver)?,
        })
    }
}

/// The progression and reward economy.
pub struct EconomyEngine {
    /// Item templates and pools.
    catalog: Arc<Catalog>,
    /// Tier thresholds and prices.
    rarity: Arc<RarityTable>,
    /// Goodwill -> modifiers.
    resolver: ModifierResolver,
    /// Pack opening.
    roller: RewardRoller,
    /// Item combination.
    synthesis: SynthesisEngine,
    /// Item liquidation.
    market: MarketExchange,
    /// Experience per level for new personas.
    level_step: u64,
    /// Equip slots for new inventories.
    max_equipped: usize,
    /// Accounts by owner ID.
    accounts: RwLock<HashMap<OwnerId, Arc<Mutex<Account>>>>,
}

impl EconomyEngine {
    /// Builds an engine from configuration, validating all of it.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if any section is invalid.
    pub fn new(config: EconomyConfig) -> EconomyResult<Self> {
        let rarity = Arc::new(RarityTable::new(
            config.rarity.tiers(),
            config.rarity.min_rare_threshold,
        )?);
        let resolver = ModifierResolver::new(config.modifiers.k_exp, config.modifiers.k_luck)?;
        let catalog = Arc::new(Catalog::new(config.items, config.pools)?);
        let synthesis =
            SynthesisEngine::new(Arc::clone(&catalog), Arc::clone(&rarity), config.synthesis)?;

        if config.progression.level_step == 0 {
            return Err(EconomyError::InvalidConfig(
                "level step must be positive".to_string(),
            ));
        }
        if config.inventory.max_equipped == 0 {
            return Err(EconomyError::InvalidConfig(
                "at least one equip slot is required".to_string(),
            ));
        }

        tracing::debug!(
            items = catalog.len(),
            pools = catalog.pool_ids().count(),
            "economy engine initialized"
        );

        Ok(Self {
            roller: RewardRoller::new(Arc::clone(&catalog), Arc::clone(&rarity)),
            market: MarketExchange::new(Arc::clone(&catalog), Arc::clone(&rarity)),
            synthesis,
            catalog,
            rarity,
            resolver,
            level_step: config.progression.level_step,
            max_equipped: config.inventory.max_equipped,
            accounts: RwLock::new(HashMap::new()),
        })
    }

    /// Builds an engine from the balance data shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if the embedded data is invalid.
    pub fn builtin() -> EconomyResult<Self> {
        Self::new(EconomyConfig::builtin()?)
    }

    /// The item catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The rarity table.
    #[must_use]
    pub fn rarity(&self) -> &RarityTable {
        &self.rarity
    }

    /// The modifier resolver.
    #[must_use]
    pub const fn resolver(&self) -> &ModifierResolver {
        &self.resolver
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Creates an account. Returns false if it already existed.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if account defaults are invalid.
    pub fn register(&self, owner_id: OwnerId) -> EconomyResult<bool> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&owner_id) {
            return Ok(false);
        }
        let account = Account::new(owner_id, self.level_step, self.max_equipped)?;
        accounts.insert(owner_id, Arc::new(Mutex::new(account)));
        Ok(true)
    }

    /// Number of accounts.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.accounts.read().len()
    }

    /// Read-only view of an account, if it exists.
    ///
    /// # Errors
    ///
    /// Propagates `EconomyError::InvalidState` from the resolver.
    pub fn view(&self, owner_id: OwnerId) -> EconomyResult<Option<AccountView>> {
        self.read_account(owner_id, |account| account.view(&self.resolver))
            .transpose()
    }

    /// Drains pending events for one owner, oldest first.
    pub fn drain_events(&self, owner_id: OwnerId) -> Vec<EconomyEvent> {
        let Some(account) = self.existing(owner_id) else {
            return Vec::new();
        };
        let mut account = account.lock();
        std::mem::take(&mut account.events)
    }

    // ========================================================================
    // Reward Roller
    // ========================================================================

    /// Opens a pack without charging for it.
    ///
    /// Callers charging for packs must debit first; prefer
    /// [`EconomyEngine::purchase_pack`], which does both under one lock.
    ///
    /// # Errors
    ///
    /// See [`RewardRoller::open_pack`]. The inventory is unchanged on error.
    pub fn open_pack<R: RollSource + ?Sized>(
        &self,
        owner_id: OwnerId,
        pool_id: PoolId,
        count: u32,
        rolls: &mut R,
    ) -> EconomyResult<PackOpening> {
        self.with_account(owner_id, |account| {
            let luck = account.luck_factor(&self.resolver)?;
            let opening =
                self.roller
                    .open_pack(&mut account.inventory, pool_id, count, luck, rolls)?;
            account.record_opening(&opening);
            Ok(opening)
        })
    }

    /// Debits `price * count` and opens the pack.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InsufficientBalance` before any roll if the
    /// owner cannot pay. If the roll fails nothing is debited.
    pub fn purchase_pack<R: RollSource + ?Sized>(
        &self,
        owner_id: OwnerId,
        pool_id: PoolId,
        count: u32,
        rolls: &mut R,
    ) -> EconomyResult<PackPurchase> {
        self.with_account(owner_id, |account| {
            let cost = self
                .catalog
                .pool(pool_id)?
                .price()
                .checked_mul(u64::from(count))
                .ok_or(EconomyError::ArithmeticOverflow)?;
            let luck = account.luck_factor(&self.resolver)?;

            let mut progression = account.progression.clone();
            let balance = progression.debit_currency(cost)?;
            let opening =
                self.roller
                    .open_pack(&mut account.inventory, pool_id, count, luck, rolls)?;
            account.progression = progression;

            account.record_opening(&opening);
            Ok(PackPurchase {
                cost,
                balance,
                opening,
            })
        })
    }

    // ========================================================================
    // Synthesis & Market
    // ========================================================================

    /// Combines two owned items into one.
    ///
    /// # Errors
    ///
    /// `SameItem`, `ItemNotOwned` or `InvalidState`; nothing changes on
    /// error.
    pub fn synthesize<R: RollSource + ?Sized>(
        &self,
        owner_id: OwnerId,
        item_a: ItemId,
        item_b: ItemId,
        rolls: &mut R,
    ) -> EconomyResult<SynthesisOutcome> {
        if item_a == item_b {
            return Err(EconomyError::SameItem(item_a));
        }
        self.with_existing(owner_id, item_a, |account| {
            let luck = account.luck_factor(&self.resolver)?;
            let outcome =
                self.synthesis
                    .synthesize(&mut account.inventory, item_a, item_b, luck, rolls)?;
            account.events.push(EconomyEvent::Synthesized {
                owner_id,
                consumed: outcome.consumed,
                produced: outcome.item.id,
                upgraded: outcome.upgraded(),
            });
            Ok(outcome)
        })
    }

    /// Sells one owned item at its tier price.
    ///
    /// # Errors
    ///
    /// `ItemNotOwned` if absent; nothing changes on error.
    pub fn sell(&self, owner_id: OwnerId, item_id: ItemId) -> EconomyResult<Sale> {
        self.with_existing(owner_id, item_id, |account| {
            let Account {
                inventory,
                progression,
                events,
            } = account;
            let sale = self.market.sell(inventory, progression, item_id)?;
            events.push(EconomyEvent::Sold {
                owner_id,
                item_id,
                price: sale.price,
            });
            Ok(sale)
        })
    }

    /// Sell price of an item.
    ///
    /// # Errors
    ///
    /// `UnknownItem` if the item is not in the catalog.
    pub fn quote(&self, item_id: ItemId) -> EconomyResult<u64> {
        self.market.quote(item_id)
    }

    // ========================================================================
    // Inventory Ledger
    // ========================================================================

    /// Grants one copy of a catalog item. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// `UnknownItem` if the item is not in the catalog.
    pub fn add_item(&self, owner_id: OwnerId, item_id: ItemId) -> EconomyResult<u32> {
        self.catalog.item(item_id)?;
        self.with_account(owner_id, |account| account.inventory.add(item_id))
    }

    /// Removes one copy of an item. Returns the remaining quantity.
    ///
    /// # Errors
    ///
    /// `ItemNotOwned` if absent.
    pub fn remove_item(&self, owner_id: OwnerId, item_id: ItemId) -> EconomyResult<u32> {
        self.with_existing(owner_id, item_id, |account| account.inventory.remove(item_id))
    }

    /// Equips an owned item.
    ///
    /// # Errors
    ///
    /// `ItemNotOwned` if absent, `EquipSlotsFull` if no slot is free.
    pub fn equip(&self, owner_id: OwnerId, item_id: ItemId) -> EconomyResult<()> {
        self.with_existing(owner_id, item_id, |account| account.inventory.equip(item_id))
    }

    /// Unequips an item. Returns true if it was equipped.
    pub fn unequip(&self, owner_id: OwnerId, item_id: ItemId) -> bool {
        self.with_existing(owner_id, item_id, |account| {
            Ok(account.inventory.unequip(item_id))
        })
        .unwrap_or(false)
    }

    /// Owned items (empty for unknown owners).
    #[must_use]
    pub fn list_owned(&self, owner_id: OwnerId) -> Vec<InventorySlot> {
        self.read_account(owner_id, |account| account.inventory.list_owned())
            .unwrap_or_default()
    }

    /// Equipped item ids (empty for unknown owners).
    #[must_use]
    pub fn list_equipped(&self, owner_id: OwnerId) -> Vec<ItemId> {
        self.read_account(owner_id, |account| account.inventory.list_equipped())
            .unwrap_or_default()
    }

    // ========================================================================
    // Progression Ledger
    // ========================================================================

    /// Current modifiers (neutral for unknown personas).
    ///
    /// # Errors
    ///
    /// Propagates `EconomyError::InvalidState` from the resolver.
    pub fn modifiers(&self, persona_id: OwnerId) -> EconomyResult<Modifiers> {
        self.read_account(persona_id, |account| {
            account.progression.modifiers(&self.resolver)
        })
        .unwrap_or_else(|| self.resolver.resolve(0.0))
    }

    /// Adds experience.
    ///
    /// # Errors
    ///
    /// `InvalidState` for zero, `ArithmeticOverflow` on overflow.
    pub fn grant_experience(
        &self,
        persona_id: OwnerId,
        amount: u64,
    ) -> EconomyResult<Option<LevelUp>> {
        self.with_account(persona_id, |account| {
            let level_up = account.progression.grant_experience(amount)?;
            if let Some(up) = level_up {
                tracing::debug!(persona_id, from = up.from, to = up.to, "level up");
                account.events.push(EconomyEvent::LevelUp(up));
            }
            Ok(level_up)
        })
    }

    /// Adds goodwill (clamped at zero). Returns the new value.
    ///
    /// # Errors
    ///
    /// `InvalidState` only for a non-finite delta.
    pub fn adjust_goodwill(&self, persona_id: OwnerId, delta: f64) -> EconomyResult<f64> {
        self.with_account(persona_id, |account| account.progression.adjust_goodwill(delta))
    }

    /// Debits Goodwill Coin. Returns the new balance.
    ///
    /// # Errors
    ///
    /// `InsufficientBalance` if `amount` exceeds the balance.
    pub fn debit_currency(&self, persona_id: OwnerId, amount: u64) -> EconomyResult<u64> {
        self.with_account(persona_id, |account| account.progression.debit_currency(amount))
    }

    /// Credits Goodwill Coin. Returns the new balance.
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if the balance would overflow.
    pub fn credit_currency(&self, persona_id: OwnerId, amount: u64) -> EconomyResult<u64> {
        self.with_account(persona_id, |account| account.progression.credit_currency(amount))
    }

    /// Applies a quest reward.
    ///
    /// Experience is scaled by the multiplier in effect *before* the
    /// reward's goodwill is added.
    ///
    /// # Errors
    ///
    /// `InvalidState` for a non-finite goodwill reward, `ArithmeticOverflow`
    /// on overflow. Nothing is applied on error.
    pub fn complete_quest(
        &self,
        persona_id: OwnerId,
        reward: QuestReward,
    ) -> EconomyResult<QuestOutcome> {
        self.with_account(persona_id, |account| {
            let exp_multiplier = account.progression.modifiers(&self.resolver)?.exp_multiplier;
            let experience_granted = scale_experience(reward.experience, exp_multiplier);

            let mut progression = account.progression.clone();
            let level_up = if experience_granted > 0 {
                progression.grant_experience(experience_granted)?
            } else {
                None
            };
            let goodwill_value = progression.adjust_goodwill(reward.goodwill)?;
            let currency_balance = progression.credit_currency(reward.currency)?;
            account.progression = progression;

            account.events.push(EconomyEvent::QuestCompleted {
                persona_id,
                experience: experience_granted,
                goodwill: reward.goodwill,
                currency: reward.currency,
            });
            if let Some(up) = level_up {
                account.events.push(EconomyEvent::LevelUp(up));
            }
            tracing::debug!(persona_id, experience_granted, goodwill_value, "quest completed");

            Ok(QuestOutcome {
                experience_granted,
                exp_multiplier,
                level_up,
                goodwill_value,
                currency_balance,
            })
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn existing(&self, owner_id: OwnerId) -> Option<Arc<Mutex<Account>>> {
        self.accounts.read().get(&owner_id).cloned()
    }

    /// Runs `op` with the owner's account locked.
    ///
    /// An unknown owner gets a fresh account that `op` runs against while
    /// the map is write-locked; it is stored only if `op` succeeds, so a
    /// failed call never leaves an empty account behind.
    fn with_account<T>(
        &self,
        owner_id: OwnerId,
        op: impl FnOnce(&mut Account) -> EconomyResult<T>,
    ) -> EconomyResult<T> {
        if let Some(account) = self.existing(owner_id) {
            let mut guard = account.lock();
            return op(&mut guard);
        }

        let mut accounts = self.accounts.write();
        if let Some(account) = accounts.get(&owner_id).cloned() {
            drop(accounts);
            let mut guard = account.lock();
            return op(&mut guard);
        }

        let mut account = Account::new(owner_id, self.level_step, self.max_equipped)?;
        let value = op(&mut account)?;
        accounts.insert(owner_id, Arc::new(Mutex::new(account)));
        Ok(value)
    }

    /// Like `with_account`, but an unknown owner cannot own `item_id`.
    fn with_existing<T>(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        op: impl FnOnce(&mut Account) -> EconomyResult<T>,
    ) -> EconomyResult<T> {
        let account = self
            .existing(owner_id)
            .ok_or(EconomyError::ItemNotOwned { owner_id, item_id })?;
        let mut guard = account.lock();
        op(&mut guard)
    }

    fn read_account<T>(&self, owner_id: OwnerId, op: impl FnOnce(&Account) -> T) -> Option<T> {
        let account = self.existing(owner_id)?;
        let guard = account.lock();
        Some(op(&guard))
    }
}

impl std::fmt::Debug for EconomyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EconomyEngine")
            .field("items", &self.catalog.len())
            .field("owners", &self.owner_count())
            .finish_non_exhaustive()
    }
}

/// `floor(base * multiplier)`, saturating at `u64::MAX`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scale_experience(base: u64, multiplier: f64) -> u64 {
    (base as f64 * multiplier).floor() as u64
}
