//! # Goodwill Economy
//!
//! Progression and reward economy behind the Goodwill dashboard.
//!
//! Goodwill earned through real-world actions turns into in-game power:
//!
//! ```text
//! goodwill ─► ModifierResolver ─► exp multiplier ─► ProgressionState (levels)
//!                               └► luck factor ───► RarityTable thresholds
//!                                                     │
//!                      RewardRoller (packs) ◄─────────┤
//!                      SynthesisEngine (2 -> 1) ◄─────┘
//!                               │
//!                               ▼
//!                           Inventory ─► MarketExchange ─► Goodwill Coin
//! ```
//!
//! ## Design Principles
//!
//! 1. **Injected randomness** - every roll comes from a [`RollSource`]; seed it
//!    and the whole run replays
//! 2. **Transactional operations** - validate, then mutate; failures leave
//!    every ledger untouched
//! 3. **External configuration** - all balance data lives in TOML
//! 4. **Integer currency** - Goodwill Coin is a `u64`; only goodwill and the
//!    modifiers derived from it are floating point
//!
//! ## Thread Safety
//!
//! [`EconomyEngine`] is `Send + Sync`. Each owner's account sits behind its
//! own lock, so different owners proceed in parallel and one owner's
//! operations are serialized.
//!
//! ## Example
//!
//! ```rust,ignore
//! use goodwill_economy::{EconomyEngine, SeededRolls};
//!
//! let engine = EconomyEngine::builtin()?;
//! let mut rolls = SeededRolls::new(42);
//!
//! engine.credit_currency(player, 500)?;
//! let purchase = engine.purchase_pack(player, 1, 5, &mut rolls)?;
//! let sale = engine.sell(player, purchase.opening.draws[0].item.id)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod market;
pub mod modifiers;
pub mod progression;
pub mod rarity;
pub mod rng;
pub mod roller;
pub mod synthesis;

pub use catalog::{Catalog, ItemId, Pool, PoolId, PoolSpec, RewardItem};
pub use config::EconomyConfig;
pub use engine::{
    AccountView, EconomyEngine, EconomyEvent, OwnerId, PackPurchase, QuestOutcome, QuestReward,
};
pub use error::{EconomyError, EconomyResult};
pub use inventory::{Inventory, InventorySlot};
pub use market::{MarketExchange, Sale};
pub use modifiers::{ModifierResolver, Modifiers};
pub use progression::{LevelUp, ProgressionState};
pub use rarity::{RarityTable, RarityTier, TierSpec};
pub use rng::{FixedRolls, RollSource, SeededRolls};
pub use roller::{Draw, PackOpening, RewardRoller};
pub use synthesis::{SynthesisEngine, SynthesisOutcome, SynthesisRules};
