//! # Economy Configuration
//!
//! All balance data - tier thresholds and prices, modifier constants,
//! upgrade chances, item templates and pools - is loaded from TOML once at
//! startup. Every section is optional; missing values fall back to the
//! named defaults in each module.
//!
//! ```toml
//! [progression]
//! level_step = 100
//!
//! [modifiers]
//! k_exp = 1000.0
//! k_luck = 2000.0
//!
//! [rarity.rare]
//! threshold = 0.80
//! price = 200
//! power = 2
//! luck_shift = 0.02
//!
//! [[items]]
//! id = 1
//! title = "Solar Steward"
//! attribute = "environment"
//! rarity = "common"
//! stats = { impact = 3 }
//!
//! [[pools]]
//! id = 1
//! name = "Starter Pack"
//! price = 100
//! items = [1]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::{PoolSpec, RewardItem};
use crate::error::{EconomyError, EconomyResult};
use crate::inventory::DEFAULT_MAX_EQUIPPED;
use crate::modifiers::{DEFAULT_K_EXP, DEFAULT_K_LUCK};
use crate::progression::DEFAULT_LEVEL_STEP;
use crate::rarity::{default_tiers, TierSpec, DEFAULT_MIN_RARE_THRESHOLD};
use crate::synthesis::SynthesisRules;

/// Balance data shipped with the crate.
const BUILTIN_CONFIG: &str = include_str!("../data/economy.toml");

/// `[progression]` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Experience per level.
    pub level_step: u64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_step: DEFAULT_LEVEL_STEP,
        }
    }
}

/// `[modifiers]` section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierConfig {
    /// Goodwill per +1.0 of experience multiplier.
    pub k_exp: f64,
    /// Goodwill per +1.0 of luck factor.
    pub k_luck: f64,
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            k_exp: DEFAULT_K_EXP,
            k_luck: DEFAULT_K_LUCK,
        }
    }
}

/// `[rarity]` section with one sub-table per tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityConfig {
    /// Floor for the luck-adjusted Rare threshold.
    pub min_rare_threshold: f64,
    /// Common tier.
    pub common: TierSpec,
    /// Rare tier.
    pub rare: TierSpec,
    /// Epic tier.
    pub epic: TierSpec,
    /// Legendary tier.
    pub legendary: TierSpec,
}

impl RarityConfig {
    /// Tier specs indexed by [`crate::rarity::RarityTier::index`].
    #[must_use]
    pub fn tiers(&self) -> [TierSpec; 4] {
        [
            self.common.clone(),
            self.rare.clone(),
            self.epic.clone(),
            self.legendary.clone(),
        ]
    }
}

impl Default for RarityConfig {
    fn default() -> Self {
        let [common, rare, epic, legendary] = default_tiers();
        Self {
            min_rare_threshold: DEFAULT_MIN_RARE_THRESHOLD,
            common,
            rare,
            epic,
            legendary,
        }
    }
}

/// `[inventory]` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Number of equip slots.
    pub max_equipped: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_equipped: DEFAULT_MAX_EQUIPPED,
        }
    }
}

/// Complete economy configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Level pacing.
    pub progression: ProgressionConfig,
    /// Goodwill -> modifier constants.
    pub modifiers: ModifierConfig,
    /// Tier thresholds, prices and luck shifts.
    pub rarity: RarityConfig,
    /// Synthesis upgrade chances.
    pub synthesis: SynthesisRules,
    /// Equip slot limits.
    pub inventory: InventoryConfig,
    /// Item templates.
    pub items: Vec<RewardItem>,
    /// Pack pools.
    pub pools: Vec<PoolSpec>,
}

impl EconomyConfig {
    /// Parses a TOML document.
    ///
    /// Only syntax and types are checked here; semantic validation happens
    /// when the engine is built.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` on malformed TOML.
    pub fn from_toml_str(source: &str) -> EconomyResult<Self> {
        toml::from_str(source).map_err(|e| EconomyError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if the file cannot be read or
    /// parsed.
    pub fn from_path(path: impl AsRef<Path>) -> EconomyResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EconomyError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// The balance data shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if the embedded file is
    /// malformed.
    pub fn builtin() -> EconomyResult<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }
}
