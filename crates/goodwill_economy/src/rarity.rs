//! # Rarity Table
//!
//! **Luck-Adjusted Tier Resolution**
//!
//! Each tier owns a cumulative roll threshold. A uniform roll in `[0, 1)`
//! maps to the highest tier whose threshold it reaches, checked from
//! Legendary down to Common:
//!
//! ```text
//! 0.00          0.80        0.95   0.99  1.0
//!  |   Common    |   Rare    | Epic |Leg.|
//! ```
//!
//! Luck lowers every non-Common threshold by `luck_shift * (luck - 1)`.
//! The shift stops once the Rare threshold reaches `min_rare_threshold`,
//! which keeps Common reachable at any luck.
//!
//! If a shifted threshold would fall to or below the tier under it, that
//! threshold stays frozen at its base value, so ordering never inverts.
//! With shifts that do not grow from Rare to Legendary (the shipped data)
//! no tier is ever frozen and tier frequencies are monotonic in luck.

use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};

/// Smallest allowed gap between the Legendary threshold and 1.0.
pub const THRESHOLD_EPSILON: f64 = 1e-6;

/// Default lower bound for the luck-adjusted Rare threshold.
pub const DEFAULT_MIN_RARE_THRESHOLD: f64 = 0.5;

/// Rarity tier for reward items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RarityTier {
    /// Common items - ~80% of rolls at base luck
    Common = 0,
    /// Rare items - ~15% of rolls at base luck
    Rare = 1,
    /// Epic items - ~4% of rolls at base luck
    Epic = 2,
    /// Legendary items - ~1% of rolls at base luck
    Legendary = 3,
}

impl RarityTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 4] = [Self::Common, Self::Rare, Self::Epic, Self::Legendary];

    /// The highest tier synthesis can reach.
    pub const MAX: Self = Self::Legendary;

    /// Position of this tier in [`RarityTier::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts an index back to a tier.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Common),
            1 => Some(Self::Rare),
            2 => Some(Self::Epic),
            3 => Some(Self::Legendary),
            _ => None,
        }
    }

    /// The next tier up, saturating at [`RarityTier::MAX`].
    #[inline]
    #[must_use]
    pub const fn upgraded(self) -> Self {
        match Self::from_index(self.index() + 1) {
            Some(tier) => tier,
            None => Self::MAX,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Balance data for a single tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierSpec {
    /// Cumulative roll threshold at base luck.
    pub threshold: f64,
    /// Market sell price in Goodwill Coin.
    pub price: u64,
    /// Power weight reported by synthesis.
    pub power: u32,
    /// Threshold reduction per point of luck above 1.0.
    #[serde(default)]
    pub luck_shift: f64,
}

impl TierSpec {
    /// Creates a tier spec.
    #[must_use]
    pub const fn new(threshold: f64, price: u64, power: u32, luck_shift: f64) -> Self {
        Self {
            threshold,
            price,
            power,
            luck_shift,
        }
    }
}

/// Default tier balance, indexed by [`RarityTier::index`].
#[must_use]
pub fn default_tiers() -> [TierSpec; 4] {
    [
        TierSpec::new(0.0, 50, 1, 0.0),
        TierSpec::new(0.80, 200, 2, 0.02),
        TierSpec::new(0.95, 600, 4, 0.01),
        TierSpec::new(0.99, 2000, 8, 0.005),
    ]
}

/// Static tier definitions and the roll -> tier mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct RarityTable {
    /// Per-tier balance data.
    tiers: [TierSpec; 4],
    /// Luck above 1.0 beyond which thresholds stop moving.
    max_luck_excess: f64,
}

impl RarityTable {
    /// Creates a validated rarity table.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if the thresholds are not
    /// strictly increasing, Common does not start at 0, Legendary is not
    /// below `1 - THRESHOLD_EPSILON`, or a luck shift is negative.
    pub fn new(tiers: [TierSpec; 4], min_rare_threshold: f64) -> EconomyResult<Self> {
        let common = &tiers[RarityTier::Common.index()];
        if common.threshold != 0.0 || common.luck_shift != 0.0 {
            return Err(EconomyError::InvalidConfig(
                "common tier must have threshold 0 and no luck shift".to_string(),
            ));
        }

        for pair in RarityTier::ALL.windows(2) {
            let (lower, upper) = (&tiers[pair[0].index()], &tiers[pair[1].index()]);
            if upper.threshold.is_nan() || upper.threshold <= lower.threshold {
                return Err(EconomyError::InvalidConfig(format!(
                    "threshold of {} must exceed threshold of {}",
                    pair[1], pair[0]
                )));
            }
            if upper.luck_shift.is_nan() || upper.luck_shift < 0.0 {
                return Err(EconomyError::InvalidConfig(format!(
                    "luck shift of {} must be non-negative",
                    pair[1]
                )));
            }
        }

        let top = tiers[RarityTier::MAX.index()].threshold;
        if top.is_nan() || top >= 1.0 - THRESHOLD_EPSILON {
            return Err(EconomyError::InvalidConfig(format!(
                "legendary threshold {top} must be below 1.0"
            )));
        }

        let rare = &tiers[RarityTier::Rare.index()];
        if min_rare_threshold.is_nan()
            || min_rare_threshold <= 0.0
            || min_rare_threshold > rare.threshold
        {
            return Err(EconomyError::InvalidConfig(format!(
                "min rare threshold {min_rare_threshold} must be in (0, {}]",
                rare.threshold
            )));
        }

        let max_luck_excess = if rare.luck_shift > 0.0 {
            (rare.threshold - min_rare_threshold) / rare.luck_shift
        } else {
            f64::INFINITY
        };

        Ok(Self {
            tiers,
            max_luck_excess,
        })
    }

    /// Balance data for a tier.
    #[inline]
    #[must_use]
    pub fn spec(&self, tier: RarityTier) -> &TierSpec {
        &self.tiers[tier.index()]
    }

    /// Base (luck 1.0) threshold for a tier.
    #[inline]
    #[must_use]
    pub fn base_threshold(&self, tier: RarityTier) -> f64 {
        self.spec(tier).threshold
    }

    /// Market sell price for a tier.
    #[inline]
    #[must_use]
    pub fn price_for(&self, tier: RarityTier) -> u64 {
        self.spec(tier).price
    }

    /// Synthesis power weight for a tier.
    #[inline]
    #[must_use]
    pub fn power_for(&self, tier: RarityTier) -> u32 {
        self.spec(tier).power
    }

    /// Luck-adjusted thresholds, indexed by [`RarityTier::index`].
    ///
    /// A tier whose shifted threshold would not stay above the tier below
    /// keeps its base threshold.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` if `luck_factor` is below 1.0
    /// or not finite.
    pub fn effective_thresholds(&self, luck_factor: f64) -> EconomyResult<[f64; 4]> {
        if !luck_factor.is_finite() || luck_factor < 1.0 {
            return Err(EconomyError::InvalidState(format!(
                "luck factor {luck_factor} must be a finite value >= 1"
            )));
        }

        let excess = (luck_factor - 1.0).min(self.max_luck_excess);
        let mut thresholds = [0.0; 4];
        for tier in &RarityTier::ALL[1..] {
            let spec = self.spec(*tier);
            let below = thresholds[tier.index() - 1];
            let shifted = spec.threshold - spec.luck_shift * excess;
            thresholds[tier.index()] = if shifted > below {
                shifted
            } else {
                spec.threshold
            };
        }
        Ok(thresholds)
    }

    /// Resolves a roll to a tier.
    ///
    /// Tiers are checked from Legendary down; the first threshold the roll
    /// reaches wins.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` if `roll` is outside `[0, 1)` or
    /// `luck_factor` is below 1.0.
    pub fn tier_for(&self, roll: f64, luck_factor: f64) -> EconomyResult<RarityTier> {
        check_roll(roll)?;
        let thresholds = self.effective_thresholds(luck_factor)?;

        let tier = RarityTier::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| roll >= thresholds[tier.index()])
            .unwrap_or(RarityTier::Common);
        Ok(tier)
    }

    /// Exact per-tier probabilities at a luck factor (sums to 1).
    ///
    /// # Errors
    ///
    /// Same as [`RarityTable::effective_thresholds`].
    pub fn distribution(&self, luck_factor: f64) -> EconomyResult<[f64; 4]> {
        let thresholds = self.effective_thresholds(luck_factor)?;
        let mut odds = [0.0; 4];
        for tier in RarityTier::ALL {
            let upper = RarityTier::from_index(tier.index() + 1)
                .map_or(1.0, |next| thresholds[next.index()]);
            odds[tier.index()] = upper - thresholds[tier.index()];
        }
        Ok(odds)
    }
}

impl Default for RarityTable {
    fn default() -> Self {
        let tiers = default_tiers();
        let rare = &tiers[RarityTier::Rare.index()];
        let max_luck_excess = (rare.threshold - DEFAULT_MIN_RARE_THRESHOLD) / rare.luck_shift;
        Self {
            tiers,
            max_luck_excess,
        }
    }
}

/// Checks that a roll lies in `[0, 1)`.
pub(crate) fn check_roll(roll: f64) -> EconomyResult<()> {
    if (0.0..1.0).contains(&roll) {
        Ok(())
    } else {
        Err(EconomyError::InvalidState(format!(
            "roll {roll} is outside [0, 1)"
        )))
    }
}
