//! # Modifier Resolver
//!
//! Turns accumulated goodwill into the two scalars every reward path reads:
//!
//! ```text
//! exp_multiplier = 1 + goodwill / k_exp
//! luck_factor    = 1 + goodwill / k_luck      (k_luck > k_exp)
//! ```
//!
//! Luck grows slower per unit of goodwill than the experience multiplier.

use crate::error::{EconomyError, EconomyResult};

/// Goodwill per +1.0 of experience multiplier.
pub const DEFAULT_K_EXP: f64 = 1000.0;

/// Goodwill per +1.0 of luck factor.
pub const DEFAULT_K_LUCK: f64 = 2000.0;

/// Derived modifiers for one persona. Never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Modifiers {
    /// Multiplier applied to quest experience.
    pub exp_multiplier: f64,
    /// Luck factor biasing rolls toward higher tiers.
    pub luck_factor: f64,
}

impl Modifiers {
    /// Modifiers of a persona with no goodwill.
    pub const NEUTRAL: Self = Self {
        exp_multiplier: 1.0,
        luck_factor: 1.0,
    };
}

/// Tuning constants for goodwill -> modifier conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifierResolver {
    k_exp: f64,
    k_luck: f64,
}

impl ModifierResolver {
    /// Creates a validated resolver.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` unless both constants are
    /// finite, positive and `k_luck > k_exp`.
    pub fn new(k_exp: f64, k_luck: f64) -> EconomyResult<Self> {
        let positive = |k: f64| k.is_finite() && k > 0.0;
        if !positive(k_exp) || !positive(k_luck) {
            return Err(EconomyError::InvalidConfig(format!(
                "modifier constants must be positive (k_exp={k_exp}, k_luck={k_luck})"
            )));
        }
        if k_luck <= k_exp {
            return Err(EconomyError::InvalidConfig(format!(
                "k_luck ({k_luck}) must exceed k_exp ({k_exp})"
            )));
        }
        Ok(Self { k_exp, k_luck })
    }

    /// Resolves goodwill into modifiers.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` for negative or non-finite
    /// goodwill. Ledgers clamp goodwill at zero, so this only fires on
    /// caller bugs.
    pub fn resolve(&self, goodwill_value: f64) -> EconomyResult<Modifiers> {
        if !goodwill_value.is_finite() || goodwill_value < 0.0 {
            return Err(EconomyError::InvalidState(format!(
                "goodwill value {goodwill_value} must be finite and non-negative"
            )));
        }
        Ok(Modifiers {
            exp_multiplier: 1.0 + goodwill_value / self.k_exp,
            luck_factor: 1.0 + goodwill_value / self.k_luck,
        })
    }
}

impl Default for ModifierResolver {
    fn default() -> Self {
        Self {
            k_exp: DEFAULT_K_EXP,
            k_luck: DEFAULT_K_LUCK,
        }
    }
}
