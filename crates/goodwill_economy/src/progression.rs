//! # Progression Ledger
//!
//! Experience, level, goodwill and Goodwill Coin balance for one persona.
//!
//! - `level = experience / level_step + 1`, so it never decreases.
//! - Goodwill is clamped at zero; it drives [`crate::modifiers`].
//! - The currency balance is unsigned and debits never overdraw it.
//!
//! Level transitions are reported, not acted on. Badges and unlocks belong
//! to the caller.

use crate::engine::OwnerId;
use crate::error::{EconomyError, EconomyResult};
use crate::modifiers::{ModifierResolver, Modifiers};

/// Experience per level.
pub const DEFAULT_LEVEL_STEP: u64 = 100;

/// A level transition produced by [`ProgressionState::grant_experience`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelUp {
    /// Persona that levelled.
    pub persona_id: OwnerId,
    /// Level before the grant.
    pub from: u64,
    /// Level after the grant.
    pub to: u64,
}

/// Per-persona progression.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressionState {
    persona_id: OwnerId,
    experience: u64,
    goodwill_value: f64,
    currency_balance: u64,
    level_step: u64,
}

impl ProgressionState {
    /// Creates a fresh persona at level 1 with nothing accumulated.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if `level_step` is zero.
    pub fn new(persona_id: OwnerId, level_step: u64) -> EconomyResult<Self> {
        if level_step == 0 {
            return Err(EconomyError::InvalidConfig(
                "level step must be positive".to_string(),
            ));
        }
        Ok(Self {
            persona_id,
            experience: 0,
            goodwill_value: 0.0,
            currency_balance: 0,
            level_step,
        })
    }

    /// Persona identifier.
    #[inline]
    #[must_use]
    pub const fn persona_id(&self) -> OwnerId {
        self.persona_id
    }

    /// Accumulated experience.
    #[inline]
    #[must_use]
    pub const fn experience(&self) -> u64 {
        self.experience
    }

    /// Current level (starts at 1).
    #[inline]
    #[must_use]
    pub const fn level(&self) -> u64 {
        level_for(self.experience, self.level_step)
    }

    /// Experience still needed to reach the next level.
    #[must_use]
    pub const fn experience_to_next_level(&self) -> u64 {
        self.level_step - self.experience % self.level_step
    }

    /// Accumulated goodwill (never negative).
    #[inline]
    #[must_use]
    pub const fn goodwill_value(&self) -> f64 {
        self.goodwill_value
    }

    /// Spendable Goodwill Coin.
    #[inline]
    #[must_use]
    pub const fn currency_balance(&self) -> u64 {
        self.currency_balance
    }

    /// Current modifiers derived from goodwill.
    ///
    /// # Errors
    ///
    /// Propagates `EconomyError::InvalidState` from the resolver.
    pub fn modifiers(&self, resolver: &ModifierResolver) -> EconomyResult<Modifiers> {
        resolver.resolve(self.goodwill_value)
    }

    /// Adds experience and reports a level transition, if any.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` for a zero amount and
    /// `EconomyError::ArithmeticOverflow` if experience would overflow.
    pub fn grant_experience(&mut self, amount: u64) -> EconomyResult<Option<LevelUp>> {
        if amount == 0 {
            return Err(EconomyError::InvalidState(
                "experience grant must be positive".to_string(),
            ));
        }
        let experience = self
            .experience
            .checked_add(amount)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        let from = self.level();
        self.experience = experience;
        let to = self.level();

        Ok((to > from).then_some(LevelUp {
            persona_id: self.persona_id,
            from,
            to,
        }))
    }

    /// Adds `delta` to goodwill, clamping the result at zero.
    /// Returns the new goodwill value.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` only for a non-finite delta;
    /// negative deltas never fail.
    pub fn adjust_goodwill(&mut self, delta: f64) -> EconomyResult<f64> {
        if !delta.is_finite() {
            return Err(EconomyError::InvalidState(format!(
                "goodwill delta {delta} must be finite"
            )));
        }
        let next = (self.goodwill_value + delta).max(0.0);
        if !next.is_finite() {
            return Err(EconomyError::ArithmeticOverflow);
        }
        self.goodwill_value = next;
        Ok(next)
    }

    /// Removes Goodwill Coin. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InsufficientBalance` if `amount` exceeds the
    /// balance; nothing is debited in that case.
    pub fn debit_currency(&mut self, amount: u64) -> EconomyResult<u64> {
        let balance = self
            .currency_balance
            .checked_sub(amount)
            .ok_or(EconomyError::InsufficientBalance {
                required: amount,
                available: self.currency_balance,
            })?;
        self.currency_balance = balance;
        Ok(balance)
    }

    /// Adds Goodwill Coin. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ArithmeticOverflow` if the balance would
    /// overflow.
    pub fn credit_currency(&mut self, amount: u64) -> EconomyResult<u64> {
        let balance = self
            .currency_balance
            .checked_add(amount)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        self.currency_balance = balance;
        Ok(balance)
    }
}

/// Level for an experience total.
#[inline]
#[must_use]
pub const fn level_for(experience: u64, level_step: u64) -> u64 {
    experience / level_step + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> ProgressionState {
        ProgressionState::new(1, DEFAULT_LEVEL_STEP).unwrap()
    }

    #[test]
    fn test_new_persona_is_level_one() {
        let p = persona();
        assert_eq!(p.level(), 1);
        assert_eq!(p.experience_to_next_level(), 100);
        assert_eq!(p.currency_balance(), 0);
    }

    #[test]
    fn test_level_formula() {
        assert_eq!(level_for(0, 100), 1);
        assert_eq!(level_for(99, 100), 1);
        assert_eq!(level_for(100, 100), 2);
        assert_eq!(level_for(1050, 100), 11);
    }

    #[test]
    fn test_grant_experience_reports_level_up() {
        let mut p = persona();
        assert_eq!(p.grant_experience(60).unwrap(), None);
        let up = p.grant_experience(250).unwrap().unwrap();
        assert_eq!(up, LevelUp { persona_id: 1, from: 1, to: 4 });
        assert_eq!(p.experience(), 310);
    }

    #[test]
    fn test_grant_zero_experience_is_invalid() {
        let mut p = persona();
        assert!(matches!(p.grant_experience(0), Err(EconomyError::InvalidState(_))));
    }

    #[test]
    fn test_experience_overflow_leaves_state() {
        let mut p = persona();
        p.grant_experience(u64::MAX - 1).unwrap();
        let before = p.clone();
        assert_eq!(p.grant_experience(5), Err(EconomyError::ArithmeticOverflow));
        assert_eq!(p, before);
    }

    #[test]
    fn test_goodwill_clamps_at_zero() {
        let mut p = persona();
        assert!((p.adjust_goodwill(150.0).unwrap() - 150.0).abs() < f64::EPSILON);
        assert!(p.adjust_goodwill(-400.0).unwrap().abs() < f64::EPSILON);
        assert!(p.goodwill_value().abs() < f64::EPSILON);
        assert!(p.adjust_goodwill(f64::NAN).is_err());
    }

    #[test]
    fn test_debit_and_credit() {
        let mut p = persona();
        assert_eq!(p.credit_currency(500).unwrap(), 500);
        assert_eq!(p.debit_currency(200).unwrap(), 300);
        assert_eq!(
            p.debit_currency(301),
            Err(EconomyError::InsufficientBalance { required: 301, available: 300 })
        );
        assert_eq!(p.currency_balance(), 300);
    }

    #[test]
    fn test_modifiers_follow_goodwill() {
        let mut p = persona();
        let resolver = ModifierResolver::default();
        assert_eq!(p.modifiers(&resolver).unwrap(), Modifiers::NEUTRAL);
        p.adjust_goodwill(1000.0).unwrap();
        let m = p.modifiers(&resolver).unwrap();
        assert!((m.exp_multiplier - 2.0).abs() < 1e-12);
        assert!((m.luck_factor - 1.5).abs() < 1e-12);
    }
}
