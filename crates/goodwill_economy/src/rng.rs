//! # Roll Sources
//!
//! Every random decision in the engine consumes exactly one roll from a
//! [`RollSource`]. Production code uses [`SeededRolls`] (ChaCha8, seeded and
//! reproducible); tests script outcomes with [`FixedRolls`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{EconomyError, EconomyResult};

/// A source of uniform random numbers in `[0, 1)`.
pub trait RollSource {
    /// Returns the next roll. Must be in `[0, 1)`.
    fn next_roll(&mut self) -> f64;
}

impl<R: RollSource + ?Sized> RollSource for &mut R {
    #[inline]
    fn next_roll(&mut self) -> f64 {
        (**self).next_roll()
    }
}

/// Deterministic rolls from a seeded ChaCha8 stream.
#[derive(Clone, Debug)]
pub struct SeededRolls {
    rng: ChaCha8Rng,
}

impl SeededRolls {
    /// Creates a roll stream from a 64-bit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RollSource for SeededRolls {
    #[inline]
    fn next_roll(&mut self) -> f64 {
        // Standard f64 sampling is uniform in [0, 1).
        self.rng.gen::<f64>()
    }
}

/// A scripted roll sequence that repeats once exhausted.
#[derive(Clone, Debug)]
pub struct FixedRolls {
    rolls: Vec<f64>,
    cursor: usize,
}

impl FixedRolls {
    /// Creates a scripted sequence.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidState` if the sequence is empty or any
    /// value lies outside `[0, 1)`.
    pub fn new(rolls: impl Into<Vec<f64>>) -> EconomyResult<Self> {
        let rolls = rolls.into();
        if rolls.is_empty() {
            return Err(EconomyError::InvalidState(
                "fixed roll sequence must not be empty".to_string(),
            ));
        }
        for roll in &rolls {
            crate::rarity::check_roll(*roll)?;
        }
        Ok(Self { rolls, cursor: 0 })
    }

    /// Number of rolls consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RollSource for FixedRolls {
    fn next_roll(&mut self) -> f64 {
        let roll = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        roll
    }
}

/// Picks an index in `0..len` from one roll.
///
/// `len` must be non-zero.
#[inline]
pub(crate) fn pick_index(roll: f64, len: usize) -> usize {
    debug_assert!(len > 0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let index = (roll * len as f64) as usize;
    index.min(len - 1)
}
