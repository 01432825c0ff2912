//! The single seedable random source of a battle.
//!
//! Every draw in the core goes through [`BattleRng`]. ChaCha8 produces the
//! same stream on every platform, so a seed plus an input sequence fully
//! determines a battle.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random source owned by the battle core.
#[derive(Debug, Clone)]
pub struct BattleRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl BattleRng {
    /// Creates a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed this generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer draw in `[0, 100)`.
    pub fn roll_percent(&mut self) -> u32 {
        self.inner.gen_range(0..100)
    }

    /// Returns `true` when a percent roll falls strictly below `chance`.
    pub fn check(&mut self, chance: f64) -> bool {
        f64::from(self.roll_percent()) < chance
    }

    /// Uniform float draw in `[min, max]`.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Uniform choice from a slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }
}
