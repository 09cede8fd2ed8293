//! Seeded uniform-real source driving cut selection (spec §2, §9).
//!
//! A tree owns its RNG; seeding policy is external. We use `ChaCha8Rng`
//! rather than a thread-local or OS generator so that two trees built
//! from the same seed reproduce identical cut sequences, which the
//! "variant agreement" and "seeded agreement" testable properties
//! (spec §8) depend on.

use rand::{Rng as _, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform-real source used for random cut selection.
///
/// Wraps a `ChaCha8Rng` rather than exposing it directly so callers
/// depend on [`draw_unit`]/[`split`] instead of the RNG crate's API,
/// keeping the seedable-generator choice an internal detail.
#[derive(Clone, Debug)]
pub struct TreeRng {
    inner: ChaCha8Rng,
}

impl TreeRng {
    pub fn from_seed(seed: u64) -> Self {
        TreeRng {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws `r ~ U[0, total)`. `total` must be finite and positive.
    pub fn draw_scaled(&mut self, total: f64) -> f64 {
        debug_assert!(total.is_finite() && total > 0.0, "total must be > 0, got {total}");
        self.inner.gen::<f64>() * total
    }

    /// Derives an independent child stream, used by the forest to hand
    /// each tree its own seed from one root seed (spec §4.5).
    pub fn split(&mut self) -> TreeRng {
        TreeRng {
            inner: ChaCha8Rng::seed_from_u64(self.inner.gen::<u64>()),
        }
    }
}
