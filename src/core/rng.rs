//! Injectable random source for shuffling.
//!
//! The engine never reaches for a global generator: every operation that
//! needs randomness borrows the `GameRng` owned by the table. Tests seed
//! it for determinism, live tables seed it from OS entropy.
//!
//! ```
//! use sakura_table::core::GameRng;
//!
//! let mut a = GameRng::new(42);
//! let mut b = GameRng::new(42);
//!
//! let mut x = vec![1, 2, 3, 4, 5];
//! let mut y = x.clone();
//! a.shuffle(&mut x);
//! b.shuffle(&mut y);
//! assert_eq!(x, y);
//! ```

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seedable RNG used for shuffles and table ids.
///
/// Backed by ChaCha8: fast, and uniform enough for card games.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
}

impl GameRng {
    /// Deterministic generator for tests and replays.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create an RNG seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_entropy(),
        }
    }

    /// Uniform index into a collection of `len` items.
    ///
    /// Panics if `len` is zero, like indexing an empty slice would.
    pub fn pick_index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// Uniform in-place shuffle (rand's Fisher–Yates).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}
