//! Seeded dice.
//!
//! A match owns one [`DiceRng`] and derives a fresh stream for each game with
//! [`DiceRng::for_context`], so replaying a match from its seed reproduces
//! every roll. [`DiceRngState`] captures a stream mid-game for checkpoints.
//!
//! ```
//! use rust_backgammon::core::{DiceRng, DiceSource};
//!
//! let mut rng = DiceRng::new(42);
//! let roll = rng.roll();
//!
//! // Same seed, same sequence
//! let mut again = DiceRng::new(42);
//! assert_eq!(again.roll(), roll);
//! ```

use std::collections::VecDeque;
use std::hash::Hasher;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use super::dice::DiceRoll;

/// Anything that can produce dice.
///
/// The engine never reaches for ambient randomness: every roll comes from a
/// source handed in by the caller, which keeps games reproducible.
pub trait DiceSource {
    /// Roll a single die in `1..=6`.
    fn roll_die(&mut self) -> u8;

    /// Roll both dice.
    fn roll(&mut self) -> DiceRoll {
        let first = self.roll_die();
        let second = self.roll_die();
        DiceRoll::clamped(first, second)
    }
}

/// Seeded ChaCha8 dice generator.
#[derive(Clone, Debug)]
pub struct DiceRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl DiceRng {
    /// Dice seeded from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Derive the dice for a named sub-stream such as `"game-3"`.
    ///
    /// Depends only on the seed and the label, never on rolls already drawn
    /// or on the toolchain that built the crate.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = FxHasher::default();
        hasher.write_u64(self.seed);
        hasher.write(context.as_bytes());
        Self::new(hasher.finish())
    }

    /// Seed this stream was built from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Checkpoint of the stream position.
    #[must_use]
    pub fn state(&self) -> DiceRngState {
        DiceRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Resume a stream from a checkpoint.
    #[must_use]
    pub fn from_state(state: &DiceRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

impl DiceSource for DiceRng {
    fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=6)
    }
}

/// Where a dice stream stands: its seed and how many words it has consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRngState {
    pub seed: u64,
    pub word_pos: u128,
}

/// Predetermined dice, consumed in order.
///
/// Used for puzzles, analysis and replaying recorded games. Once the queue
/// runs dry it falls back to the wrapped generator.
#[derive(Clone, Debug)]
pub struct FixedDice {
    faces: VecDeque<u8>,
    fallback: DiceRng,
}

impl FixedDice {
    /// Queue the given rolls.
    #[must_use]
    pub fn new(rolls: &[DiceRoll]) -> Self {
        Self {
            faces: rolls.iter().flat_map(|r| [r.first(), r.second()]).collect(),
            fallback: DiceRng::new(0),
        }
    }

    /// Number of faces still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for FixedDice {
    fn roll_die(&mut self) -> u8 {
        self.faces.pop_front().unwrap_or_else(|| self.fallback.roll_die())
    }
}
