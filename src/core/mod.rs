//! Core engine types: colors, dice, RNG, configuration.
//!
//! These are the leaf building blocks every other module uses. Nothing here
//! knows about the board or the rules.

pub mod color;
pub mod config;
pub mod dice;
pub mod rng;

pub use color::{CheckerColor, ColorMap};
pub use config::{ForfeitPolicy, MatchConfig, TimeControlConfig, DEFAULT_MAX_CUBE};
pub use dice::{DiceRoll, DieValues};
pub use rng::{DiceRng, DiceRngState, DiceSource, FixedDice};
