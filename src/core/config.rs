//! Match and time-control configuration.
//!
//! Configuration is plain serde data with sensible defaults and `with_*`
//! builders, so surrounding layers can load it from JSON or construct it
//! in code.
//!
//! ```
//! use rust_backgammon::core::{MatchConfig, TimeControlConfig};
//!
//! let config = MatchConfig::default()
//!     .with_target_score(7)
//!     .with_time_control(TimeControlConfig::live(12, 300))
//!     .with_seed(99);
//!
//! assert_eq!(config.target_score, 7);
//! assert!(config.crawford);
//! ```

use serde::{Deserialize, Serialize};

/// Default cube ceiling.
pub const DEFAULT_MAX_CUBE: u32 = 64;

/// Clock configuration for a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeControlConfig {
    /// No clock.
    #[default]
    Disabled,

    /// Live play: a fresh delay each turn, then a shared reserve.
    Live {
        /// Free seconds at the start of every turn.
        delay_seconds: u32,
        /// Reserve per player for the whole match.
        reserve_seconds: u32,
    },

    /// Correspondence play: one deadline per turn.
    Correspondence {
        /// Days allowed per turn.
        time_per_move_days: u32,
    },
}

impl TimeControlConfig {
    /// Live clock with the given delay and reserve.
    #[must_use]
    pub const fn live(delay_seconds: u32, reserve_seconds: u32) -> Self {
        Self::Live {
            delay_seconds,
            reserve_seconds,
        }
    }

    /// Correspondence clock with the given days per move.
    #[must_use]
    pub const fn correspondence(time_per_move_days: u32) -> Self {
        Self::Correspondence { time_per_move_days }
    }

    /// Whether any clock runs.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// What a timeout or abandonment costs the offender.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForfeitPolicy {
    /// Lose the current game at the current cube value.
    #[default]
    Game,
    /// Lose the whole match: the opponent is awarded the points still needed.
    Match,
}

/// Match configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Points needed to win the match.
    pub target_score: u32,

    /// Apply the Crawford rule. Disable for unlimited sessions.
    pub crawford: bool,

    /// Highest cube value that may be offered.
    pub max_cube: u32,

    /// Clock settings.
    pub time_control: TimeControlConfig,

    /// Forfeit consequences for timeouts.
    pub forfeit: ForfeitPolicy,

    /// Dice seed. Each game draws from its own stream derived from this.
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            target_score: 5,
            crawford: true,
            max_cube: DEFAULT_MAX_CUBE,
            time_control: TimeControlConfig::Disabled,
            forfeit: ForfeitPolicy::Game,
            seed: 42,
        }
    }
}

impl MatchConfig {
    /// Set the target score (at least 1).
    pub fn with_target_score(mut self, target: u32) -> Self {
        self.target_score = target.max(1);
        self
    }

    /// Enable or disable the Crawford rule.
    pub fn with_crawford(mut self, crawford: bool) -> Self {
        self.crawford = crawford;
        self
    }

    /// Set the cube ceiling, rounded down to a power of two (minimum 1).
    pub fn with_max_cube(mut self, max_cube: u32) -> Self {
        self.max_cube = if max_cube <= 1 {
            1
        } else {
            1 << (31 - max_cube.leading_zeros())
        };
        self
    }

    /// Set the clock.
    pub fn with_time_control(mut self, time_control: TimeControlConfig) -> Self {
        self.time_control = time_control;
        self
    }

    /// Set the forfeit policy.
    pub fn with_forfeit(mut self, forfeit: ForfeitPolicy) -> Self {
        self.forfeit = forfeit;
        self
    }

    /// Set the dice seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
