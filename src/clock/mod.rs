//! Time control.
//!
//! Clocks never read the wall clock: every operation takes `now`. The match
//! keeps the running clock pointed at whoever must act (see
//! [`Game::actor`](crate::rules::Game::actor)), and a periodic poll turns an
//! expired clock into a forfeit.
//!
//! Clocks never affect move legality.

pub mod correspondence;
pub mod live;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CheckerColor, ColorMap, TimeControlConfig};

pub use correspondence::CorrespondenceClock;
pub use live::{LiveClock, RunningTurn, TurnId};

/// The clock configured for a match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MatchClock {
    #[default]
    Disabled,
    Live(LiveClock),
    Correspondence(CorrespondenceClock),
}

impl MatchClock {
    #[must_use]
    pub fn from_config(config: &TimeControlConfig) -> Self {
        match *config {
            TimeControlConfig::Disabled => Self::Disabled,
            TimeControlConfig::Live {
                delay_seconds,
                reserve_seconds,
            } => Self::Live(LiveClock::new(delay_seconds, reserve_seconds)),
            TimeControlConfig::Correspondence { time_per_move_days } => {
                Self::Correspondence(CorrespondenceClock::new(time_per_move_days))
            }
        }
    }

    /// Whose time is running.
    #[must_use]
    pub fn running(&self) -> Option<CheckerColor> {
        match self {
            Self::Disabled => None,
            Self::Live(clock) => clock.running(),
            Self::Correspondence(clock) => clock.running(),
        }
    }

    /// Point the clock at `actor` acting in `turn` (or stop it with `None`).
    ///
    /// No-op if `actor` is already running.
    pub fn switch_to(&mut self, actor: Option<(CheckerColor, TurnId)>, now: DateTime<Utc>) {
        if self.running() == actor.map(|(color, _)| color) {
            return;
        }
        match (self, actor) {
            (Self::Disabled, _) => {}
            (Self::Live(clock), Some((color, turn))) => clock.start(color, turn, now),
            (Self::Live(clock), None) => {
                clock.stop(now);
            }
            (Self::Correspondence(clock), Some((color, _))) => clock.start(color, now),
            (Self::Correspondence(clock), None) => {
                clock.stop();
            }
        }
    }

    /// Live reserves as of the last charge; `None` for other clocks.
    #[must_use]
    pub fn banked_reserves_ms(&self) -> Option<ColorMap<i64>> {
        match self {
            Self::Live(clock) => Some(clock.banked_reserves_ms()),
            _ => None,
        }
    }

    /// Put saved reserves back on a live clock. Other clocks ignore them.
    pub fn restore_reserves_ms(&mut self, reserves: ColorMap<i64>) {
        if let Self::Live(clock) = self {
            clock.restore_reserves_ms(reserves);
        }
    }

    /// The running player if they have run out of time.
    #[must_use]
    pub fn expired(&self, now: DateTime<Utc>) -> Option<CheckerColor> {
        match self {
            Self::Disabled => None,
            Self::Live(clock) => clock.expired(now),
            Self::Correspondence(clock) => clock.expired(now),
        }
    }

    /// Read-only view for snapshots.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> ClockView {
        match self {
            Self::Disabled => ClockView::Disabled,
            Self::Live(clock) => ClockView::Live {
                running: clock.running(),
                delay_remaining_ms: clock.remaining_delay(now).num_milliseconds(),
                reserve_ms: ColorMap::new(|color| clock.remaining_reserve(color, now).num_milliseconds()),
            },
            Self::Correspondence(clock) => ClockView::Correspondence {
                running: clock.running(),
                deadline: clock.deadline(),
            },
        }
    }
}

/// Clock fields carried by snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockView {
    #[default]
    Disabled,
    Live {
        running: Option<CheckerColor>,
        delay_remaining_ms: i64,
        reserve_ms: ColorMap<i64>,
    },
    Correspondence {
        running: Option<CheckerColor>,
        deadline: Option<DateTime<Utc>>,
    },
}
