//! Live clock: a fresh delay each turn, then a per-player reserve.

use chrono::{DateTime, Duration, Utc};

use crate::core::{CheckerColor, ColorMap};

/// One turn of one game in a match.
///
/// The delay belongs to a turn: when a player's time starts again within the
/// same turn (after the opponent answers a double), it picks up where it left
/// off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TurnId {
    pub game: u32,
    pub turn: u32,
}

impl TurnId {
    #[must_use]
    pub fn new(game: u32, turn: u32) -> Self {
        Self { game, turn }
    }
}

/// The player whose time is running, since when, and with how much delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunningTurn {
    pub color: CheckerColor,
    pub turn: TurnId,
    pub started_at: DateTime<Utc>,
    pub delay: Duration,
}

impl RunningTurn {
    fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).max(Duration::zero())
    }

    fn reserve_used(&self, now: DateTime<Utc>) -> Duration {
        (self.elapsed(now) - self.delay).max(Duration::zero())
    }

    fn delay_left(&self, now: DateTime<Utc>) -> Duration {
        (self.delay - self.elapsed(now)).max(Duration::zero())
    }
}

/// Delay-then-reserve clock.
///
/// Elapsed time is taken from the turn's delay first; only the overflow is
/// charged to the player's reserve. The delay resets when a player's turn
/// begins, not when the clock merely comes back to them mid-turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveClock {
    delay: Duration,
    reserves: ColorMap<Duration>,
    paused: ColorMap<Option<(TurnId, Duration)>>,
    turn: Option<RunningTurn>,
}

impl LiveClock {
    #[must_use]
    pub fn new(delay_seconds: u32, reserve_seconds: u32) -> Self {
        Self {
            delay: Duration::seconds(i64::from(delay_seconds)),
            reserves: ColorMap::with_value(Duration::seconds(i64::from(reserve_seconds))),
            paused: ColorMap::with_value(None),
            turn: None,
        }
    }

    /// Per-turn delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whose time is running.
    #[must_use]
    pub fn running(&self) -> Option<CheckerColor> {
        self.turn.map(|turn| turn.color)
    }

    /// Start `color`'s time for `turn`, charging whoever was running before.
    ///
    /// A player coming back to a turn they already started gets the delay
    /// they had left; otherwise they get a full delay.
    pub fn start(&mut self, color: CheckerColor, turn: TurnId, now: DateTime<Utc>) {
        self.pause(now);
        let delay = match self.paused[color].take() {
            Some((paused_turn, left)) if paused_turn == turn => left,
            _ => self.delay,
        };
        self.turn = Some(RunningTurn {
            color,
            turn,
            started_at: now,
            delay,
        });
    }

    /// Stop the running time and charge it. Returns who was running.
    ///
    /// Nobody can pick up a half-used delay after a stop.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<CheckerColor> {
        let color = self.pause(now);
        self.paused = ColorMap::with_value(None);
        color
    }

    fn pause(&mut self, now: DateTime<Utc>) -> Option<CheckerColor> {
        let turn = self.turn.take()?;
        let reserve = &mut self.reserves[turn.color];
        *reserve = (*reserve - turn.reserve_used(now)).max(Duration::zero());
        self.paused[turn.color] = Some((turn.turn, turn.delay_left(now)));
        Some(turn.color)
    }

    /// Reserve left for `color` as of `now`, counting the running turn.
    #[must_use]
    pub fn remaining_reserve(&self, color: CheckerColor, now: DateTime<Utc>) -> Duration {
        let banked = self.reserves[color];
        match self.turn {
            Some(turn) if turn.color == color => (banked - turn.reserve_used(now)).max(Duration::zero()),
            _ => banked,
        }
    }

    /// Delay left in the running turn.
    #[must_use]
    pub fn remaining_delay(&self, now: DateTime<Utc>) -> Duration {
        match self.turn {
            Some(turn) => turn.delay_left(now),
            None => self.delay,
        }
    }

    /// The running player if their reserve is exhausted.
    #[must_use]
    pub fn expired(&self, now: DateTime<Utc>) -> Option<CheckerColor> {
        let turn = self.turn?;
        let left = self.reserves[turn.color] - turn.reserve_used(now);
        (left <= Duration::zero()).then_some(turn.color)
    }

    /// Reserves as of the last charge, in milliseconds.
    #[must_use]
    pub fn banked_reserves_ms(&self) -> ColorMap<i64> {
        ColorMap::new(|color| self.reserves[color].num_milliseconds())
    }

    /// Overwrite the banked reserves, e.g. when resuming a saved match.
    pub fn restore_reserves_ms(&mut self, reserves: ColorMap<i64>) {
        self.reserves = ColorMap::new(|color| Duration::milliseconds(reserves[color].max(0)));
    }
}
