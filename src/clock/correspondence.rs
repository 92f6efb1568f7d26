//! Correspondence clock: one deadline per turn.

use chrono::{DateTime, Duration, Utc};

use crate::core::CheckerColor;

/// Deadline clock for slow play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrespondenceClock {
    per_move: Duration,
    deadline: Option<(CheckerColor, DateTime<Utc>)>,
}

impl CorrespondenceClock {
    #[must_use]
    pub fn new(time_per_move_days: u32) -> Self {
        Self {
            per_move: Duration::days(i64::from(time_per_move_days)),
            deadline: None,
        }
    }

    #[must_use]
    pub fn per_move(&self) -> Duration {
        self.per_move
    }

    #[must_use]
    pub fn running(&self) -> Option<CheckerColor> {
        self.deadline.map(|(color, _)| color)
    }

    /// Deadline of the running turn.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline.map(|(_, deadline)| deadline)
    }

    /// Give `color` until `now + per_move`.
    pub fn start(&mut self, color: CheckerColor, now: DateTime<Utc>) {
        self.deadline = Some((color, now + self.per_move));
    }

    pub fn stop(&mut self) -> Option<CheckerColor> {
        self.deadline.take().map(|(color, _)| color)
    }

    /// The running player once their deadline has passed.
    #[must_use]
    pub fn expired(&self, now: DateTime<Utc>) -> Option<CheckerColor> {
        let (color, deadline) = self.deadline?;
        (now > deadline).then_some(color)
    }
}
