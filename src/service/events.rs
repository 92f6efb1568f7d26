//! Events broadcast to match subscribers.

use serde::{Deserialize, Serialize};

use crate::core::{CheckerColor, ColorMap};
use crate::snapshot::MatchSnapshot;

/// Registry key for a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub u64);

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

/// Something subscribers should know about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// State after a successful command or a clock forfeit.
    Updated {
        match_id: MatchId,
        snapshot: Box<MatchSnapshot>,
    },
    /// A player ran out of time.
    TimeoutForfeit {
        match_id: MatchId,
        loser: CheckerColor,
        stakes: u32,
    },
    /// The match has a winner.
    MatchComplete {
        match_id: MatchId,
        winner: CheckerColor,
        scores: ColorMap<u32>,
    },
}

impl MatchEvent {
    #[must_use]
    pub fn match_id(&self) -> MatchId {
        match self {
            Self::Updated { match_id, .. }
            | Self::TimeoutForfeit { match_id, .. }
            | Self::MatchComplete { match_id, .. } => *match_id,
        }
    }
}
