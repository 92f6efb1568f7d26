//! Game outcomes.

use serde::{Deserialize, Serialize};

use crate::board::Position;
use crate::core::CheckerColor;

/// Size of a win.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinType {
    Normal,
    Gammon,
    Backgammon,
}

impl WinType {
    /// Multiplier applied to the cube value.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::Gammon => 2,
            Self::Backgammon => 3,
        }
    }

    /// Classify a finished position in which `winner` has borne off everything.
    ///
    /// - Backgammon: the loser has borne off nothing and still has a checker
    ///   on the bar or in the winner's home board.
    /// - Gammon: the loser has borne off nothing.
    #[must_use]
    pub fn classify(position: &Position, winner: CheckerColor) -> Self {
        let loser = winner.opponent();
        if position.off(loser) > 0 {
            Self::Normal
        } else if position.bar(loser) > 0 || position.has_checker_in_home_of(loser, winner) {
            Self::Backgammon
        } else {
            Self::Gammon
        }
    }
}

/// How the game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The winner bore off all fifteen checkers.
    BearOff,
    /// The loser dropped a double.
    DoubleRejected,
    /// The loser conceded, possibly a gammon or backgammon.
    Resigned,
    /// The loser's clock ran out.
    Timeout,
    /// The loser abandoned the game.
    Forfeit,
}

impl EndReason {
    /// Result suffix in game records (`RE[W+1D]` style).
    #[must_use]
    pub const fn code(self) -> Option<char> {
        match self {
            Self::BearOff => None,
            Self::DoubleRejected => Some('D'),
            Self::Resigned => Some('R'),
            Self::Timeout => Some('T'),
            Self::Forfeit => Some('F'),
        }
    }

    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'D' => Some(Self::DoubleRejected),
            'R' => Some(Self::Resigned),
            'T' => Some(Self::Timeout),
            'F' => Some(Self::Forfeit),
            _ => None,
        }
    }
}

/// Terminal result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: CheckerColor,
    pub win_type: WinType,
    /// Cube value when the game ended (before any rejected double).
    pub cube_value: u32,
    pub reason: EndReason,
}

impl GameOutcome {
    /// Points the game is worth: cube × win multiplier.
    #[must_use]
    pub const fn stakes(&self) -> u32 {
        self.cube_value * self.win_type.multiplier()
    }

    #[must_use]
    pub const fn loser(&self) -> CheckerColor {
        self.winner.opponent()
    }

    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, color: CheckerColor) -> bool {
        self.winner == color
    }
}
