//! Turn phases.

use serde::{Deserialize, Serialize};

use crate::core::CheckerColor;

/// Where a game is within the current turn.
///
/// One enum replaces the "dice rolled", "double pending" and "game over"
/// flags a looser design would scatter across the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnPhase {
    /// The current player may double or roll.
    AwaitingRoll,
    /// Dice are rolled and at least one more move is possible.
    AwaitingMove,
    /// A double was offered; the opponent must take or drop.
    AwaitingDoubleResponse {
        offered_by: CheckerColor,
        new_value: u32,
    },
    /// No further move is possible; the player must end the turn (or undo).
    TurnComplete,
    /// The game has an outcome. Every command is rejected.
    GameOver,
}

impl TurnPhase {
    /// Dice have been rolled this turn.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        matches!(self, Self::AwaitingMove | Self::TurnComplete)
    }

    /// Short name used in error messages and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AwaitingRoll => "awaiting roll",
            Self::AwaitingMove => "awaiting move",
            Self::AwaitingDoubleResponse { .. } => "awaiting double response",
            Self::TurnComplete => "turn complete",
            Self::GameOver => "game over",
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
