//! Engine error taxonomy.
//!
//! Every failure is local and recoverable: the caller reports it and the
//! game is left exactly as it was before the rejected command.

use thiserror::Error;

use crate::core::CheckerColor;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by game, match and clock operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Operation not valid in the current turn phase.
    #[error("{operation} is not allowed: {reason}")]
    InvalidState {
        operation: &'static str,
        reason: String,
    },

    /// Move is not part of any legal play for the remaining dice.
    #[error("illegal move {from}/{to}")]
    IllegalMove { from: u8, to: u8 },

    /// Ending the turn while legal moves remain.
    #[error("turn is not complete: {remaining_dice} playable dice remain")]
    TurnNotComplete { remaining_dice: usize },

    /// Doubling rejected by the cube gating rules.
    #[error("double not allowed: {0}")]
    DoubleNotAllowed(DoubleDenial),

    /// Malformed position or game record.
    #[error("position parse error: {0}")]
    PositionParse(#[from] ParseError),

    /// Command sent to a finished game.
    #[error("game is already complete")]
    GameComplete,

    /// The clock ran out; the game (or match) has been forfeited.
    #[error("{loser} forfeited on time ({stakes} points)")]
    TimeoutForfeit { loser: CheckerColor, stakes: u32 },

    /// Command sent to a finished match.
    #[error("match is already complete")]
    MatchComplete,
}

impl EngineError {
    pub(crate) fn invalid_state(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            operation,
            reason: reason.into(),
        }
    }
}

/// Why a double was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DoubleDenial {
    #[error("doubling is disabled in the Crawford game")]
    CrawfordGame,
    #[error("it is not the doubler's turn")]
    NotYourTurn,
    #[error("dice have already been rolled")]
    DiceAlreadyRolled,
    #[error("the cube is owned by the opponent")]
    CubeOwnedByOpponent,
    #[error("the cube is at its maximum value")]
    CubeAtMaximum,
    #[error("a double is already pending")]
    DoublePending,
}

/// Errors from the text notations (SGF, position id, move notation).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input is empty")]
    Empty,
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { offset: usize, found: char },
    #[error("missing property {0}")]
    MissingProperty(&'static str),
    #[error("invalid value {value:?} for property {property}")]
    InvalidValue { property: String, value: String },
    #[error("{color} has {count} checkers, expected 15")]
    CheckerCount { color: CheckerColor, count: u32 },
    #[error("recorded turn {turn} cannot be replayed: {detail}")]
    IllegalRecordedTurn { turn: usize, detail: String },
    #[error("invalid position id {0:?}")]
    InvalidPositionId(String),
    #[error("invalid move notation {0:?}")]
    InvalidNotation(String),
}
