//! Completed-turn records.
//!
//! A [`TurnSnapshot`] is built once, when its turn ends, and never changes
//! afterwards. Games keep them in an `im::Vector` so cloning a game (for
//! snapshots or analysis) shares the history.

use serde::{Deserialize, Serialize};

use super::cube::CubeOwner;
use crate::board::MoveSequence;
use crate::core::{CheckerColor, DiceRoll};

/// Cube action taken at the start of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoublingAction {
    /// The player doubled and the opponent took. `value` is the new cube value.
    Accepted { value: u32 },
    /// The player doubled and the opponent dropped, ending the game.
    Rejected { value: u32 },
    /// The player doubled and the game ended before the opponent answered.
    Offered { value: u32 },
}

/// One finished turn, or the turn a forfeit or resignation cut short.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    /// 1-based turn counter within the game.
    pub turn_number: u32,
    pub player: CheckerColor,
    /// `None` when the turn ended before rolling.
    pub dice: Option<DiceRoll>,
    pub moves: MoveSequence,
    pub doubling: Option<DoublingAction>,
    pub cube_value: u32,
    pub cube_owner: CubeOwner,
    /// Position id after the turn, from the next roller's side.
    pub position_id: String,
}

impl TurnSnapshot {
    /// The turn rolled but no checker moved.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.dice.is_some() && self.moves.is_empty()
    }
}
