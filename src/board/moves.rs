//! Single checker moves and full move sequences.
//!
//! A move is one die's worth of travel for one checker:
//! - `from == 0` means entering from the bar
//! - `to == 0` (White) or `to == 25` (Red) means bearing off
//! - `is_hit` records that a lone opposing checker was sent to the bar
//!
//! Moves carry absolute point numbers; use
//! [`notation`](crate::notation) to render them from the mover's side.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::position::Position;
use crate::core::CheckerColor;

/// Source number meaning "from the bar".
pub const BAR: u8 = 0;

/// One checker moved by one die.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    /// Source point (0 = bar).
    pub from: u8,
    /// Destination point (0/25 = borne off, depending on color).
    pub to: u8,
    /// Die value consumed.
    pub die: u8,
    /// Whether an opposing blot was hit.
    pub is_hit: bool,
}

impl Move {
    /// Create a move.
    #[must_use]
    pub const fn new(from: u8, to: u8, die: u8, is_hit: bool) -> Self {
        Self { from, to, die, is_hit }
    }

    /// Entering from the bar.
    #[must_use]
    pub const fn is_entry(&self) -> bool {
        self.from == BAR
    }

    /// Bearing off for the given mover.
    #[must_use]
    pub const fn is_bear_off(&self, color: CheckerColor) -> bool {
        !self.is_entry() && self.to == color.off_point()
    }

    /// Same checker path, ignoring die and hit flag.
    #[must_use]
    pub const fn same_path(&self, from: u8, to: u8) -> bool {
        self.from == from && self.to == to
    }
}

/// An ordered list of moves making up (part of) a turn.
///
/// SmallVec keeps up to four moves (a full doubles turn) inline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveSequence {
    moves: SmallVec<[Move; 4]>,
}

impl MoveSequence {
    /// Empty sequence (no legal move).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence from the given moves.
    #[must_use]
    pub fn from_moves(moves: &[Move]) -> Self {
        Self {
            moves: SmallVec::from_slice(moves),
        }
    }

    /// Append a move.
    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Remove the last move.
    pub fn pop(&mut self) -> Option<Move> {
        self.moves.pop()
    }

    /// The moves, in play order.
    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// First move, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Move> {
        self.moves.first()
    }

    /// Number of dice this sequence uses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// No moves at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Number of hits in the sequence.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.moves.iter().filter(|m| m.is_hit).count()
    }

    /// The position after playing this sequence for `color`.
    #[must_use]
    pub fn resulting_position(&self, position: &Position, color: CheckerColor) -> Position {
        let mut result = *position;
        for mv in &self.moves {
            result.apply_move(color, mv);
        }
        result
    }

    /// Order-independent key: the same moves in any order share a key.
    #[must_use]
    pub fn unordered_key(&self) -> SmallVec<[Move; 4]> {
        let mut key = self.moves.clone();
        key.sort_unstable();
        key
    }
}

impl FromIterator<Move> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MoveSequence {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}
