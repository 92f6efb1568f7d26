//! Legal move generation.
//!
//! The generator enumerates every way to play the given dice by depth-first
//! search, then keeps only the sequences that use the maximum number of
//! dice. Rules enforced:
//!
//! 1. Checkers on the bar must all enter before anything else moves.
//! 2. A die moves one checker exactly that many pips.
//! 3. Points held by two or more opposing checkers are blocked; a lone
//!    opposing checker is hit.
//! 4. Bearing off requires every remaining checker in the home board. A die
//!    larger than needed may bear off from the farthest occupied point.
//! 5. As many dice as possible must be played; if only one die of a
//!    non-double can be played, the larger one must be played when possible.
//!
//! ```
//! use rust_backgammon::board::{legal_moves, Position};
//! use rust_backgammon::core::CheckerColor;
//!
//! let start = Position::starting();
//! let legal = legal_moves(&start, CheckerColor::White, &[3, 1]);
//! assert_eq!(legal.max_dice(), 2);
//! assert_eq!(legal.distinct_plays_from(&start, CheckerColor::White).len(), 16);
//! ```

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::moves::{Move, MoveSequence, BAR};
use super::position::{Position, POINT_COUNT};
use crate::core::CheckerColor;

/// Every single-die move available to `color` with `die`.
#[must_use]
pub fn single_moves(position: &Position, color: CheckerColor, die: u8) -> SmallVec<[Move; 16]> {
    let mut out = SmallVec::new();
    let opponent = color.opponent();

    if position.bar(color) > 0 {
        let to = color.entry_point(die);
        let blockers = position.count(opponent, to);
        if blockers < 2 {
            out.push(Move::new(BAR, to, die, blockers == 1));
        }
        return out;
    }

    let can_bear_off = position.all_home(color);
    let farthest = position.farthest_checker(color);

    for relative in (1..=POINT_COUNT).rev() {
        let from = color.absolute_point(relative);
        if position.count(color, from) == 0 {
            continue;
        }

        if relative > die {
            let to = color.absolute_point(relative - die);
            let blockers = position.count(opponent, to);
            if blockers < 2 {
                out.push(Move::new(from, to, die, blockers == 1));
            }
        } else if can_bear_off && (relative == die || farthest == Some(relative)) {
            out.push(Move::new(from, color.off_point(), die, false));
        }
    }

    out
}

/// Result of move generation: all maximal sequences for a roll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegalMoves {
    sequences: Vec<MoveSequence>,
    max_dice: usize,
}

impl LegalMoves {
    /// Every maximal sequence, in generation order, without exact duplicates.
    ///
    /// Different orderings of the same moves are separate alternatives.
    #[must_use]
    pub fn sequences(&self) -> &[MoveSequence] {
        &self.sequences
    }

    /// Number of dice every legal sequence uses.
    #[must_use]
    pub fn max_dice(&self) -> usize {
        self.max_dice
    }

    /// No die can be played at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_dice == 0
    }

    /// Moves that can legally be played next.
    #[must_use]
    pub fn first_moves(&self) -> Vec<Move> {
        let mut seen = FxHashSet::default();
        self.sequences
            .iter()
            .filter_map(MoveSequence::first)
            .filter(|mv| seen.insert(**mv))
            .copied()
            .collect()
    }

    /// The legal next move travelling `from` → `to`, if any.
    ///
    /// When several dice could make the same trip (bearing off with a
    /// larger die), the exact die is preferred, then the smallest.
    #[must_use]
    pub fn find_first(&self, color: CheckerColor, from: u8, to: u8) -> Option<Move> {
        let exact = exact_distance(color, from, to);
        self.first_moves()
            .into_iter()
            .filter(|mv| mv.same_path(from, to))
            .min_by_key(|mv| (Some(mv.die) != exact, mv.die))
    }

    /// One representative sequence per distinct resulting position.
    #[must_use]
    pub fn distinct_plays_from(&self, position: &Position, color: CheckerColor) -> Vec<MoveSequence> {
        let mut seen = FxHashSet::default();
        self.sequences
            .iter()
            .filter(|seq| seen.insert(seq.resulting_position(position, color)))
            .cloned()
            .collect()
    }

    /// One representative per set of moves, ignoring play order.
    #[must_use]
    pub fn distinct_plays(&self) -> Vec<MoveSequence> {
        let mut seen = FxHashSet::default();
        self.sequences
            .iter()
            .filter(|seq| seen.insert(seq.unordered_key()))
            .cloned()
            .collect()
    }

    /// Whether exactly this ordered sequence is legal.
    #[must_use]
    pub fn contains(&self, moves: &[Move]) -> bool {
        self.sequences.iter().any(|seq| seq.moves() == moves)
    }
}

/// Pip distance of a trip, `None` for bear-offs (any large enough die works).
fn exact_distance(color: CheckerColor, from: u8, to: u8) -> Option<u8> {
    let start = if from == BAR { 25 } else { color.relative_point(from) };
    let end = if to == color.off_point() { 0 } else { color.relative_point(to) };
    start.checked_sub(end)
}

/// Enumerate the legal plays of `dice` for `color`.
///
/// `dice` are the usable die values (four entries for a fresh double).
#[must_use]
pub fn legal_moves(position: &Position, color: CheckerColor, dice: &[u8]) -> LegalMoves {
    let mut search = Search {
        color,
        all: Vec::new(),
        seen: FxHashSet::default(),
        best: 0,
    };
    let mut current = MoveSequence::new();
    let mut remaining: SmallVec<[u8; 4]> = SmallVec::from_slice(dice);
    search.walk(*position, &mut remaining, &mut current);

    let max_dice = search.best;
    let mut sequences: Vec<MoveSequence> = search
        .all
        .into_iter()
        .filter(|seq| seq.len() == max_dice)
        .collect();

    if max_dice == 1 && dice.len() == 2 && dice[0] != dice[1] {
        let high = dice[0].max(dice[1]);
        if sequences.iter().any(|seq| seq.moves()[0].die == high) {
            sequences.retain(|seq| seq.moves()[0].die == high);
        }
    }

    if max_dice == 0 {
        sequences.clear();
    }

    LegalMoves { sequences, max_dice }
}

struct Search {
    color: CheckerColor,
    all: Vec<MoveSequence>,
    seen: FxHashSet<MoveSequence>,
    best: usize,
}

impl Search {
    fn walk(&mut self, position: Position, remaining: &mut SmallVec<[u8; 4]>, current: &mut MoveSequence) {
        let mut moved = false;
        let mut tried: SmallVec<[u8; 4]> = SmallVec::new();

        for index in 0..remaining.len() {
            let die = remaining[index];
            if tried.contains(&die) {
                continue;
            }
            tried.push(die);

            for mv in single_moves(&position, self.color, die) {
                moved = true;
                let mut next = position;
                next.apply_move(self.color, &mv);

                remaining.remove(index);
                current.push(mv);
                self.walk(next, remaining, current);
                current.pop();
                remaining.insert(index, die);
            }
        }

        if !moved && current.len() >= self.best {
            self.best = current.len();
            if self.seen.insert(current.clone()) {
                self.all.push(current.clone());
            }
        }
    }
}
