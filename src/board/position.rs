//! Board position: 24 points, the bar and borne-off trays.
//!
//! ## Numbering
//!
//! Points use absolute numbers 1-24 as seen by White. White moves from 24
//! toward 1 and bears off past 1; Red moves from 1 toward 24 and bears off
//! past 24. Each color's home board is its own points 1-6
//! (absolute 1-6 for White, 19-24 for Red).
//!
//! ## Invariant
//!
//! Every color always has exactly 15 checkers across board, bar and tray.

use serde::{Deserialize, Serialize};

use super::moves::Move;
use crate::core::{CheckerColor, ColorMap};
use crate::error::ParseError;

/// Checkers per side.
pub const CHECKERS_PER_SIDE: u8 = 15;

/// Number of points on the board.
pub const POINT_COUNT: u8 = 24;

/// Contents of one point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Color occupying the point, `None` when empty.
    pub owner: Option<CheckerColor>,
    /// Number of checkers on the point.
    pub count: u8,
}

/// A complete board position.
///
/// Pure data: it knows how to apply and revert a move, but not which moves
/// are legal (see [`movegen`](super::movegen)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Signed counts per point (index 0 = point 1). Positive = White, negative = Red.
    points: [i8; 24],
    bar: ColorMap<u8>,
    off: ColorMap<u8>,
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl Position {
    /// A board with no checkers anywhere. Only useful as a builder base.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            points: [0; 24],
            bar: ColorMap::with_value(0),
            off: ColorMap::with_value(0),
        }
    }

    /// The standard starting position.
    ///
    /// ```
    /// use rust_backgammon::board::Position;
    /// use rust_backgammon::core::CheckerColor;
    ///
    /// let position = Position::starting();
    /// assert_eq!(position.pip_count(CheckerColor::White), 167);
    /// assert_eq!(position.pip_count(CheckerColor::Red), 167);
    /// ```
    #[must_use]
    pub fn starting() -> Self {
        let mut position = Self::empty();
        for color in CheckerColor::ALL {
            for (relative, count) in [(24, 2), (13, 5), (8, 3), (6, 5)] {
                position.set_point(color.absolute_point(relative), Some(color), count);
            }
        }
        position
    }

    fn slot(point: u8) -> usize {
        debug_assert!((1..=POINT_COUNT).contains(&point), "point out of range: {point}");
        usize::from(point - 1)
    }

    /// Contents of a point (1-24).
    #[must_use]
    pub fn point(&self, point: u8) -> Point {
        let raw = self.points[Self::slot(point)];
        match raw {
            0 => Point { owner: None, count: 0 },
            n if n > 0 => Point {
                owner: Some(CheckerColor::White),
                count: n.unsigned_abs(),
            },
            n => Point {
                owner: Some(CheckerColor::Red),
                count: n.unsigned_abs(),
            },
        }
    }

    /// Number of `color` checkers on a point (1-24).
    #[must_use]
    pub fn count(&self, color: CheckerColor, point: u8) -> u8 {
        let p = self.point(point);
        if p.owner == Some(color) {
            p.count
        } else {
            0
        }
    }

    /// Overwrite a point. A zero count clears it regardless of `owner`.
    pub fn set_point(&mut self, point: u8, owner: Option<CheckerColor>, count: u8) {
        let signed = count.min(i8::MAX as u8) as i8;
        self.points[Self::slot(point)] = match owner {
            _ if count == 0 => 0,
            Some(CheckerColor::White) => signed,
            Some(CheckerColor::Red) => -signed,
            None => 0,
        };
    }

    /// Checkers of `color` on the bar.
    #[must_use]
    pub fn bar(&self, color: CheckerColor) -> u8 {
        self.bar[color]
    }

    /// Set the bar count for `color`.
    pub fn set_bar(&mut self, color: CheckerColor, count: u8) {
        self.bar[color] = count;
    }

    /// Checkers of `color` already borne off.
    #[must_use]
    pub fn off(&self, color: CheckerColor) -> u8 {
        self.off[color]
    }

    /// Set the borne-off count for `color`.
    pub fn set_off(&mut self, color: CheckerColor, count: u8) {
        self.off[color] = count;
    }

    /// Checkers of `color` on points 1-24.
    #[must_use]
    pub fn on_board(&self, color: CheckerColor) -> u32 {
        (1..=POINT_COUNT).map(|p| u32::from(self.count(color, p))).sum()
    }

    /// Board + bar + borne off.
    #[must_use]
    pub fn total_checkers(&self, color: CheckerColor) -> u32 {
        self.on_board(color) + u32::from(self.bar(color)) + u32::from(self.off(color))
    }

    /// Check the 15-checkers-per-side invariant.
    pub fn validate(&self) -> Result<(), ParseError> {
        for color in CheckerColor::ALL {
            let count = self.total_checkers(color);
            if count != u32::from(CHECKERS_PER_SIDE) {
                return Err(ParseError::CheckerCount { color, count });
            }
        }
        Ok(())
    }

    /// Fill the tray so that `color` has 15 checkers. Fails if it already has more.
    pub fn fill_off(&mut self, color: CheckerColor) -> Result<(), ParseError> {
        let placed = self.on_board(color) + u32::from(self.bar(color));
        if placed > u32::from(CHECKERS_PER_SIDE) {
            return Err(ParseError::CheckerCount { color, count: placed });
        }
        self.off[color] = CHECKERS_PER_SIDE - placed as u8;
        Ok(())
    }

    /// All of `color`'s checkers still in play are in its home board.
    #[must_use]
    pub fn all_home(&self, color: CheckerColor) -> bool {
        self.bar(color) == 0
            && (7..=POINT_COUNT).all(|relative| self.count(color, color.absolute_point(relative)) == 0)
    }

    /// Farthest occupied point of `color` in its own numbering (25 = bar).
    #[must_use]
    pub fn farthest_checker(&self, color: CheckerColor) -> Option<u8> {
        if self.bar(color) > 0 {
            return Some(25);
        }
        (1..=POINT_COUNT)
            .rev()
            .find(|&relative| self.count(color, color.absolute_point(relative)) > 0)
    }

    /// Total distance `color` must travel to bear everything off.
    #[must_use]
    pub fn pip_count(&self, color: CheckerColor) -> u32 {
        let board: u32 = (1..=POINT_COUNT)
            .map(|p| u32::from(self.count(color, p)) * u32::from(color.relative_point(p)))
            .sum();
        board + 25 * u32::from(self.bar(color))
    }

    /// No further contact is possible: every White checker has passed every Red one.
    #[must_use]
    pub fn is_race(&self) -> bool {
        if self.bar(CheckerColor::White) > 0 || self.bar(CheckerColor::Red) > 0 {
            return false;
        }
        let white_back = (1..=POINT_COUNT).rev().find(|&p| self.count(CheckerColor::White, p) > 0);
        let red_back = (1..=POINT_COUNT).find(|&p| self.count(CheckerColor::Red, p) > 0);
        match (white_back, red_back) {
            (Some(white), Some(red)) => white < red,
            _ => true,
        }
    }

    /// `color` has borne off every checker.
    #[must_use]
    pub fn has_borne_off_all(&self, color: CheckerColor) -> bool {
        self.off(color) >= CHECKERS_PER_SIDE
    }

    /// `color` has a checker inside `home_of`'s home board.
    #[must_use]
    pub fn has_checker_in_home_of(&self, color: CheckerColor, home_of: CheckerColor) -> bool {
        (1..=6).any(|relative| self.count(color, home_of.absolute_point(relative)) > 0)
    }

    /// Apply a move for `color`. The move must already be known legal.
    pub fn apply_move(&mut self, color: CheckerColor, mv: &Move) {
        if mv.is_entry() {
            self.bar[color] -= 1;
        } else {
            self.remove_checker(color, mv.from);
        }

        if mv.is_bear_off(color) {
            self.off[color] += 1;
        } else {
            if mv.is_hit {
                let opponent = color.opponent();
                self.remove_checker(opponent, mv.to);
                self.bar[opponent] += 1;
            }
            self.add_checker(color, mv.to);
        }
    }

    /// Revert a move previously applied with [`apply_move`](Self::apply_move).
    pub fn unapply_move(&mut self, color: CheckerColor, mv: &Move) {
        if mv.is_bear_off(color) {
            self.off[color] -= 1;
        } else {
            self.remove_checker(color, mv.to);
            if mv.is_hit {
                let opponent = color.opponent();
                self.bar[opponent] -= 1;
                self.add_checker(opponent, mv.to);
            }
        }

        if mv.is_entry() {
            self.bar[color] += 1;
        } else {
            self.add_checker(color, mv.from);
        }
    }

    fn add_checker(&mut self, color: CheckerColor, point: u8) {
        let slot = Self::slot(point);
        debug_assert!(
            self.points[slot] == 0 || self.point(point).owner == Some(color),
            "adding {color} checker onto an occupied point {point}"
        );
        self.points[slot] += match color {
            CheckerColor::White => 1,
            CheckerColor::Red => -1,
        };
    }

    fn remove_checker(&mut self, color: CheckerColor, point: u8) {
        debug_assert!(self.count(color, point) > 0, "no {color} checker on point {point}");
        self.points[Self::slot(point)] -= match color {
            CheckerColor::White => 1,
            CheckerColor::Red => -1,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position() {
        let position = Position::starting();
        assert!(position.validate().is_ok());

        assert_eq!(position.point(24), Point { owner: Some(CheckerColor::White), count: 2 });
        assert_eq!(position.point(6), Point { owner: Some(CheckerColor::White), count: 5 });
        assert_eq!(position.point(1), Point { owner: Some(CheckerColor::Red), count: 2 });
        assert_eq!(position.point(19), Point { owner: Some(CheckerColor::Red), count: 5 });
        assert_eq!(position.point(2), Point { owner: None, count: 0 });

        for color in CheckerColor::ALL {
            assert_eq!(position.on_board(color), 15);
            assert_eq!(position.bar(color), 0);
            assert_eq!(position.off(color), 0);
            assert!(!position.all_home(color));
            assert_eq!(position.farthest_checker(color), Some(24));
        }
        assert!(!position.is_race());
    }

    #[test]
    fn test_validate_detects_miscount() {
        let mut position = Position::starting();
        position.set_point(6, Some(CheckerColor::White), 4);
        assert_eq!(
            position.validate(),
            Err(ParseError::CheckerCount { color: CheckerColor::White, count: 14 })
        );

        position.fill_off(CheckerColor::White).unwrap();
        assert_eq!(position.off(CheckerColor::White), 1);
        assert!(position.validate().is_ok());
    }

    #[test]
    fn test_apply_and_unapply_hit() {
        let mut position = Position::empty();
        position.set_point(10, Some(CheckerColor::White), 1);
        position.set_point(7, Some(CheckerColor::Red), 1);

        let mv = Move::new(10, 7, 3, true);
        let before = position;
        position.apply_move(CheckerColor::White, &mv);

        assert_eq!(position.count(CheckerColor::White, 7), 1);
        assert_eq!(position.count(CheckerColor::White, 10), 0);
        assert_eq!(position.bar(CheckerColor::Red), 1);

        position.unapply_move(CheckerColor::White, &mv);
        assert_eq!(position, before);
    }

    #[test]
    fn test_apply_entry_and_bear_off() {
        let mut position = Position::empty();
        position.set_bar(CheckerColor::Red, 1);
        position.set_point(2, Some(CheckerColor::White), 1);

        let entry = Move::new(0, 3, 3, false);
        position.apply_move(CheckerColor::Red, &entry);
        assert_eq!(position.bar(CheckerColor::Red), 0);
        assert_eq!(position.count(CheckerColor::Red, 3), 1);

        let bear_off = Move::new(2, 0, 2, false);
        position.apply_move(CheckerColor::White, &bear_off);
        assert_eq!(position.off(CheckerColor::White), 1);
        assert_eq!(position.count(CheckerColor::White, 2), 0);

        position.unapply_move(CheckerColor::White, &bear_off);
        position.unapply_move(CheckerColor::Red, &entry);
        assert_eq!(position.bar(CheckerColor::Red), 1);
        assert_eq!(position.count(CheckerColor::White, 2), 1);
    }

    #[test]
    fn test_pip_count_with_bar() {
        let mut position = Position::empty();
        position.set_bar(CheckerColor::White, 1);
        position.set_point(3, Some(CheckerColor::White), 2);
        position.set_point(22, Some(CheckerColor::Red), 1);

        assert_eq!(position.pip_count(CheckerColor::White), 25 + 6);
        assert_eq!(position.pip_count(CheckerColor::Red), 3);
        assert_eq!(position.farthest_checker(CheckerColor::White), Some(25));
    }

    #[test]
    fn test_race_detection() {
        let mut position = Position::empty();
        position.set_point(5, Some(CheckerColor::White), 15);
        position.set_point(20, Some(CheckerColor::Red), 15);
        assert!(position.is_race());

        position.set_point(5, None, 0);
        position.set_point(21, Some(CheckerColor::White), 15);
        assert!(!position.is_race());
    }

    #[test]
    fn test_home_queries() {
        let mut position = Position::empty();
        position.set_point(4, Some(CheckerColor::White), 10);
        position.set_off(CheckerColor::White, 5);
        position.set_point(2, Some(CheckerColor::Red), 1);

        assert!(position.all_home(CheckerColor::White));
        assert!(position.has_checker_in_home_of(CheckerColor::Red, CheckerColor::White));
        assert!(!position.has_checker_in_home_of(CheckerColor::White, CheckerColor::Red));
    }

    #[test]
    fn test_serialization() {
        let position = Position::starting();
        let json = serde_json::to_string(&position).unwrap();
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(position, back);
    }
}
