//! Checker colors and per-color data storage.
//!
//! ## CheckerColor
//!
//! The two sides of a backgammon game. White moves from point 24 down to
//! point 1 and bears off past point 1; Red moves from point 1 up to point 24
//! and bears off past point 24.
//!
//! ## ColorMap
//!
//! Fixed two-slot storage indexed by `CheckerColor` for O(1) access.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One side of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckerColor {
    White,
    Red,
}

impl CheckerColor {
    /// Both colors, White first.
    pub const ALL: [CheckerColor; 2] = [CheckerColor::White, CheckerColor::Red];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            CheckerColor::White => CheckerColor::Red,
            CheckerColor::Red => CheckerColor::White,
        }
    }

    /// Slot index (White = 0, Red = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            CheckerColor::White => 0,
            CheckerColor::Red => 1,
        }
    }

    /// Movement direction along absolute point numbers.
    #[must_use]
    pub const fn direction(self) -> i8 {
        match self {
            CheckerColor::White => -1,
            CheckerColor::Red => 1,
        }
    }

    /// Absolute destination number used when bearing off.
    #[must_use]
    pub const fn off_point(self) -> u8 {
        match self {
            CheckerColor::White => 0,
            CheckerColor::Red => 25,
        }
    }

    /// Convert an absolute point (1-24) into this color's own numbering,
    /// where 1 is the deepest home point and 24 the farthest point.
    #[must_use]
    pub const fn relative_point(self, point: u8) -> u8 {
        match self {
            CheckerColor::White => point,
            CheckerColor::Red => 25 - point,
        }
    }

    /// Inverse of [`relative_point`](Self::relative_point).
    #[must_use]
    pub const fn absolute_point(self, relative: u8) -> u8 {
        // The mapping is its own inverse.
        self.relative_point(relative)
    }

    /// Absolute point reached when entering from the bar with `die`.
    #[must_use]
    pub const fn entry_point(self, die: u8) -> u8 {
        self.absolute_point(25 - die)
    }

    /// Whether an absolute point lies in this color's home board.
    #[must_use]
    pub const fn is_home_point(self, point: u8) -> bool {
        let relative = self.relative_point(point);
        relative >= 1 && relative <= 6
    }

    /// Single-letter code used by text notations (`W` / `B`).
    ///
    /// Red plays the side SGF calls "Black".
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            CheckerColor::White => 'W',
            CheckerColor::Red => 'B',
        }
    }

    /// Parse a notation code produced by [`code`](Self::code).
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'W' => Some(CheckerColor::White),
            'B' | 'R' => Some(CheckerColor::Red),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckerColor::White => write!(f, "White"),
            CheckerColor::Red => write!(f, "Red"),
        }
    }
}

/// Per-color data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use rust_backgammon::core::{CheckerColor, ColorMap};
///
/// let mut score: ColorMap<u32> = ColorMap::with_value(0);
/// score[CheckerColor::Red] += 2;
///
/// assert_eq!(score[CheckerColor::White], 0);
/// assert_eq!(score[CheckerColor::Red], 2);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorMap<T> {
    data: [T; 2],
}

impl<T> ColorMap<T> {
    /// Create a map with values from a factory function.
    pub fn new(factory: impl Fn(CheckerColor) -> T) -> Self {
        Self {
            data: [factory(CheckerColor::White), factory(CheckerColor::Red)],
        }
    }

    /// Create a map with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            data: [value.clone(), value],
        }
    }

    /// Get a reference to a color's data.
    #[must_use]
    pub fn get(&self, color: CheckerColor) -> &T {
        &self.data[color.index()]
    }

    /// Get a mutable reference to a color's data.
    pub fn get_mut(&mut self, color: CheckerColor) -> &mut T {
        &mut self.data[color.index()]
    }

    /// Iterate over (CheckerColor, &T) pairs, White first.
    pub fn iter(&self) -> impl Iterator<Item = (CheckerColor, &T)> {
        CheckerColor::ALL.into_iter().zip(self.data.iter())
    }

    /// Transform every entry.
    pub fn map<U>(&self, f: impl Fn(CheckerColor, &T) -> U) -> ColorMap<U> {
        ColorMap::new(|color| f(color, self.get(color)))
    }
}

impl<T> Index<CheckerColor> for ColorMap<T> {
    type Output = T;

    fn index(&self, color: CheckerColor) -> &Self::Output {
        self.get(color)
    }
}

impl<T> IndexMut<CheckerColor> for ColorMap<T> {
    fn index_mut(&mut self, color: CheckerColor) -> &mut Self::Output {
        self.get_mut(color)
    }
}
