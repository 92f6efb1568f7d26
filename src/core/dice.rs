//! Dice rolls and per-turn die bookkeeping.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Up to four usable die values (doubles expand to four).
pub type DieValues = SmallVec<[u8; 4]>;

/// Two dice faces, each in `1..=6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll {
    first: u8,
    second: u8,
}

impl DiceRoll {
    /// Create a roll, returning `None` if a face is outside `1..=6`.
    #[must_use]
    pub fn new(first: u8, second: u8) -> Option<Self> {
        if (1..=6).contains(&first) && (1..=6).contains(&second) {
            Some(Self { first, second })
        } else {
            None
        }
    }

    /// Create a roll, pulling out-of-range faces into `1..=6`.
    #[must_use]
    pub fn clamped(first: u8, second: u8) -> Self {
        Self {
            first: first.clamp(1, 6),
            second: second.clamp(1, 6),
        }
    }

    /// First face as rolled.
    #[must_use]
    pub const fn first(self) -> u8 {
        self.first
    }

    /// Second face as rolled.
    #[must_use]
    pub const fn second(self) -> u8 {
        self.second
    }

    /// Both faces are equal.
    #[must_use]
    pub const fn is_double(self) -> bool {
        self.first == self.second
    }

    /// Larger face first, the conventional way to write a roll ("31", "66").
    #[must_use]
    pub fn normalized(self) -> (u8, u8) {
        (self.first.max(self.second), self.first.min(self.second))
    }

    /// Usable die values for the turn: four values for doubles, two otherwise.
    ///
    /// ```
    /// use rust_backgammon::core::DiceRoll;
    ///
    /// let roll = DiceRoll::new(6, 6).unwrap();
    /// assert_eq!(roll.values().as_slice(), &[6, 6, 6, 6]);
    ///
    /// let roll = DiceRoll::new(1, 3).unwrap();
    /// assert_eq!(roll.values().as_slice(), &[3, 1]);
    /// ```
    #[must_use]
    pub fn values(self) -> DieValues {
        let (high, low) = self.normalized();
        if self.is_double() {
            SmallVec::from_slice(&[high; 4])
        } else {
            SmallVec::from_slice(&[high, low])
        }
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (high, low) = self.normalized();
        write!(f, "{high}{low}")
    }
}

/// Remove one occurrence of `die` from `values`. Returns false if absent.
pub fn take_die(values: &mut DieValues, die: u8) -> bool {
    match values.iter().position(|&v| v == die) {
        Some(index) => {
            values.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faces_validated() {
        assert!(DiceRoll::new(0, 3).is_none());
        assert!(DiceRoll::new(3, 7).is_none());
        assert!(DiceRoll::new(1, 6).is_some());
    }

    #[test]
    fn test_values() {
        let roll = DiceRoll::new(2, 5).unwrap();
        assert!(!roll.is_double());
        assert_eq!(roll.values().as_slice(), &[5, 2]);
        assert_eq!(roll.to_string(), "52");

        let double = DiceRoll::new(4, 4).unwrap();
        assert!(double.is_double());
        assert_eq!(double.values().len(), 4);
    }

    #[test]
    fn test_take_die() {
        let mut values = DiceRoll::new(3, 3).unwrap().values();
        assert!(take_die(&mut values, 3));
        assert_eq!(values.len(), 3);
        assert!(!take_die(&mut values, 5));
        assert_eq!(values.len(), 3);
    }
}
