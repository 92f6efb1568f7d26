//! The doubling cube.
//!
//! The cube starts centered at 1. Accepting a double doubles its value and
//! hands ownership to the acceptor; only the owner may redouble.

use serde::{Deserialize, Serialize};

use crate::core::CheckerColor;

/// Who may turn the cube next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeOwner {
    /// Either player may double.
    #[default]
    Centered,
    /// Only this player may redouble.
    OwnedBy(CheckerColor),
}

/// Cube value and ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoublingCube {
    value: u32,
    owner: CubeOwner,
}

impl Default for DoublingCube {
    fn default() -> Self {
        Self::new()
    }
}

impl DoublingCube {
    /// Centered cube at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: 1,
            owner: CubeOwner::Centered,
        }
    }

    /// Cube at an arbitrary state. Returns `None` unless `value` is a power of two.
    #[must_use]
    pub fn at(value: u32, owner: CubeOwner) -> Option<Self> {
        value.is_power_of_two().then_some(Self { value, owner })
    }

    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub const fn owner(&self) -> CubeOwner {
        self.owner
    }

    #[must_use]
    pub const fn is_centered(&self) -> bool {
        matches!(self.owner, CubeOwner::Centered)
    }

    /// Ownership alone allows `color` to double (ignores phase and Crawford).
    #[must_use]
    pub fn available_to(&self, color: CheckerColor) -> bool {
        match self.owner {
            CubeOwner::Centered => true,
            CubeOwner::OwnedBy(owner) => owner == color,
        }
    }

    /// Value after the next double.
    #[must_use]
    pub const fn next_value(&self) -> u32 {
        self.value.saturating_mul(2)
    }

    /// Apply an accepted double.
    pub fn accept(&mut self, acceptor: CheckerColor) {
        self.value = self.next_value();
        self.owner = CubeOwner::OwnedBy(acceptor);
    }
}
