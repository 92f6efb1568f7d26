//! Game rules: the turn state machine and the doubling cube.
//!
//! [`Game`] owns a position, the dice of the turn in progress, the cube and
//! the turn history. It is mutated only through its commands:
//! - `roll_dice` / `set_dice`
//! - `make_move` / `undo_last_move` / `end_turn`
//! - `offer_double` / `accept_double` / `reject_double`
//!
//! and becomes immutable once it has a [`GameOutcome`].

pub mod cube;
pub mod game;
pub mod history;
pub mod outcome;
pub mod phase;

pub use cube::{CubeOwner, DoublingCube};
pub use game::{Game, GameContext};
pub use history::{DoublingAction, TurnSnapshot};
pub use outcome::{EndReason, GameOutcome, WinType};
pub use phase::TurnPhase;
