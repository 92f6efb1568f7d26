//! # rust-backgammon
//!
//! A deterministic backgammon game and match rules engine.
//!
//! ## Design Principles
//!
//! 1. **Commands In, Snapshots Out**: Games and matches change only through
//!    explicit commands (`roll_dice`, `make_move`, `offer_double`, ...).
//!    Every success can be projected into an immutable snapshot.
//!
//! 2. **One Phase Enum**: A single [`TurnPhase`] says what the game is
//!    waiting for; there are no scattered flags to keep in sync.
//!
//! 3. **Injected Time and Dice**: Clocks take `now` as an argument and dice
//!    come from a seedable [`DiceSource`], so every game replays exactly.
//!
//! ## Architecture
//!
//! - **Maximal-play move generation**: Legal plays are searched
//!   exhaustively, keeping only those that use as many dice as possible
//!   (and the higher die when only one can be played).
//!
//! - **Persistent history**: Turn history lives in an `im::Vector`, so
//!   cloning a game for snapshots or records is cheap.
//!
//! ## Modules
//!
//! - `core`: Colors, dice, RNG, configuration
//! - `board`: Positions, moves and legal move generation
//! - `rules`: The single-game turn and cube state machine
//! - `matchplay`: Matches to a target score, Crawford rule, forfeits
//! - `clock`: Live and correspondence time controls
//! - `notation`: SGF, GNU Backgammon position ids, move text
//! - `snapshot`: Read-only projections for transport and persistence
//! - `service`: Per-match locking, event broadcast, clock ticker

pub mod board;
pub mod clock;
pub mod core;
pub mod error;
pub mod matchplay;
pub mod notation;
pub mod rules;
pub mod service;
pub mod snapshot;

// Re-export commonly used types
pub use crate::core::{
    CheckerColor, ColorMap,
    DiceRoll, DiceRng, DiceRngState, DiceSource, FixedDice,
    ForfeitPolicy, MatchConfig, TimeControlConfig,
};

pub use crate::board::{legal_moves, LegalMoves, Move, MoveSequence, Position, BAR};

pub use crate::rules::{
    CubeOwner, DoublingCube,
    Game, GameContext,
    EndReason, GameOutcome, WinType,
    TurnPhase, TurnSnapshot,
};

pub use crate::matchplay::{GameRecord, Match};

pub use crate::clock::{ClockView, MatchClock};

pub use crate::error::{DoubleDenial, EngineError, ParseError, Result};

pub use crate::snapshot::{GameSnapshot, MatchSnapshot, MatchSummary};

pub use crate::service::{MatchEvent, MatchHandle, MatchId, MatchRegistry};
