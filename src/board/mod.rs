//! Board representation and move generation.
//!
//! - `position`: points, bar and borne-off trays
//! - `moves`: single checker moves and move sequences
//! - `movegen`: legal move enumeration for a roll

pub mod movegen;
pub mod moves;
pub mod position;

pub use movegen::{legal_moves, single_moves, LegalMoves};
pub use moves::{Move, MoveSequence, BAR};
pub use position::{Point, Position, CHECKERS_PER_SIDE, POINT_COUNT};
