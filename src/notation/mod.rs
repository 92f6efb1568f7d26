//! Text notations for positions, games and moves.
//!
//! - `sgf`: backgammon SGF records (positions and full games)
//! - `position_id`: GNU Backgammon position ids
//! - `move_text`: `8/5 6/5` style move notation

pub mod move_text;
pub mod position_id;
pub mod sgf;

pub use move_text::{find_play, format_play, parse_play};
pub use sgf::{canonicalize, export_game, export_position, import, SgfGame, SgfHeader};
