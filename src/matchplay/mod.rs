//! Matches: games to a target score with Crawford, forfeits and the clock.

mod controller;
mod record;

pub use controller::Match;
pub use record::GameRecord;
