//! Completed games within a match.

use crate::core::ColorMap;
use crate::notation::{sgf, SgfHeader};
use crate::rules::{Game, GameOutcome};

/// A finished game and what it did to the score.
#[derive(Clone, Debug)]
pub struct GameRecord {
    /// 1-based game number.
    pub number: u32,
    /// Whether this was the Crawford game.
    pub crawford: bool,
    pub outcome: GameOutcome,
    /// Points credited to the winner (may exceed the stakes after a
    /// match-forfeit).
    pub points: u32,
    /// Scores before the game.
    pub scores_before: ColorMap<u32>,
    /// The finished game, with its full turn history.
    pub game: Game,
}

impl GameRecord {
    /// Scores after the game.
    #[must_use]
    pub fn scores_after(&self) -> ColorMap<u32> {
        let mut scores = self.scores_before;
        scores[self.outcome.winner] += self.points;
        scores
    }

    /// The game as an SGF record, headed with its place in a match to
    /// `match_length`.
    #[must_use]
    pub fn to_sgf(&self, match_length: u32) -> String {
        let header = SgfHeader {
            match_length: Some(match_length),
            game_number: self.number,
            scores: self.scores_before,
        };
        sgf::export_game(&self.game, &header)
    }
}
