//! Read-only projections of games and matches.
//!
//! Every successful command is followed by a snapshot for the caller to
//! broadcast or render. Snapshots are plain serde data; they never borrow
//! from the engine.
//!
//! [`MatchSummary`] is the persistence projection, with a compact bincode
//! checkpoint encoding. [`Match::from_summary`] reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{Move, Point};
use crate::clock::ClockView;
use crate::core::{
    CheckerColor, ColorMap, DiceRngState, DiceRoll, ForfeitPolicy, MatchConfig, TimeControlConfig,
};
use crate::matchplay::Match;
use crate::notation::position_id;
use crate::rules::{DoublingCube, Game, GameContext, GameOutcome, TurnPhase, WinType};

/// Everything a client needs to render one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub current_player: CheckerColor,
    /// Who must act (differs from `current_player` while a double is pending).
    pub actor: CheckerColor,
    pub phase: TurnPhase,
    pub turn_number: u32,
    pub dice: Option<DiceRoll>,
    pub remaining_dice: Vec<u8>,
    /// Points 1-24 from White's side; index 0 is point 1.
    pub points: Vec<Point>,
    pub bar: ColorMap<u8>,
    pub off: ColorMap<u8>,
    pub pip_counts: ColorMap<u32>,
    pub cube: DoublingCube,
    pub can_double: bool,
    /// Distinct legal first moves for the remaining dice.
    pub valid_moves: Vec<Move>,
    /// Moves already played this turn.
    pub turn_moves: Vec<Move>,
    pub position_id: String,
    pub outcome: Option<GameOutcome>,
}

impl GameSnapshot {
    #[must_use]
    pub fn winner(&self) -> Option<CheckerColor> {
        self.outcome.map(|outcome| outcome.winner)
    }

    #[must_use]
    pub fn win_type(&self) -> Option<WinType> {
        self.outcome.map(|outcome| outcome.win_type)
    }
}

impl Game {
    /// Project the game for display.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let position = self.position();
        let mut valid_moves = self.valid_moves();
        valid_moves.sort_unstable_by(|a, b| b.from.cmp(&a.from).then(a.to.cmp(&b.to)));

        GameSnapshot {
            current_player: self.current_player(),
            actor: self.actor(),
            phase: self.phase(),
            turn_number: self.turn_number(),
            dice: self.dice(),
            remaining_dice: self.remaining_dice().to_vec(),
            points: (1..=24).map(|point| position.point(point)).collect(),
            bar: ColorMap::new(|color| position.bar(color)),
            off: ColorMap::new(|color| position.off(color)),
            pip_counts: ColorMap::new(|color| position.pip_count(color)),
            cube: self.cube(),
            can_double: self.can_double(),
            valid_moves,
            turn_moves: self.turn_moves().moves().to_vec(),
            position_id: position_id::encode(position, self.current_player()),
            outcome: self.outcome().copied(),
        }
    }
}

/// A match as seen by its players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub target_score: u32,
    pub scores: ColorMap<u32>,
    pub game_number: u32,
    pub is_crawford_game: bool,
    pub crawford_game_played: bool,
    pub winner: Option<CheckerColor>,
    pub game: Option<GameSnapshot>,
    pub clock: ClockView,
}

/// One finished game in a [`MatchSummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub number: u32,
    pub crawford: bool,
    pub outcome: GameOutcome,
    pub points: u32,
    pub turns: u32,
    /// The full game as SGF.
    pub record: String,
}

/// Clock settings as stored in a [`MatchSummary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredTimeControl {
    Disabled,
    Live { delay_seconds: u32, reserve_seconds: u32 },
    Correspondence { time_per_move_days: u32 },
}

impl From<TimeControlConfig> for StoredTimeControl {
    fn from(config: TimeControlConfig) -> Self {
        match config {
            TimeControlConfig::Disabled => Self::Disabled,
            TimeControlConfig::Live {
                delay_seconds,
                reserve_seconds,
            } => Self::Live {
                delay_seconds,
                reserve_seconds,
            },
            TimeControlConfig::Correspondence { time_per_move_days } => {
                Self::Correspondence { time_per_move_days }
            }
        }
    }
}

impl From<StoredTimeControl> for TimeControlConfig {
    fn from(stored: StoredTimeControl) -> Self {
        match stored {
            StoredTimeControl::Disabled => Self::Disabled,
            StoredTimeControl::Live {
                delay_seconds,
                reserve_seconds,
            } => Self::live(delay_seconds, reserve_seconds),
            StoredTimeControl::Correspondence { time_per_move_days } => {
                Self::correspondence(time_per_move_days)
            }
        }
    }
}

/// Persistence projection of a match.
///
/// Holds only externally tagged data so it survives the bincode encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub target_score: u32,
    pub crawford_rule: bool,
    pub max_cube: u32,
    pub time_control: StoredTimeControl,
    pub forfeit: ForfeitPolicy,
    pub seed: u64,
    pub scores: ColorMap<u32>,
    pub games: Vec<GameSummary>,
    pub is_crawford_game: bool,
    pub crawford_game_played: bool,
    pub winner: Option<CheckerColor>,
    /// Resumable state of the game in progress.
    pub current: Option<GameContext>,
    /// Dice stream checkpoint for the game in progress.
    pub dice: DiceRngState,
    /// Live clock reserves as of the last time they were charged.
    pub reserve_ms: Option<ColorMap<i64>>,
}

impl MatchSummary {
    /// Compact binary checkpoint.
    pub fn to_bytes(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }

    /// The configuration the match was played under.
    #[must_use]
    pub fn config(&self) -> MatchConfig {
        MatchConfig {
            target_score: self.target_score,
            crawford: self.crawford_rule,
            max_cube: self.max_cube,
            time_control: self.time_control.into(),
            forfeit: self.forfeit,
            seed: self.seed,
        }
    }
}

impl Match {
    /// Project the match at `now` (the clock view depends on it).
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> MatchSnapshot {
        MatchSnapshot {
            target_score: self.config().target_score,
            scores: self.scores(),
            game_number: self.game_number(),
            is_crawford_game: self.is_crawford_game(),
            crawford_game_played: self.crawford_played(),
            winner: self.winner(),
            game: self.game().map(Game::snapshot),
            clock: self.clock_view(now),
        }
    }

    /// Persistence projection.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        let config = self.config();
        MatchSummary {
            target_score: config.target_score,
            crawford_rule: config.crawford,
            max_cube: config.max_cube,
            time_control: config.time_control.into(),
            forfeit: config.forfeit,
            seed: config.seed,
            scores: self.scores(),
            games: self
                .records()
                .iter()
                .map(|record| GameSummary {
                    number: record.number,
                    crawford: record.crawford,
                    outcome: record.outcome,
                    points: record.points,
                    turns: record.game.history().len() as u32,
                    record: record.to_sgf(config.target_score),
                })
                .collect(),
            is_crawford_game: self.is_crawford_game(),
            crawford_game_played: self.crawford_played(),
            winner: self.winner(),
            current: self
                .game()
                .filter(|game| !game.is_over())
                .map(Game::context),
            dice: self.dice_state(),
            reserve_ms: self.clock().banked_reserves_ms(),
        }
    }
}
