//! The match controller.
//!
//! A [`Match`] plays games until one side reaches the target score. It owns
//! the dice, the clock and the scores; the game in progress owns the board
//! and the cube. Commands are forwarded to the current game, and a game
//! that finishes is scored immediately.
//!
//! ## Crawford rule
//!
//! The first time exactly one player reaches `target - 1`, the next game is
//! the Crawford game and nobody may double in it. It happens at most once
//! per match.
//!
//! ## Example
//!
//! ```
//! use rust_backgammon::core::{CheckerColor, MatchConfig};
//! use rust_backgammon::matchplay::Match;
//! use rust_backgammon::rules::WinType;
//!
//! let mut m = Match::new(MatchConfig::default().with_target_score(3));
//! m.start_next_game().unwrap();
//! m.complete_game(CheckerColor::White, WinType::Gammon).unwrap();
//!
//! assert_eq!(m.score(CheckerColor::White), 2);
//! assert!(m.is_crawford_game());
//! ```

use chrono::{DateTime, Utc};
use im::Vector;
use tracing::{debug, info, warn};

use super::record::GameRecord;
use crate::board::Move;
use crate::clock::{ClockView, MatchClock, TurnId};
use crate::core::{
    CheckerColor, ColorMap, DiceRng, DiceRngState, DiceRoll, ForfeitPolicy, MatchConfig,
};
use crate::error::{EngineError, Result};
use crate::notation::{sgf, SgfHeader};
use crate::rules::{DoublingCube, EndReason, Game, GameOutcome, WinType};
use crate::snapshot::MatchSummary;

/// A match to a target score.
#[derive(Clone, Debug)]
pub struct Match {
    config: MatchConfig,
    scores: ColorMap<u32>,
    records: Vector<GameRecord>,
    game: Option<Game>,
    game_recorded: bool,
    is_crawford_game: bool,
    crawford_played: bool,
    rng: DiceRng,
    game_dice: DiceRng,
    clock: MatchClock,
    winner: Option<CheckerColor>,
}

fn no_game() -> EngineError {
    EngineError::invalid_state("command", "no game in progress")
}

impl Match {
    /// New match with no game started yet.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        let rng = DiceRng::new(config.seed);
        Self {
            scores: ColorMap::with_value(0),
            records: Vector::new(),
            game: None,
            game_recorded: false,
            is_crawford_game: false,
            crawford_played: false,
            game_dice: rng.for_context("game-0"),
            rng,
            clock: MatchClock::from_config(&config.time_control),
            winner: None,
            config,
        }
    }

    /// Rebuild a match from its persistence projection.
    ///
    /// Finished games are replayed from their SGF records and must add up to
    /// the saved score. The game in progress resumes from its context, so its
    /// earlier turns are not in its history. The clock comes back stopped
    /// with the saved reserves; the next [`sync_clock`](Self::sync_clock)
    /// starts it.
    pub fn from_summary(summary: &MatchSummary) -> Result<Self> {
        let mut resumed = Self::new(summary.config());
        let max_cube = resumed.config.max_cube;

        for stored in &summary.games {
            let imported = sgf::import(&stored.record)?;
            if imported.game.outcome() != Some(&stored.outcome) {
                return Err(EngineError::invalid_state(
                    "from_summary",
                    format!("game {} does not replay to its saved result", stored.number),
                ));
            }
            let record = GameRecord {
                number: stored.number,
                crawford: stored.crawford,
                outcome: stored.outcome,
                points: stored.points,
                scores_before: resumed.scores,
                game: imported.game.with_max_cube(max_cube),
            };
            resumed.scores = record.scores_after();
            resumed.records.push_back(record);
        }
        if resumed.scores != summary.scores {
            return Err(EngineError::invalid_state(
                "from_summary",
                "saved games do not add up to the saved score",
            ));
        }

        match &summary.current {
            Some(context) => {
                let game = Game::restore(context.clone())?.with_max_cube(max_cube);
                if game.is_over() {
                    return Err(EngineError::invalid_state(
                        "from_summary",
                        "the game in progress is already over",
                    ));
                }
                resumed.game = Some(game);
            }
            None => {
                resumed.game = resumed.records.last().map(|record| record.game.clone());
                resumed.game_recorded = resumed.game.is_some();
            }
        }

        resumed.game_dice = DiceRng::from_state(&summary.dice);
        resumed.is_crawford_game = summary.is_crawford_game;
        resumed.crawford_played = summary.crawford_game_played;
        resumed.winner = summary.winner;
        if let Some(reserves) = summary.reserve_ms {
            resumed.clock.restore_reserves_ms(reserves);
        }
        info!(
            games = resumed.records.len(),
            in_progress = resumed.has_active_game(),
            "match resumed"
        );
        Ok(resumed)
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[must_use]
    pub fn scores(&self) -> ColorMap<u32> {
        self.scores
    }

    #[must_use]
    pub fn score(&self, color: CheckerColor) -> u32 {
        self.scores[color]
    }

    /// Finished games, oldest first.
    #[must_use]
    pub fn records(&self) -> &Vector<GameRecord> {
        &self.records
    }

    /// The current game, or the last one if it has finished.
    #[must_use]
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// 1-based number of the current (or last) game; 0 before the first.
    #[must_use]
    pub fn game_number(&self) -> u32 {
        let finished = self.records.len() as u32;
        match &self.game {
            Some(_) if !self.game_recorded => finished + 1,
            _ => finished,
        }
    }

    /// The current or next game is the Crawford game.
    #[must_use]
    pub fn is_crawford_game(&self) -> bool {
        self.is_crawford_game
    }

    #[must_use]
    pub fn crawford_played(&self) -> bool {
        self.crawford_played
    }

    #[must_use]
    pub fn winner(&self) -> Option<CheckerColor> {
        self.winner
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    #[must_use]
    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    #[must_use]
    pub fn clock_view(&self, now: DateTime<Utc>) -> ClockView {
        self.clock.view(now)
    }

    /// Checkpoint of the current game's dice stream.
    #[must_use]
    pub fn dice_state(&self) -> DiceRngState {
        self.game_dice.state()
    }

    /// A game is in progress (started and not over).
    #[must_use]
    pub fn has_active_game(&self) -> bool {
        self.game.as_ref().is_some_and(|game| !game.is_over())
    }

    // === Game sequencing ===

    /// Start the next game with the opening roll.
    ///
    /// Each game draws from its own dice stream derived from the match seed.
    pub fn start_next_game(&mut self) -> Result<&Game> {
        self.ensure_open()?;
        if self.has_active_game() {
            return Err(EngineError::invalid_state(
                "start_next_game",
                "the current game is still in progress",
            ));
        }

        let number = self.records.len() as u32 + 1;
        let mut dice = self.rng.for_context(&format!("game-{number}"));
        let game = Game::from_opening_roll(&mut dice)
            .with_crawford(self.is_crawford_game)
            .with_max_cube(self.config.max_cube);
        info!(
            game = number,
            crawford = self.is_crawford_game,
            first = %game.current_player(),
            "game started"
        );

        self.game_dice = dice;
        self.game_recorded = false;
        Ok(&*self.game.insert(game))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.winner.is_some() {
            Err(EngineError::MatchComplete)
        } else {
            Ok(())
        }
    }

    fn active_game(&mut self) -> Result<&mut Game> {
        self.ensure_open()?;
        self.game.as_mut().ok_or_else(no_game)
    }

    // === Forwarded commands ===

    pub fn roll_dice(&mut self) -> Result<DiceRoll> {
        self.ensure_open()?;
        let game = self.game.as_mut().ok_or_else(no_game)?;
        game.roll_dice(&mut self.game_dice)
    }

    pub fn set_dice(&mut self, first: u8, second: u8) -> Result<DiceRoll> {
        self.active_game()?.set_dice(first, second)
    }

    pub fn make_move(&mut self, from: u8, to: u8) -> Result<Move> {
        let mv = self.active_game()?.make_move(from, to)?;
        self.record_if_finished();
        Ok(mv)
    }

    pub fn undo_last_move(&mut self) -> Result<Move> {
        self.active_game()?.undo_last_move()
    }

    pub fn end_turn(&mut self) -> Result<()> {
        self.active_game()?.end_turn()
    }

    pub fn offer_double(&mut self) -> Result<u32> {
        self.active_game()?.offer_double()
    }

    pub fn accept_double(&mut self) -> Result<DoublingCube> {
        self.active_game()?.accept_double()
    }

    pub fn reject_double(&mut self) -> Result<GameOutcome> {
        let outcome = self.active_game()?.reject_double()?;
        self.record_if_finished();
        Ok(outcome)
    }

    // === Scoring ===

    /// End the current game as a win of the given size for `winner` and score it.
    ///
    /// Returns the points credited (cube × 1, 2 or 3).
    pub fn complete_game(&mut self, winner: CheckerColor, win_type: WinType) -> Result<u32> {
        self.active_game()?.resign(winner.opponent(), win_type)?;
        Ok(self.record_if_finished())
    }

    /// Forfeit the current game for `loser`; the forfeit policy decides the cost.
    pub fn forfeit(&mut self, loser: CheckerColor, reason: EndReason) -> Result<u32> {
        self.active_game()?.forfeit(loser, reason)?;
        Ok(self.record_if_finished())
    }

    fn points_for(&self, outcome: &GameOutcome) -> u32 {
        let stakes = outcome.stakes();
        match (outcome.reason, self.config.forfeit) {
            (EndReason::Timeout | EndReason::Forfeit, ForfeitPolicy::Match) => self
                .config
                .target_score
                .saturating_sub(self.scores[outcome.winner])
                .max(stakes),
            _ => stakes,
        }
    }

    /// Score the current game if it has just finished. Returns the points credited.
    fn record_if_finished(&mut self) -> u32 {
        if self.game_recorded {
            return 0;
        }
        let Some(game) = self.game.as_ref() else {
            return 0;
        };
        let Some(outcome) = game.outcome().copied() else {
            return 0;
        };

        let points = self.points_for(&outcome);
        let record = GameRecord {
            number: self.records.len() as u32 + 1,
            crawford: game.is_crawford(),
            outcome,
            points,
            scores_before: self.scores,
            game: game.clone(),
        };
        self.scores[outcome.winner] += points;
        self.records.push_back(record);
        self.game_recorded = true;
        info!(
            winner = %outcome.winner,
            points,
            white = self.scores[CheckerColor::White],
            red = self.scores[CheckerColor::Red],
            "game scored"
        );

        if self.is_crawford_game {
            self.crawford_played = true;
            self.is_crawford_game = false;
        }

        if self.scores[outcome.winner] >= self.config.target_score {
            self.winner = Some(outcome.winner);
            info!(winner = %outcome.winner, "match complete");
        } else if self.config.crawford && !self.crawford_played {
            let at_match_point = CheckerColor::ALL
                .iter()
                .filter(|&&color| self.scores[color] + 1 == self.config.target_score)
                .count();
            if at_match_point == 1 {
                self.is_crawford_game = true;
                debug!("next game is the Crawford game");
            }
        }

        points
    }

    // === Clock ===

    /// Point the clock at whoever must act now.
    pub fn sync_clock(&mut self, now: DateTime<Utc>) {
        let game_number = self.game_number();
        let actor = self
            .game
            .as_ref()
            .filter(|game| !game.is_over() && self.winner.is_none())
            .map(|game| (game.actor(), TurnId::new(game_number, game.turn_number())));
        self.clock.switch_to(actor, now);
    }

    /// Forfeit the running player if their time is up.
    ///
    /// Returns `TimeoutForfeit` once the forfeit has been applied.
    pub fn poll_clock(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.winner.is_some() || !self.has_active_game() {
            return Ok(());
        }
        let Some(loser) = self.clock.expired(now) else {
            return Ok(());
        };

        warn!(loser = %loser, "clock expired");
        let stakes = self.forfeit(loser, EndReason::Timeout)?;
        self.clock.switch_to(None, now);
        Err(EngineError::TimeoutForfeit { loser, stakes })
    }

    /// Run `command` under the clock: poll for a timeout first, then
    /// re-point the clock at the next actor.
    pub fn run_timed<T>(
        &mut self,
        now: DateTime<Utc>,
        command: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.poll_clock(now)?;
        let result = command(self);
        self.sync_clock(now);
        result
    }

    // === Import / export ===

    fn header(&self) -> SgfHeader {
        let scores = match (self.game_recorded, self.records.last()) {
            (true, Some(record)) => record.scores_before,
            _ => self.scores,
        };
        SgfHeader {
            match_length: Some(self.config.target_score),
            game_number: self.game_number(),
            scores,
        }
    }

    /// Replace the current game with the position in `text`.
    ///
    /// Nothing changes unless the whole document parses and replays.
    pub fn import_position(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        let imported = sgf::import(text)?;
        let game = imported.game.with_max_cube(self.config.max_cube);

        self.is_crawford_game = game.is_crawford();
        self.game = Some(game);
        self.game_recorded = false;
        self.record_if_finished();
        Ok(())
    }

    /// The current position as SGF.
    pub fn export_position(&self) -> Result<String> {
        let game = self.game.as_ref().ok_or_else(no_game)?;
        Ok(sgf::export_position(game, &self.header()))
    }

    /// The current game record as SGF.
    pub fn export_game_sgf(&self) -> Result<String> {
        let game = self.game.as_ref().ok_or_else(no_game)?;
        Ok(sgf::export_game(game, &self.header()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeControlConfig;
    use crate::error::DoubleDenial;
    use chrono::{Duration, TimeZone};

    fn started(config: MatchConfig) -> Match {
        let mut m = Match::new(config);
        m.start_next_game().unwrap();
        m
    }

    #[test]
    fn test_new_match() {
        let m = Match::new(MatchConfig::default());
        assert_eq!(m.scores(), ColorMap::with_value(0));
        assert!(m.game().is_none());
        assert_eq!(m.game_number(), 0);
        assert!(!m.is_complete());
    }

    #[test]
    fn test_commands_need_a_game() {
        let mut m = Match::new(MatchConfig::default());
        assert!(matches!(m.roll_dice(), Err(EngineError::InvalidState { .. })));
        assert!(m.export_position().is_err());
    }

    #[test]
    fn test_start_next_game_is_deterministic() {
        let a = started(MatchConfig::default().with_seed(9));
        let b = started(MatchConfig::default().with_seed(9));
        let (a, b) = (a.game().unwrap(), b.game().unwrap());
        assert_eq!(a.current_player(), b.current_player());
        assert_eq!(a.dice(), b.dice());
        assert!(!a.dice().unwrap().is_double());
    }

    #[test]
    fn test_cannot_start_over_active_game() {
        let mut m = started(MatchConfig::default());
        assert!(m.start_next_game().is_err());
    }

    #[test]
    fn test_complete_game_scores_cube_times_multiplier() {
        let mut m = started(MatchConfig::default().with_target_score(7));
        let points = m.complete_game(CheckerColor::Red, WinType::Backgammon).unwrap();
        assert_eq!(points, 3);
        assert_eq!(m.score(CheckerColor::Red), 3);
        assert_eq!(m.records().len(), 1);
        assert_eq!(m.records()[0].scores_after()[CheckerColor::Red], 3);
        assert_eq!(m.game_number(), 1);

        assert_eq!(m.complete_game(CheckerColor::Red, WinType::Normal), Err(EngineError::GameComplete));
    }

    #[test]
    fn test_crawford_sequence() {
        let mut m = started(MatchConfig::default().with_target_score(3));
        m.complete_game(CheckerColor::White, WinType::Gammon).unwrap();
        assert!(m.is_crawford_game());

        let game = m.start_next_game().unwrap();
        assert!(game.is_crawford());
        assert_eq!(
            game.double_denial(game.current_player()),
            Some(DoubleDenial::CrawfordGame)
        );

        m.complete_game(CheckerColor::Red, WinType::Gammon).unwrap();
        assert!(m.crawford_played());
        assert!(!m.is_crawford_game());

        // Both at match point now; no second Crawford game.
        let game = m.start_next_game().unwrap();
        assert!(!game.is_crawford());
        assert!(m.records()[1].crawford);
    }

    #[test]
    fn test_crawford_disabled() {
        let mut m = started(MatchConfig::default().with_target_score(3).with_crawford(false));
        m.complete_game(CheckerColor::White, WinType::Gammon).unwrap();
        assert!(!m.is_crawford_game());
    }

    #[test]
    fn test_match_completion() {
        let mut m = started(MatchConfig::default().with_target_score(1));
        m.complete_game(CheckerColor::White, WinType::Normal).unwrap();
        assert_eq!(m.winner(), Some(CheckerColor::White));
        assert_eq!(m.start_next_game().unwrap_err(), EngineError::MatchComplete);
        assert_eq!(m.roll_dice().unwrap_err(), EngineError::MatchComplete);
    }

    #[test]
    fn test_forfeit_policies() {
        let mut m = started(MatchConfig::default().with_target_score(5));
        assert_eq!(m.forfeit(CheckerColor::White, EndReason::Forfeit).unwrap(), 1);

        let mut m = started(
            MatchConfig::default()
                .with_target_score(5)
                .with_forfeit(ForfeitPolicy::Match),
        );
        assert_eq!(m.forfeit(CheckerColor::White, EndReason::Forfeit).unwrap(), 5);
        assert_eq!(m.winner(), Some(CheckerColor::Red));
    }

    #[test]
    fn test_live_timeout_forfeits() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut m = started(MatchConfig::default().with_time_control(TimeControlConfig::live(0, 5)));
        m.sync_clock(t0);
        let actor = m.game().unwrap().actor();

        assert!(m.poll_clock(t0 + Duration::seconds(4)).is_ok());
        let err = m.poll_clock(t0 + Duration::seconds(6)).unwrap_err();
        assert_eq!(err, EngineError::TimeoutForfeit { loser: actor, stakes: 1 });
        assert_eq!(m.score(actor.opponent()), 1);
        assert_eq!(m.game().unwrap().outcome().unwrap().reason, EndReason::Timeout);
        assert!(m.poll_clock(t0 + Duration::seconds(60)).is_ok());
    }

    #[test]
    fn test_run_timed_rejects_late_command() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut m = started(MatchConfig::default().with_time_control(TimeControlConfig::live(0, 5)));
        m.sync_clock(t0);

        let result = m.run_timed(t0 + Duration::seconds(10), |m| m.end_turn());
        assert!(matches!(result, Err(EngineError::TimeoutForfeit { .. })));
        assert_eq!(
            m.run_timed(t0 + Duration::seconds(11), |m| m.end_turn()),
            Err(EngineError::GameComplete)
        );
    }

    #[test]
    fn test_export_import_position() {
        let mut m = started(MatchConfig::default().with_target_score(7));
        let text = m.export_position().unwrap();
        assert!(text.contains("MI[length:7][game:1][ws:0][bs:0]"));

        let before = m.game().unwrap().context();
        m.import_position(&text).unwrap();
        assert_eq!(m.game().unwrap().context(), before);
        assert_eq!(m.export_position().unwrap(), text);

        assert!(m.import_position("(;GM[6]PL[Q])").is_err());
        assert_eq!(m.game().unwrap().context(), before);
    }
}
