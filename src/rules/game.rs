//! A single game: turn state machine and doubling cube.
//!
//! ## Turn flow
//!
//! ```text
//! AwaitingRoll ──roll──▶ AwaitingMove ──move/undo──▶ TurnComplete ──end_turn──▶ AwaitingRoll
//!      │                                                                         (opponent)
//!      └─offer_double─▶ AwaitingDoubleResponse ──accept──▶ AwaitingRoll (same player)
//!                                             └─reject──▶ GameOver
//! ```
//!
//! Every command validates first and mutates second, so a rejected command
//! leaves the game untouched.
//!
//! ## Example
//!
//! ```
//! use rust_backgammon::core::CheckerColor;
//! use rust_backgammon::rules::{Game, TurnPhase};
//!
//! let mut game = Game::new(CheckerColor::White);
//! game.set_dice(3, 1).unwrap();
//! game.make_move(8, 5).unwrap();
//! game.make_move(6, 5).unwrap();
//! assert_eq!(game.phase(), TurnPhase::TurnComplete);
//!
//! game.end_turn().unwrap();
//! assert_eq!(game.current_player(), CheckerColor::Red);
//! assert_eq!(game.history().len(), 1);
//! ```

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cube::DoublingCube;
use super::history::{DoublingAction, TurnSnapshot};
use super::outcome::{EndReason, GameOutcome, WinType};
use super::phase::TurnPhase;
use crate::board::{legal_moves, LegalMoves, Move, MoveSequence, Position};
use crate::core::dice::take_die;
use crate::core::{CheckerColor, DiceRoll, DiceSource, DieValues, DEFAULT_MAX_CUBE};
use crate::error::{DoubleDenial, EngineError, ParseError, Result};
use crate::notation::position_id;

/// Everything needed to resume a game at the start of (or during) a turn.
///
/// This is what position import/export carries: no history, just the
/// present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub position: Position,
    /// Player whose turn it is.
    pub player: CheckerColor,
    pub cube: DoublingCube,
    /// Dice rolled this turn, if any.
    pub dice: Option<DiceRoll>,
    /// Dice still to play. Ignored when `dice` is `None`.
    pub remaining: DieValues,
    /// Value offered by `player` and awaiting a response.
    pub pending_double: Option<u32>,
    pub crawford: bool,
}

impl GameContext {
    /// Starting position, `player` to roll, centered cube.
    #[must_use]
    pub fn starting(player: CheckerColor) -> Self {
        Self {
            position: Position::starting(),
            player,
            cube: DoublingCube::new(),
            dice: None,
            remaining: DieValues::new(),
            pending_double: None,
            crawford: false,
        }
    }
}

/// One game of backgammon.
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    player: CheckerColor,
    phase: TurnPhase,
    dice: Option<DiceRoll>,
    remaining: DieValues,
    turn_moves: MoveSequence,
    legal: LegalMoves,
    cube: DoublingCube,
    max_cube: u32,
    crawford: bool,
    turn_number: u32,
    turn_doubling: Option<DoublingAction>,
    history: Vector<TurnSnapshot>,
    outcome: Option<GameOutcome>,
    start: GameContext,
}

impl Game {
    /// Starting position with `first_player` to roll.
    #[must_use]
    pub fn new(first_player: CheckerColor) -> Self {
        let start = GameContext::starting(first_player);
        Self {
            position: start.position,
            player: first_player,
            phase: TurnPhase::AwaitingRoll,
            dice: None,
            remaining: DieValues::new(),
            turn_moves: MoveSequence::new(),
            legal: LegalMoves::default(),
            cube: start.cube,
            max_cube: DEFAULT_MAX_CUBE,
            crawford: false,
            turn_number: 1,
            turn_doubling: None,
            history: Vector::new(),
            outcome: None,
            start,
        }
    }

    /// Start with the standard opening roll.
    ///
    /// Each side rolls one die until they differ; the higher die moves first
    /// and plays both dice, so the game begins in `AwaitingMove`.
    pub fn from_opening_roll(dice: &mut impl DiceSource) -> Self {
        let (white, red) = loop {
            let white = dice.roll_die();
            let red = dice.roll_die();
            if white != red {
                break (white, red);
            }
        };
        let first = if white > red {
            CheckerColor::White
        } else {
            CheckerColor::Red
        };

        let mut game = Self::new(first);
        let roll = DiceRoll::clamped(white, red);
        debug!(first = %first, roll = %roll, "opening roll");
        game.begin_moving(roll);
        game
    }

    /// Resume from a saved context. The position must hold 15 checkers per side.
    ///
    /// A position where one side has borne off everything resumes as a
    /// finished game.
    pub fn restore(context: GameContext) -> Result<Self> {
        context.position.validate()?;
        let mut borne_off = CheckerColor::ALL
            .into_iter()
            .filter(|&color| context.position.has_borne_off_all(color));
        let winner = borne_off.next();
        if borne_off.next().is_some() || (winner.is_some() && context.pending_double.is_some()) {
            return Err(ParseError::InvalidValue {
                property: "position".to_string(),
                value: "game is already over".to_string(),
            }
            .into());
        }

        let mut game = Self::new(context.player);
        game.position = context.position;
        game.cube = context.cube;
        game.crawford = context.crawford;

        if let Some(new_value) = context.pending_double {
            if context.dice.is_some() || new_value != context.cube.next_value() {
                return Err(ParseError::InvalidValue {
                    property: "pending double".to_string(),
                    value: new_value.to_string(),
                }
                .into());
            }
            game.phase = TurnPhase::AwaitingDoubleResponse {
                offered_by: context.player,
                new_value,
            };
        } else if let Some(roll) = context.dice {
            let mut pool = roll.values();
            for &die in &context.remaining {
                if !take_die(&mut pool, die) {
                    return Err(ParseError::InvalidValue {
                        property: "remaining dice".to_string(),
                        value: die.to_string(),
                    }
                    .into());
                }
            }
            game.dice = Some(roll);
            game.remaining = context.remaining.clone();
            game.remaining.sort_unstable_by(|a, b| b.cmp(a));
            game.refresh_legal();
        }
        if let Some(winner) = winner {
            game.outcome = Some(GameOutcome {
                winner,
                win_type: WinType::classify(&game.position, winner),
                cube_value: game.cube.value(),
                reason: EndReason::BearOff,
            });
            game.phase = TurnPhase::GameOver;
            game.legal = LegalMoves::default();
        }

        game.start = GameContext {
            remaining: game.remaining.clone(),
            ..context
        };
        Ok(game)
    }

    /// Mark this as the Crawford game (doubling disabled).
    pub fn with_crawford(mut self, crawford: bool) -> Self {
        self.crawford = crawford;
        self.start.crawford = crawford;
        self
    }

    /// Set the highest value the cube may reach.
    pub fn with_max_cube(mut self, max_cube: u32) -> Self {
        self.max_cube = max_cube.max(1);
        self
    }

    /// Start with a turned cube.
    pub fn with_cube(mut self, cube: DoublingCube) -> Self {
        self.cube = cube;
        self.start.cube = cube;
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> CheckerColor {
        self.player
    }

    /// Player who must act next: the responder while a double is pending.
    #[must_use]
    pub fn actor(&self) -> CheckerColor {
        match self.phase {
            TurnPhase::AwaitingDoubleResponse { offered_by, .. } => offered_by.opponent(),
            _ => self.player,
        }
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Dice rolled this turn.
    #[must_use]
    pub fn dice(&self) -> Option<DiceRoll> {
        self.dice
    }

    /// Die values not yet played, highest first.
    #[must_use]
    pub fn remaining_dice(&self) -> &[u8] {
        &self.remaining
    }

    /// Moves played so far this turn.
    #[must_use]
    pub fn turn_moves(&self) -> &MoveSequence {
        &self.turn_moves
    }

    /// Legal continuations for the remaining dice.
    #[must_use]
    pub fn legal_moves(&self) -> &LegalMoves {
        &self.legal
    }

    /// Moves that may be played next.
    #[must_use]
    pub fn valid_moves(&self) -> Vec<Move> {
        self.legal.first_moves()
    }

    #[must_use]
    pub fn cube(&self) -> DoublingCube {
        self.cube
    }

    #[must_use]
    pub fn max_cube(&self) -> u32 {
        self.max_cube
    }

    #[must_use]
    pub fn is_crawford(&self) -> bool {
        self.crawford
    }

    /// 1-based number of the turn in progress.
    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Completed turns, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<TurnSnapshot> {
        &self.history
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Context the game started from.
    #[must_use]
    pub fn start_context(&self) -> &GameContext {
        &self.start
    }

    /// The present state as a resumable context.
    ///
    /// A game that ended with a double unanswered still reports the offer.
    #[must_use]
    pub fn context(&self) -> GameContext {
        let pending_double = match (self.phase, self.turn_doubling) {
            (TurnPhase::AwaitingDoubleResponse { new_value, .. }, _) => Some(new_value),
            (TurnPhase::GameOver, Some(DoublingAction::Offered { value })) => Some(value),
            _ => None,
        };
        GameContext {
            position: self.position,
            player: self.player,
            cube: self.cube,
            dice: self.dice,
            remaining: self.remaining.clone(),
            pending_double,
            crawford: self.crawford,
        }
    }

    // === Dice ===

    /// Roll from `dice`. Only valid while awaiting the roll.
    pub fn roll_dice(&mut self, dice: &mut impl DiceSource) -> Result<DiceRoll> {
        self.expect_roll_phase("roll_dice")?;
        let roll = dice.roll();
        self.begin_moving(roll);
        Ok(roll)
    }

    /// Use fixed dice instead of rolling (analysis, puzzles, replays).
    pub fn set_dice(&mut self, first: u8, second: u8) -> Result<DiceRoll> {
        self.expect_roll_phase("set_dice")?;
        let roll = DiceRoll::new(first, second).ok_or_else(|| {
            EngineError::invalid_state("set_dice", format!("die faces {first}-{second} out of range"))
        })?;
        self.begin_moving(roll);
        Ok(roll)
    }

    fn expect_roll_phase(&self, operation: &'static str) -> Result<()> {
        self.ensure_active()?;
        match self.phase {
            TurnPhase::AwaitingRoll => Ok(()),
            phase => Err(EngineError::invalid_state(operation, format!("game is {phase}"))),
        }
    }

    fn begin_moving(&mut self, roll: DiceRoll) {
        self.dice = Some(roll);
        self.remaining = roll.values();
        self.turn_moves = MoveSequence::new();
        self.refresh_legal();
        debug!(
            player = %self.player,
            roll = %roll,
            playable = self.legal.max_dice(),
            "dice rolled"
        );
    }

    fn refresh_legal(&mut self) {
        self.legal = legal_moves(&self.position, self.player, &self.remaining);
        self.phase = if self.legal.is_empty() {
            TurnPhase::TurnComplete
        } else {
            TurnPhase::AwaitingMove
        };
    }

    // === Moves ===

    /// Move one checker `from` → `to` (0 = bar; 0/25 = off).
    ///
    /// The move must begin some maximal play of the remaining dice.
    pub fn make_move(&mut self, from: u8, to: u8) -> Result<Move> {
        self.expect_moving("make_move")?;
        let mv = self
            .legal
            .find_first(self.player, from, to)
            .ok_or(EngineError::IllegalMove { from, to })?;

        self.position.apply_move(self.player, &mv);
        take_die(&mut self.remaining, mv.die);
        self.turn_moves.push(mv);
        self.refresh_legal();

        if self.position.has_borne_off_all(self.player) {
            let snapshot = self.snapshot_turn();
            self.history.push_back(snapshot);
            let outcome = GameOutcome {
                winner: self.player,
                win_type: WinType::classify(&self.position, self.player),
                cube_value: self.cube.value(),
                reason: EndReason::BearOff,
            };
            self.finish(outcome);
        }

        Ok(mv)
    }

    /// Take back the latest move of this turn.
    pub fn undo_last_move(&mut self) -> Result<Move> {
        self.expect_moving("undo_last_move")?;
        let mv = self
            .turn_moves
            .pop()
            .ok_or_else(|| EngineError::invalid_state("undo_last_move", "no moves this turn"))?;

        self.position.unapply_move(self.player, &mv);
        self.remaining.push(mv.die);
        self.remaining.sort_unstable_by(|a, b| b.cmp(a));
        self.refresh_legal();
        Ok(mv)
    }

    /// Finish the turn. Fails while a legal move remains.
    pub fn end_turn(&mut self) -> Result<()> {
        self.expect_moving("end_turn")?;
        if !self.legal.is_empty() {
            return Err(EngineError::TurnNotComplete {
                remaining_dice: self.legal.max_dice(),
            });
        }

        let snapshot = self.snapshot_turn();
        debug!(
            turn = snapshot.turn_number,
            player = %snapshot.player,
            moves = snapshot.moves.len(),
            "turn ended"
        );
        self.history.push_back(snapshot);

        self.player = self.player.opponent();
        self.dice = None;
        self.remaining.clear();
        self.turn_moves = MoveSequence::new();
        self.legal = LegalMoves::default();
        self.turn_doubling = None;
        self.turn_number += 1;
        self.phase = TurnPhase::AwaitingRoll;
        Ok(())
    }

    fn expect_moving(&self, operation: &'static str) -> Result<()> {
        self.ensure_active()?;
        if self.phase.is_moving() {
            Ok(())
        } else {
            Err(EngineError::invalid_state(operation, format!("game is {}", self.phase)))
        }
    }

    // === Cube ===

    /// Why `color` may not double right now, or `None` if they may.
    #[must_use]
    pub fn double_denial(&self, color: CheckerColor) -> Option<DoubleDenial> {
        if self.crawford {
            return Some(DoubleDenial::CrawfordGame);
        }
        if matches!(self.phase, TurnPhase::AwaitingDoubleResponse { .. }) {
            return Some(DoubleDenial::DoublePending);
        }
        if color != self.player || self.phase == TurnPhase::GameOver {
            return Some(DoubleDenial::NotYourTurn);
        }
        if self.phase.is_moving() {
            return Some(DoubleDenial::DiceAlreadyRolled);
        }
        if !self.cube.available_to(color) {
            return Some(DoubleDenial::CubeOwnedByOpponent);
        }
        if self.cube.next_value() > self.max_cube {
            return Some(DoubleDenial::CubeAtMaximum);
        }
        None
    }

    /// The current player may double now.
    #[must_use]
    pub fn can_double(&self) -> bool {
        self.outcome.is_none() && self.double_denial(self.player).is_none()
    }

    /// Offer a double on behalf of the current player. Returns the proposed value.
    pub fn offer_double(&mut self) -> Result<u32> {
        self.ensure_active()?;
        if let Some(denial) = self.double_denial(self.player) {
            return Err(EngineError::DoubleNotAllowed(denial));
        }

        let new_value = self.cube.next_value();
        self.phase = TurnPhase::AwaitingDoubleResponse {
            offered_by: self.player,
            new_value,
        };
        debug!(player = %self.player, new_value, "double offered");
        Ok(new_value)
    }

    /// Take the pending double. The doubler then rolls.
    pub fn accept_double(&mut self) -> Result<DoublingCube> {
        let (offered_by, new_value) = self.pending_double("accept_double")?;

        self.cube.accept(offered_by.opponent());
        self.turn_doubling = Some(DoublingAction::Accepted { value: new_value });
        self.phase = TurnPhase::AwaitingRoll;
        debug!(player = %offered_by.opponent(), value = new_value, "double accepted");
        Ok(self.cube)
    }

    /// Drop the pending double: the doubler wins the pre-double value.
    pub fn reject_double(&mut self) -> Result<GameOutcome> {
        let (offered_by, new_value) = self.pending_double("reject_double")?;

        self.turn_doubling = Some(DoublingAction::Rejected { value: new_value });
        let snapshot = self.snapshot_turn();
        self.history.push_back(snapshot);

        let outcome = GameOutcome {
            winner: offered_by,
            win_type: WinType::Normal,
            cube_value: self.cube.value(),
            reason: EndReason::DoubleRejected,
        };
        self.finish(outcome);
        Ok(outcome)
    }

    fn pending_double(&self, operation: &'static str) -> Result<(CheckerColor, u32)> {
        self.ensure_active()?;
        match self.phase {
            TurnPhase::AwaitingDoubleResponse {
                offered_by,
                new_value,
            } => Ok((offered_by, new_value)),
            phase => Err(EngineError::invalid_state(operation, format!("game is {phase}"))),
        }
    }

    // === Termination ===

    /// End the game against `loser` at the current cube value.
    pub fn forfeit(&mut self, loser: CheckerColor, reason: EndReason) -> Result<GameOutcome> {
        self.ensure_active()?;
        self.record_open_turn();
        let outcome = GameOutcome {
            winner: loser.opponent(),
            win_type: WinType::Normal,
            cube_value: self.cube.value(),
            reason,
        };
        self.finish(outcome);
        Ok(outcome)
    }

    /// `loser` concedes a result of the given size.
    pub fn resign(&mut self, loser: CheckerColor, win_type: WinType) -> Result<GameOutcome> {
        self.ensure_active()?;
        self.record_open_turn();
        let outcome = GameOutcome {
            winner: loser.opponent(),
            win_type,
            cube_value: self.cube.value(),
            reason: EndReason::Resigned,
        };
        self.finish(outcome);
        Ok(outcome)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.outcome.is_some() {
            Err(EngineError::GameComplete)
        } else {
            Ok(())
        }
    }

    /// Push the turn in progress to the history if anything happened in it.
    fn record_open_turn(&mut self) {
        if let TurnPhase::AwaitingDoubleResponse { new_value, .. } = self.phase {
            self.turn_doubling = Some(DoublingAction::Offered { value: new_value });
        }
        if self.dice.is_some() || self.turn_doubling.is_some() {
            let snapshot = self.snapshot_turn();
            self.history.push_back(snapshot);
        }
    }

    fn finish(&mut self, outcome: GameOutcome) {
        info!(
            winner = %outcome.winner,
            win_type = ?outcome.win_type,
            reason = ?outcome.reason,
            stakes = outcome.stakes(),
            "game over"
        );
        self.outcome = Some(outcome);
        self.phase = TurnPhase::GameOver;
        self.legal = LegalMoves::default();
    }

    fn snapshot_turn(&self) -> TurnSnapshot {
        TurnSnapshot {
            turn_number: self.turn_number,
            player: self.player,
            dice: self.dice,
            moves: self.turn_moves.clone(),
            doubling: self.turn_doubling,
            cube_value: self.cube.value(),
            cube_owner: self.cube.owner(),
            position_id: position_id::encode(&self.position, self.player.opponent()),
        }
    }
}
