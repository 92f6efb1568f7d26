//! A shared, lockable match with an event stream.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use super::events::{MatchEvent, MatchId};
use crate::board::Move;
use crate::core::{CheckerColor, DiceRoll};
use crate::error::{EngineError, Result};
use crate::matchplay::Match;
use crate::rules::{DoublingCube, Game, GameOutcome, WinType};
use crate::snapshot::{GameSnapshot, MatchSnapshot, MatchSummary};

const EVENT_CAPACITY: usize = 64;

/// One match behind a mutex.
///
/// Every command takes the acting color and the current time. The clock is
/// polled under the same lock before the command runs, so a command racing
/// the ticker either lands first or sees the forfeit.
#[derive(Clone, Debug)]
pub struct MatchHandle {
    id: MatchId,
    inner: Arc<Mutex<Match>>,
    events: broadcast::Sender<MatchEvent>,
}

impl MatchHandle {
    pub fn new(id: MatchId, state: Match) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id,
            inner: Arc::new(Mutex::new(state)),
            events,
        }
    }

    #[must_use]
    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Match> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> MatchSnapshot {
        self.lock().snapshot(now)
    }

    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        self.lock().summary()
    }

    fn publish(&self, state: &Match, now: DateTime<Utc>) {
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(MatchEvent::Updated {
            match_id: self.id,
            snapshot: Box::new(state.snapshot(now)),
        });
        if let Some(winner) = state.winner() {
            let _ = self.events.send(MatchEvent::MatchComplete {
                match_id: self.id,
                winner,
                scores: state.scores(),
            });
        }
    }

    fn publish_forfeit(&self, state: &Match, now: DateTime<Utc>, loser: CheckerColor, stakes: u32) {
        let _ = self.events.send(MatchEvent::TimeoutForfeit {
            match_id: self.id,
            loser,
            stakes,
        });
        self.publish(state, now);
    }

    fn run<T>(
        &self,
        player: Option<CheckerColor>,
        now: DateTime<Utc>,
        operation: &'static str,
        command: impl FnOnce(&mut Match) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.lock();
        let result = state.run_timed(now, |state| {
            if let Some(player) = player {
                ensure_actor(state, player, operation)?;
            }
            command(state)
        });

        match &result {
            Ok(_) => self.publish(&state, now),
            Err(EngineError::TimeoutForfeit { loser, stakes }) => {
                self.publish_forfeit(&state, now, *loser, *stakes);
            }
            Err(err) => debug!(match_id = %self.id, operation, error = %err, "command rejected"),
        }
        result
    }

    // === Commands ===

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn start_next_game(&self, now: DateTime<Utc>) -> Result<GameSnapshot> {
        self.run(None, now, "start_next_game", |state| {
            state.start_next_game().map(Game::snapshot)
        })
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn roll_dice(&self, player: CheckerColor, now: DateTime<Utc>) -> Result<DiceRoll> {
        self.run(Some(player), now, "roll_dice", Match::roll_dice)
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn set_dice(
        &self,
        player: CheckerColor,
        first: u8,
        second: u8,
        now: DateTime<Utc>,
    ) -> Result<DiceRoll> {
        self.run(Some(player), now, "set_dice", |state| state.set_dice(first, second))
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn make_move(&self, player: CheckerColor, from: u8, to: u8, now: DateTime<Utc>) -> Result<Move> {
        self.run(Some(player), now, "make_move", |state| state.make_move(from, to))
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn undo_last_move(&self, player: CheckerColor, now: DateTime<Utc>) -> Result<Move> {
        self.run(Some(player), now, "undo_last_move", Match::undo_last_move)
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn end_turn(&self, player: CheckerColor, now: DateTime<Utc>) -> Result<()> {
        self.run(Some(player), now, "end_turn", Match::end_turn)
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn offer_double(&self, player: CheckerColor, now: DateTime<Utc>) -> Result<u32> {
        self.run(Some(player), now, "offer_double", Match::offer_double)
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn accept_double(&self, player: CheckerColor, now: DateTime<Utc>) -> Result<DoublingCube> {
        self.run(Some(player), now, "accept_double", Match::accept_double)
    }

    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn reject_double(&self, player: CheckerColor, now: DateTime<Utc>) -> Result<GameOutcome> {
        self.run(Some(player), now, "reject_double", Match::reject_double)
    }

    /// `player` concedes the current game. Allowed at any point of the game.
    #[instrument(skip(self), fields(match_id = %self.id))]
    pub fn resign(&self, player: CheckerColor, win_type: WinType, now: DateTime<Utc>) -> Result<u32> {
        self.run(None, now, "resign", |state| {
            state.complete_game(player.opponent(), win_type)
        })
    }

    #[instrument(skip(self, text), fields(match_id = %self.id))]
    pub fn import_position(&self, text: &str, now: DateTime<Utc>) -> Result<()> {
        self.run(None, now, "import_position", |state| state.import_position(text))
    }

    pub fn export_position(&self) -> Result<String> {
        self.lock().export_position()
    }

    pub fn export_game_sgf(&self) -> Result<String> {
        self.lock().export_game_sgf()
    }

    /// Poll the clock. Returns whether a forfeit was applied.
    pub fn tick(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        match state.poll_clock(now) {
            Err(EngineError::TimeoutForfeit { loser, stakes }) => {
                self.publish_forfeit(&state, now, loser, stakes);
                true
            }
            Err(err) => {
                warn!(match_id = %self.id, error = %err, "clock poll failed");
                false
            }
            Ok(()) => false,
        }
    }
}

fn ensure_actor(state: &Match, player: CheckerColor, operation: &'static str) -> Result<()> {
    match state.game() {
        Some(game) if !game.is_over() && game.actor() != player => Err(EngineError::invalid_state(
            operation,
            format!("waiting for {}", game.actor()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MatchConfig;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_commands_check_the_actor() {
        let handle = MatchHandle::new(MatchId(1), Match::new(MatchConfig::default()));
        let game = handle.start_next_game(t0()).unwrap();
        let idle = game.current_player.opponent();

        let err = handle.end_turn(idle, t0()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { operation: "end_turn", .. }));
    }

    #[test]
    fn test_successful_commands_publish() {
        let handle = MatchHandle::new(MatchId(2), Match::new(MatchConfig::default().with_target_score(1)));
        let mut events = handle.subscribe();
        let game = handle.start_next_game(t0()).unwrap();

        let event = events.try_recv().unwrap();
        assert!(matches!(event, MatchEvent::Updated { match_id: MatchId(2), .. }));

        handle.resign(game.current_player, WinType::Normal, t0()).unwrap();
        let _updated = events.try_recv().unwrap();
        match events.try_recv().unwrap() {
            MatchEvent::MatchComplete { winner, scores, .. } => {
                assert_eq!(winner, game.current_player.opponent());
                assert_eq!(scores[winner], 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_rejected_commands_are_silent() {
        let handle = MatchHandle::new(MatchId(3), Match::new(MatchConfig::default()));
        let mut events = handle.subscribe();
        assert!(handle.export_position().is_err());
        assert!(handle.import_position("(;GM[1])", t0()).is_err());
        assert!(events.try_recv().is_err());
    }
}
