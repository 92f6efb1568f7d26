//! Turn state machine integration tests.
//!
//! These drive whole games through the public command API and check that
//! the board, the phase and the recorded history stay consistent.

use rust_backgammon::board::Position;
use rust_backgammon::core::{CheckerColor, DiceRng, DiceRoll, FixedDice};
use rust_backgammon::error::EngineError;
use rust_backgammon::notation::position_id;
use rust_backgammon::rules::{EndReason, Game, GameContext, TurnPhase, WinType};

/// Play the first listed legal move until the turn is done.
fn play_turn(game: &mut Game) {
    while game.phase() == TurnPhase::AwaitingMove {
        let mv = game.valid_moves()[0];
        game.make_move(mv.from, mv.to).unwrap();
    }
    if !game.is_over() {
        game.end_turn().unwrap();
    }
}

fn self_play(seed: u64) -> Game {
    let mut dice = DiceRng::new(seed);
    let mut game = Game::from_opening_roll(&mut dice);
    play_turn(&mut game);

    for _ in 0..5_000 {
        if game.is_over() {
            break;
        }
        game.roll_dice(&mut dice).unwrap();
        play_turn(&mut game);
    }
    game
}

// =============================================================================
// Whole games
// =============================================================================

#[test]
fn test_self_play_reaches_a_bear_off_win() {
    for seed in [1, 2, 3] {
        let game = self_play(seed);
        let outcome = *game.outcome().expect("game should finish");

        assert_eq!(outcome.reason, EndReason::BearOff);
        assert_eq!(game.position().off(outcome.winner), 15);
        assert_eq!(game.phase(), TurnPhase::GameOver);
        assert_eq!(
            outcome.win_type,
            WinType::classify(game.position(), outcome.winner)
        );
    }
}

#[test]
fn test_history_turn_numbers_and_players_alternate() {
    let game = self_play(11);
    let history = game.history();
    assert!(!history.is_empty());

    for (index, turn) in history.iter().enumerate() {
        assert_eq!(turn.turn_number as usize, index + 1);
        if index > 0 {
            assert_eq!(turn.player, history[index - 1].player.opponent());
        }
        let decoded = position_id::decode(&turn.position_id, turn.player.opponent()).unwrap();
        assert!(decoded.validate().is_ok());
    }

    let last = history.last().unwrap();
    let winner = game.outcome().unwrap().winner;
    assert_eq!(last.player, winner);
    assert_eq!(
        position_id::decode(&last.position_id, winner.opponent()).unwrap(),
        *game.position()
    );
}

#[test]
fn test_same_seed_same_game() {
    let a = self_play(77);
    let b = self_play(77);
    assert_eq!(a.history(), b.history());
    assert_eq!(a.outcome(), b.outcome());
}

#[test]
fn test_cloned_game_keeps_its_history() {
    let mut dice = DiceRng::new(5);
    let mut game = Game::from_opening_roll(&mut dice);
    play_turn(&mut game);
    let saved = game.clone();

    game.roll_dice(&mut dice).unwrap();
    play_turn(&mut game);

    assert_eq!(saved.history().len(), 1);
    assert_eq!(game.history().len(), 2);
    assert_eq!(saved.history()[0], game.history()[0]);
}

// =============================================================================
// Single turns
// =============================================================================

#[test]
fn test_undo_everything_and_play_differently() {
    let mut game = Game::new(CheckerColor::White);
    game.set_dice(6, 5).unwrap();
    let before = *game.position();

    game.make_move(24, 18).unwrap();
    game.make_move(18, 13).unwrap();
    assert_eq!(game.phase(), TurnPhase::TurnComplete);

    game.undo_last_move().unwrap();
    game.undo_last_move().unwrap();
    assert_eq!(*game.position(), before);
    assert_eq!(game.remaining_dice(), &[6, 5]);
    assert!(matches!(
        game.undo_last_move(),
        Err(EngineError::InvalidState { .. })
    ));

    game.make_move(13, 7).unwrap();
    game.make_move(13, 8).unwrap();
    game.end_turn().unwrap();

    let turn = &game.history()[0];
    assert_eq!(turn.moves.len(), 2);
    assert_eq!(turn.dice, DiceRoll::new(6, 5));
    assert_eq!(game.current_player(), CheckerColor::Red);
    assert_eq!(game.phase(), TurnPhase::AwaitingRoll);
}

#[test]
fn test_end_turn_reports_playable_dice() {
    let mut game = Game::new(CheckerColor::White);
    game.set_dice(4, 4).unwrap();
    game.make_move(13, 9).unwrap();

    assert_eq!(
        game.end_turn(),
        Err(EngineError::TurnNotComplete { remaining_dice: 3 })
    );
}

#[test]
fn test_fixed_dice_drive_both_players() {
    let mut dice = FixedDice::new(&[
        DiceRoll::new(3, 1).unwrap(),
        DiceRoll::new(6, 4).unwrap(),
    ]);
    let mut game = Game::new(CheckerColor::White);

    game.roll_dice(&mut dice).unwrap();
    game.make_move(8, 5).unwrap();
    game.make_move(6, 5).unwrap();
    game.end_turn().unwrap();

    game.roll_dice(&mut dice).unwrap();
    game.make_move(1, 7).unwrap();
    game.make_move(7, 11).unwrap();
    game.end_turn().unwrap();

    assert_eq!(dice.remaining(), 0);
    assert_eq!(game.history().len(), 2);
    assert_eq!(game.position().count(CheckerColor::White, 5), 2);
    assert_eq!(game.position().count(CheckerColor::Red, 11), 1);
}

#[test]
fn test_hit_sends_checker_to_bar() {
    let mut position = Position::starting();
    // Red blot on White's 4-point.
    position.set_point(1, Some(CheckerColor::Red), 1);
    position.set_point(4, Some(CheckerColor::Red), 1);

    let context = GameContext {
        position,
        ..GameContext::starting(CheckerColor::White)
    };
    let mut game = Game::restore(context).unwrap();
    game.set_dice(2, 1).unwrap();

    let mv = game.make_move(6, 4).unwrap();
    assert!(mv.is_hit);
    assert_eq!(game.position().bar(CheckerColor::Red), 1);
    assert_eq!(game.position().total_checkers(CheckerColor::Red), 15);
}

#[test]
fn test_commands_in_wrong_phase() {
    let mut game = Game::new(CheckerColor::Red);
    assert!(matches!(
        game.make_move(1, 4),
        Err(EngineError::InvalidState { operation: "make_move", .. })
    ));
    assert!(matches!(
        game.end_turn(),
        Err(EngineError::InvalidState { operation: "end_turn", .. })
    ));
    game.set_dice(3, 2).unwrap();
    assert!(matches!(
        game.set_dice(3, 2),
        Err(EngineError::InvalidState { operation: "set_dice", .. })
    ));
}
