//! Match controller integration tests.
//!
//! Scoring, the Crawford rule, forfeits and the clock, driven through
//! [`Match`] the way a server would drive it.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use rust_backgammon::clock::ClockView;
use rust_backgammon::core::{CheckerColor, ForfeitPolicy, MatchConfig, TimeControlConfig};
use rust_backgammon::error::{DoubleDenial, EngineError};
use rust_backgammon::matchplay::Match;
use rust_backgammon::rules::{EndReason, TurnPhase, WinType};

fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Play the current turn with the first legal moves and end it.
fn play_out_turn(m: &mut Match) {
    loop {
        let game = m.game().unwrap();
        if game.phase() != TurnPhase::AwaitingMove {
            break;
        }
        let mv = game.valid_moves()[0];
        m.make_move(mv.from, mv.to).unwrap();
    }
    m.end_turn().unwrap();
}

// =============================================================================
// Scoring
// =============================================================================

#[test]
fn test_stakes_follow_the_cube() {
    let mut m = Match::new(MatchConfig::default().with_target_score(11));
    m.start_next_game().unwrap();
    play_out_turn(&mut m);

    assert_eq!(m.offer_double().unwrap(), 2);
    m.accept_double().unwrap();
    let doubler = m.game().unwrap().current_player();

    let points = m.complete_game(doubler, WinType::Gammon).unwrap();
    assert_eq!(points, 4);
    assert_eq!(m.score(doubler), 4);
    assert_eq!(m.records()[0].outcome.cube_value, 2);
}

#[test]
fn test_dropped_double_is_scored_automatically() {
    let mut m = Match::new(MatchConfig::default().with_target_score(3));
    m.start_next_game().unwrap();
    play_out_turn(&mut m);

    let doubler = m.game().unwrap().current_player();
    m.offer_double().unwrap();
    m.reject_double().unwrap();

    assert_eq!(m.score(doubler), 1);
    assert_eq!(m.records().len(), 1);
    assert_eq!(m.records()[0].outcome.reason, EndReason::DoubleRejected);
}

#[test]
fn test_match_plays_to_target() {
    let mut m = Match::new(MatchConfig::default().with_target_score(5));
    let mut games = 0;
    while !m.is_complete() {
        m.start_next_game().unwrap();
        m.complete_game(CheckerColor::Red, WinType::Normal).unwrap();
        games += 1;
    }

    assert_eq!(games, 5);
    assert_eq!(m.winner(), Some(CheckerColor::Red));
    assert_eq!(m.score(CheckerColor::Red), 5);
    assert!(matches!(m.start_next_game(), Err(EngineError::MatchComplete)));
    assert!(matches!(m.end_turn(), Err(EngineError::MatchComplete)));
}

#[test]
fn test_each_game_gets_its_own_dice() {
    let mut m = Match::new(MatchConfig::default().with_seed(1234));
    let mut openings = Vec::new();
    for _ in 0..4 {
        let game = m.start_next_game().unwrap();
        openings.push((game.current_player(), game.dice()));
        m.complete_game(CheckerColor::White, WinType::Normal).unwrap();
    }
    openings.dedup();
    assert!(openings.len() > 1, "opening rolls should vary between games");
}

// =============================================================================
// Crawford
// =============================================================================

#[test]
fn test_crawford_game_blocks_doubling_then_lifts() {
    let mut m = Match::new(MatchConfig::default().with_target_score(5));
    m.start_next_game().unwrap();
    m.complete_game(CheckerColor::White, WinType::Backgammon).unwrap();
    assert!(!m.is_crawford_game());

    m.start_next_game().unwrap();
    m.complete_game(CheckerColor::White, WinType::Normal).unwrap();
    assert_eq!(m.score(CheckerColor::White), 4);
    assert!(m.is_crawford_game());

    m.start_next_game().unwrap();
    play_out_turn(&mut m);
    assert!(matches!(
        m.offer_double(),
        Err(EngineError::DoubleNotAllowed(DoubleDenial::CrawfordGame))
    ));
    m.complete_game(CheckerColor::Red, WinType::Normal).unwrap();

    m.start_next_game().unwrap();
    play_out_turn(&mut m);
    assert!(m.offer_double().is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_at_most_one_crawford_game(
        target in 1u32..12,
        results in prop::collection::vec((any::<bool>(), 0u8..3), 1..40),
    ) {
        let mut m = Match::new(MatchConfig::default().with_target_score(target));
        let mut crawford_games = 0;
        let mut first_at_match_point: Option<usize> = None;

        for (index, (white_wins, size)) in results.into_iter().enumerate() {
            if m.is_complete() {
                break;
            }
            let game = m.start_next_game().unwrap();
            // Directly follows the first game that left one player at target - 1.
            prop_assert_eq!(game.is_crawford(), first_at_match_point == Some(index));
            if game.is_crawford() {
                crawford_games += 1;
            }

            let winner = if white_wins { CheckerColor::White } else { CheckerColor::Red };
            let win_type = [WinType::Normal, WinType::Gammon, WinType::Backgammon][usize::from(size)];
            m.complete_game(winner, win_type).unwrap();

            let at_match_point = CheckerColor::ALL
                .iter()
                .filter(|&&color| m.score(color) + 1 == target)
                .count();
            if first_at_match_point.is_none() && at_match_point == 1 && !m.is_complete() {
                first_at_match_point = Some(index + 1);
            }
        }

        prop_assert!(crawford_games <= 1);
    }
}

// =============================================================================
// Forfeits and clocks
// =============================================================================

#[test]
fn test_match_forfeit_awards_the_match() {
    let config = MatchConfig::default()
        .with_target_score(7)
        .with_forfeit(ForfeitPolicy::Match);
    let mut m = Match::new(config);
    m.start_next_game().unwrap();
    m.complete_game(CheckerColor::White, WinType::Gammon).unwrap();

    m.start_next_game().unwrap();
    let points = m.forfeit(CheckerColor::Red, EndReason::Forfeit).unwrap();
    assert_eq!(points, 5);
    assert_eq!(m.winner(), Some(CheckerColor::White));
}

#[test]
fn test_live_reserve_runs_out() {
    let config = MatchConfig::default().with_time_control(TimeControlConfig::live(0, 5));
    let mut m = Match::new(config);
    m.start_next_game().unwrap();
    m.sync_clock(t0());
    let mover = m.game().unwrap().actor();

    let result = m.run_timed(t0() + Duration::seconds(6), |m| m.end_turn());
    assert_eq!(
        result,
        Err(EngineError::TimeoutForfeit { loser: mover, stakes: 1 })
    );
    assert_eq!(m.score(mover.opponent()), 1);
    assert_eq!(m.clock().running(), None);
}

#[test]
fn test_delay_protects_the_reserve() {
    let config = MatchConfig::default().with_time_control(TimeControlConfig::live(12, 5));
    let mut m = Match::new(config);
    m.start_next_game().unwrap();
    m.sync_clock(t0());
    let mover = m.game().unwrap().actor();

    // 15 s used: 12 from the delay, 3 from the reserve.
    let later = t0() + Duration::seconds(15);
    m.run_timed(later, play_and_report).unwrap();
    assert!(!m.game().unwrap().is_over());
    assert!(m.poll_clock(later).is_ok());

    match m.clock_view(later) {
        ClockView::Live { running, reserve_ms, delay_remaining_ms } => {
            assert_eq!(running, Some(mover.opponent()));
            assert_eq!(reserve_ms[mover], 2_000);
            assert_eq!(reserve_ms[mover.opponent()], 5_000);
            assert_eq!(delay_remaining_ms, 12_000);
        }
        other => panic!("unexpected clock view {other:?}"),
    }
}

fn play_and_report(m: &mut Match) -> rust_backgammon::Result<()> {
    play_out_turn(m);
    Ok(())
}

#[test]
fn test_correspondence_deadline_forfeits_at_cube_value() {
    let config = MatchConfig::default()
        .with_target_score(7)
        .with_time_control(TimeControlConfig::correspondence(1));
    let mut m = Match::new(config);
    m.start_next_game().unwrap();
    m.sync_clock(t0());

    m.run_timed(t0(), play_and_report).unwrap();
    m.run_timed(t0(), |m| m.offer_double()).unwrap();
    m.run_timed(t0(), |m| m.accept_double()).unwrap();
    let stalling = m.game().unwrap().actor();

    assert!(m.poll_clock(t0() + Duration::hours(23)).is_ok());
    let err = m.poll_clock(t0() + Duration::days(1) + Duration::seconds(1)).unwrap_err();
    assert_eq!(err, EngineError::TimeoutForfeit { loser: stalling, stakes: 2 });
    assert_eq!(m.score(stalling.opponent()), 2);
}

#[test]
fn test_clock_follows_the_responder() {
    let config = MatchConfig::default().with_time_control(TimeControlConfig::live(0, 60));
    let mut m = Match::new(config);
    m.start_next_game().unwrap();
    m.sync_clock(t0());
    m.run_timed(t0(), play_and_report).unwrap();

    let doubler = m.game().unwrap().current_player();
    m.run_timed(t0(), |m| m.offer_double()).unwrap();
    assert_eq!(m.clock().running(), Some(doubler.opponent()));

    m.run_timed(t0() + Duration::seconds(10), |m| m.accept_double()).unwrap();
    assert_eq!(m.clock().running(), Some(doubler));
}

#[test]
fn test_taken_double_keeps_the_doublers_delay() {
    let config = MatchConfig::default().with_time_control(TimeControlConfig::live(10, 60));
    let mut m = Match::new(config);
    m.start_next_game().unwrap();
    m.sync_clock(t0());
    m.run_timed(t0(), play_and_report).unwrap();

    let doubler = m.game().unwrap().current_player();
    m.run_timed(t0() + Duration::seconds(3), |m| m.offer_double()).unwrap();
    m.run_timed(t0() + Duration::seconds(23), |m| m.accept_double()).unwrap();

    match m.clock_view(t0() + Duration::seconds(23)) {
        ClockView::Live { running, reserve_ms, delay_remaining_ms } => {
            assert_eq!(running, Some(doubler));
            assert_eq!(delay_remaining_ms, 7_000);
            assert_eq!(reserve_ms[doubler], 60_000);
            assert_eq!(reserve_ms[doubler.opponent()], 50_000);
        }
        other => panic!("unexpected clock view {other:?}"),
    }

    // The next turn starts fresh.
    let later = t0() + Duration::seconds(30);
    m.run_timed(later, |m| {
        m.roll_dice()?;
        play_and_report(m)
    })
    .unwrap();
    match m.clock_view(later) {
        ClockView::Live { running, delay_remaining_ms, .. } => {
            assert_eq!(running, Some(doubler.opponent()));
            assert_eq!(delay_remaining_ms, 10_000);
        }
        other => panic!("unexpected clock view {other:?}"),
    }
}

#[test]
fn test_resumed_match_keeps_clock_and_policy() {
    let config = MatchConfig::default()
        .with_target_score(5)
        .with_forfeit(ForfeitPolicy::Match)
        .with_time_control(TimeControlConfig::live(0, 60));
    let mut m = Match::new(config);
    m.start_next_game().unwrap();
    m.sync_clock(t0());
    let mover = m.game().unwrap().actor();
    m.run_timed(t0() + Duration::seconds(10), play_and_report).unwrap();

    let bytes = m.summary().to_bytes().unwrap();
    let summary = rust_backgammon::MatchSummary::from_bytes(&bytes).unwrap();
    let mut resumed = Match::from_summary(&summary).unwrap();
    assert_eq!(resumed.config(), m.config());
    assert_eq!(resumed.clock().running(), None);

    let now = t0() + Duration::minutes(5);
    resumed.sync_clock(now);
    match resumed.clock_view(now) {
        ClockView::Live { running, reserve_ms, .. } => {
            assert_eq!(running, Some(mover.opponent()));
            assert_eq!(reserve_ms[mover], 50_000);
            assert_eq!(reserve_ms[mover.opponent()], 60_000);
        }
        other => panic!("unexpected clock view {other:?}"),
    }

    // The forfeit policy came back too.
    let points = resumed.forfeit(mover.opponent(), EndReason::Timeout).unwrap();
    assert_eq!(points, 5);
    assert_eq!(resumed.winner(), Some(mover));
}

// =============================================================================
// Position import / export
// =============================================================================

#[test]
fn test_game_record_export_round_trips() {
    let mut m = Match::new(MatchConfig::default().with_target_score(3));
    m.start_next_game().unwrap();
    play_out_turn(&mut m);
    for _ in 0..3 {
        m.roll_dice().unwrap();
        play_out_turn(&mut m);
    }
    let record = m.export_game_sgf().unwrap();

    let mut other = Match::new(MatchConfig::default().with_target_score(3));
    other.import_position(&record).unwrap();
    assert_eq!(other.game().unwrap().context(), m.game().unwrap().context());
    assert_eq!(other.game().unwrap().history(), m.game().unwrap().history());
    assert_eq!(other.export_game_sgf().unwrap(), record);
}

#[test]
fn test_bad_import_keeps_the_current_game() {
    let mut m = Match::new(MatchConfig::default());
    m.start_next_game().unwrap();
    let before = m.export_position().unwrap();

    let err = m.import_position("(;GM[6]AW[a:x])").unwrap_err();
    assert!(matches!(err, EngineError::PositionParse(_)));
    assert_eq!(m.export_position().unwrap(), before);
}
