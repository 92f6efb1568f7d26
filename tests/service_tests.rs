//! Service layer integration tests.
//!
//! Clock tests run on tokio's paused clock: the ticker's time source is
//! derived from `tokio::time::Instant`, so whole minutes pass instantly.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::Instant;

use rust_backgammon::core::{CheckerColor, MatchConfig, TimeControlConfig};
use rust_backgammon::error::EngineError;
use rust_backgammon::rules::WinType;
use rust_backgammon::service::{spawn_clock_ticker_with, MatchEvent, MatchRegistry};

fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Wall-clock stand-in that follows tokio's (possibly paused) clock.
fn paused_clock() -> impl Fn() -> DateTime<Utc> + Send + Clone + 'static {
    let start = Instant::now();
    move || t0() + chrono::Duration::from_std(start.elapsed()).unwrap()
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<MatchEvent>) -> Vec<MatchEvent> {
    let mut out = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => out.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return out,
        }
    }
}

// =============================================================================
// Ticker
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_ticker_forfeits_an_idle_player() {
    let registry = MatchRegistry::new();
    let handle = registry.create(
        MatchConfig::default().with_time_control(TimeControlConfig::live(0, 5)),
    );
    let now = paused_clock();

    let game = handle.start_next_game(now()).unwrap();
    let idle = game.actor;
    let mut events = handle.subscribe();
    let ticker = spawn_clock_ticker_with(registry.clone(), Duration::from_secs(1), now.clone());

    tokio::time::sleep(Duration::from_secs(8)).await;
    ticker.abort();

    let events = drain(&mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        MatchEvent::TimeoutForfeit { loser, stakes: 1, .. } if *loser == idle
    )));

    let snapshot = handle.snapshot(now());
    assert_eq!(snapshot.scores[idle.opponent()], 1);
    assert_eq!(snapshot.game.unwrap().outcome.unwrap().winner, idle.opponent());
}

#[tokio::test(start_paused = true)]
async fn test_ticker_leaves_active_players_alone() {
    let registry = MatchRegistry::new();
    let handle = registry.create(
        MatchConfig::default().with_time_control(TimeControlConfig::live(10, 30)),
    );
    let now = paused_clock();
    handle.start_next_game(now()).unwrap();
    let ticker = spawn_clock_ticker_with(registry.clone(), Duration::from_secs(1), now.clone());

    tokio::time::sleep(Duration::from_secs(20)).await;
    ticker.abort();

    let snapshot = handle.snapshot(now());
    assert!(snapshot.game.unwrap().outcome.is_none());
    assert_eq!(snapshot.scores[CheckerColor::White] + snapshot.scores[CheckerColor::Red], 0);
}

#[tokio::test(start_paused = true)]
async fn test_command_after_tick_forfeit_fails_cleanly() {
    let registry = MatchRegistry::new();
    let handle = registry.create(
        MatchConfig::default().with_time_control(TimeControlConfig::live(0, 3)),
    );
    let now = paused_clock();
    let game = handle.start_next_game(now()).unwrap();
    let mover = game.actor;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(registry.tick(now()), 1);

    let mv = game.valid_moves[0];
    assert_eq!(
        handle.make_move(mover, mv.from, mv.to, now()),
        Err(EngineError::GameComplete)
    );
}

#[tokio::test(start_paused = true)]
async fn test_late_command_loses_the_race() {
    let registry = MatchRegistry::new();
    let handle = registry.create(
        MatchConfig::default().with_time_control(TimeControlConfig::live(0, 3)),
    );
    let now = paused_clock();
    let game = handle.start_next_game(now()).unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let mv = game.valid_moves[0];
    assert!(matches!(
        handle.make_move(game.actor, mv.from, mv.to, now()),
        Err(EngineError::TimeoutForfeit { stakes: 1, .. })
    ));
    // The forfeit is already applied; the ticker finds nothing to do.
    assert_eq!(registry.tick(now()), 0);
}

// =============================================================================
// Concurrent commands
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resignations_score_once() {
    let registry = MatchRegistry::new();
    let handle = registry.create(MatchConfig::default().with_target_score(3));
    handle.start_next_game(t0()).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let handle = handle.clone();
            let color = if i % 2 == 0 { CheckerColor::White } else { CheckerColor::Red };
            tokio::spawn(async move { handle.resign(color, WinType::Normal, t0()) })
        })
        .collect();

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(points) => {
                assert_eq!(points, 1);
                successes += 1;
            }
            Err(err) => assert_eq!(err, EngineError::GameComplete),
        }
    }
    assert_eq!(successes, 1);

    let snapshot = handle.snapshot(t0());
    assert_eq!(snapshot.scores[CheckerColor::White] + snapshot.scores[CheckerColor::Red], 1);
}

#[tokio::test]
async fn test_match_complete_is_broadcast() {
    let registry = MatchRegistry::new();
    let handle = registry.create(MatchConfig::default().with_target_score(1));
    let mut events = handle.subscribe();

    handle.start_next_game(t0()).unwrap();
    handle.resign(CheckerColor::Red, WinType::Gammon, t0()).unwrap();

    let events = drain(&mut events);
    assert!(matches!(
        events.last(),
        Some(MatchEvent::MatchComplete { winner: CheckerColor::White, .. })
    ));
    assert!(events.iter().all(|event| event.match_id() == handle.id()));
    assert_eq!(
        handle.start_next_game(t0()).unwrap_err(),
        EngineError::MatchComplete
    );
}
