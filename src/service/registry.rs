//! Match registry and the clock ticker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use super::events::MatchId;
use super::handle::MatchHandle;
use crate::core::MatchConfig;
use crate::matchplay::Match;

/// All live matches, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct MatchRegistry {
    matches: Arc<Mutex<FxHashMap<MatchId, MatchHandle>>>,
    next_id: Arc<AtomicU64>,
}

impl MatchRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<MatchId, MatchHandle>> {
        self.matches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new match.
    #[instrument(skip(self, config), fields(target_score = config.target_score))]
    pub fn create(&self, config: MatchConfig) -> MatchHandle {
        let id = MatchId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let handle = MatchHandle::new(id, Match::new(config));
        self.lock().insert(id, handle.clone());
        info!(match_id = %id, "match created");
        handle
    }

    #[must_use]
    pub fn get(&self, id: MatchId) -> Option<MatchHandle> {
        self.lock().get(&id).cloned()
    }

    pub fn remove(&self, id: MatchId) -> Option<MatchHandle> {
        let removed = self.lock().remove(&id);
        if removed.is_some() {
            debug!(match_id = %id, "match removed");
        }
        removed
    }

    /// Registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<MatchId> {
        let mut ids: Vec<_> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Poll every match clock. Returns the number of forfeits applied.
    pub fn tick(&self, now: DateTime<Utc>) -> usize {
        // Clone the handles out so no match lock is taken under the registry lock.
        let handles: Vec<MatchHandle> = self.lock().values().cloned().collect();
        handles.iter().filter(|handle| handle.tick(now)).count()
    }
}

/// Poll every registered clock once per `period` against the wall clock.
pub fn spawn_clock_ticker(registry: MatchRegistry, period: Duration) -> JoinHandle<()> {
    spawn_clock_ticker_with(registry, period, Utc::now)
}

/// [`spawn_clock_ticker`] with an injected time source.
pub fn spawn_clock_ticker_with<F>(registry: MatchRegistry, period: Duration, now: F) -> JoinHandle<()>
where
    F: Fn() -> DateTime<Utc> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let forfeits = registry.tick(now());
            if forfeits > 0 {
                debug!(forfeits, "clock tick applied forfeits");
            }
        }
    })
}
