//! Concurrent access to matches.
//!
//! The engine itself is synchronous. This layer serializes commands per
//! match behind a mutex, broadcasts [`MatchEvent`]s to subscribers and runs
//! a periodic clock tick that forfeits players who run out of time.

mod events;
mod handle;
mod registry;

pub use events::{MatchEvent, MatchId};
pub use handle::MatchHandle;
pub use registry::{spawn_clock_ticker, spawn_clock_ticker_with, MatchRegistry};
