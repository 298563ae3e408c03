//! Scheduling primitives the game controller is driven by.
//!
//! A service hands out [`TimerHandle`]s; the host delivers fired handles back to
//! the controller, which [`TimerService::claim`]s them before acting. A handle that
//! was cancelled after firing but before delivery is rejected at claim time.

use std::time::Duration;

use crate::data::Occupant;

mod manual;
mod runtime;

pub use manual::ManualClock;
pub use runtime::{TimerFeed, TokioTimers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Countdown,
    Spawn,
    Expire { cell: usize, occupant: Occupant },
    ClearSquashed { cell: usize },
}

pub trait TimerService {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle;

    fn schedule_repeating(&mut self, period: Duration, event: TimerEvent) -> TimerHandle;

    /// Idempotent; unknown, fired and already-cancelled handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);

    /// Takes a fired handle for dispatch. One-shot handles are retired here.
    fn claim(&mut self, handle: TimerHandle) -> Option<TimerEvent>;
}
