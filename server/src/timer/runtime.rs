use std::{collections::HashMap, time::Duration};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::trace;

use super::{TimerEvent, TimerHandle, TimerService};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Fired handles, in firing order. Each must be passed to [`TimerService::claim`].
pub type TimerFeed = mpsc::UnboundedReceiver<TimerHandle>;

struct Scheduled {
    event: TimerEvent,
    repeating: bool,
    task: JoinHandle<()>,
}

/// Timer service backed by tokio tasks. Must be used from within a tokio runtime.
pub struct TokioTimers {
    fired: mpsc::UnboundedSender<TimerHandle>,
    scheduled: HashMap<TimerHandle, Scheduled>,
    next_id: u64,
}

impl TokioTimers {
    pub fn new() -> (Self, TimerFeed) {
        let (fired, feed) = mpsc::unbounded_channel();
        let timers = Self {
            fired,
            scheduled: HashMap::new(),
            next_id: 0,
        };
        (timers, feed)
    }

    fn allocate(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        handle
    }
}

impl TimerService for TokioTimers {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
        let handle = self.allocate();
        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = fired.send(handle);
        });

        self.scheduled.insert(
            handle,
            Scheduled {
                event,
                repeating: false,
                task,
            },
        );
        handle
    }

    fn schedule_repeating(&mut self, period: Duration, event: TimerEvent) -> TimerHandle {
        let handle = self.allocate();
        let fired = self.fired.clone();
        let period = period.max(MIN_PERIOD);
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if fired.send(handle).is_err() {
                    break;
                }
            }
        });

        self.scheduled.insert(
            handle,
            Scheduled {
                event,
                repeating: true,
                task,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(scheduled) = self.scheduled.remove(&handle) {
            scheduled.task.abort();
        }
    }

    fn claim(&mut self, handle: TimerHandle) -> Option<TimerEvent> {
        let Some(scheduled) = self.scheduled.get(&handle) else {
            trace!("Dropping fire for retired timer {:?}", handle);
            return None;
        };

        if scheduled.repeating {
            return Some(scheduled.event);
        }

        self.scheduled.remove(&handle).map(|scheduled| scheduled.event)
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, scheduled) in self.scheduled.drain() {
            scheduled.task.abort();
        }
    }
}
