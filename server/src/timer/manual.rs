use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use super::{TimerEvent, TimerHandle, TimerService};

const MIN_PERIOD: Duration = Duration::from_nanos(1);

#[derive(Debug)]
struct Armed {
    due: Duration,
    period: Option<Duration>,
    event: TimerEvent,
}

/// Virtual clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Duration,
    next_id: u64,
    armed: BTreeMap<TimerHandle, Armed>,
    fired: HashMap<TimerHandle, TimerEvent>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Outstanding handles, fired-but-unclaimed ones included.
    pub fn pending(&self) -> usize {
        self.armed.len() + self.fired.len()
    }

    /// Fires the earliest timer due at or before `until`, moving the clock to its due time.
    /// Ties go to the handle scheduled first.
    pub fn next_due(&mut self, until: Duration) -> Option<TimerHandle> {
        let (handle, due, period) = self
            .armed
            .iter()
            .filter(|(_, armed)| armed.due <= until)
            .min_by_key(|(handle, armed)| (armed.due, **handle))
            .map(|(handle, armed)| (*handle, armed.due, armed.period))?;

        self.now = self.now.max(due);
        match period {
            Some(period) => {
                if let Some(armed) = self.armed.get_mut(&handle) {
                    armed.due = due + period;
                }
            }
            None => {
                if let Some(armed) = self.armed.remove(&handle) {
                    self.fired.insert(handle, armed.event);
                }
            }
        }

        Some(handle)
    }

    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn arm(&mut self, delay: Duration, period: Option<Duration>, event: TimerEvent) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.armed.insert(
            handle,
            Armed {
                due: self.now + delay,
                period,
                event,
            },
        );
        handle
    }
}

impl TimerService for ManualClock {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
        self.arm(delay, None, event)
    }

    fn schedule_repeating(&mut self, period: Duration, event: TimerEvent) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        self.arm(period, Some(period), event)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.armed.remove(&handle);
        self.fired.remove(&handle);
    }

    fn claim(&mut self, handle: TimerHandle) -> Option<TimerEvent> {
        if let Some(event) = self.fired.remove(&handle) {
            return Some(event);
        }

        self.armed
            .get(&handle)
            .filter(|armed| armed.period.is_some())
            .map(|armed| armed.event)
    }
}
