use std::time::Duration;

use foundation::time::Millis;

/// Handle of one armed debounce timer.
///
/// Every `schedule` call mints a fresh id, so a waiter holding an older id
/// can tell that its timer was re-armed underneath it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Armed {
    id: TimerId,
    deadline: Millis,
}

/// Single-slot debounce timer with explicit cancel-then-schedule re-arming.
///
/// The debouncer never sleeps itself; callers pass the current time and
/// either poll with [`Debouncer::fire_if_due`] or wait until
/// [`Debouncer::deadline`] and claim their own timer with
/// [`Debouncer::fire`].
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    next_id: u64,
    armed: Option<Armed>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_id: 1,
            armed: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels any armed timer and arms a new one expiring `delay` after `now`.
    pub fn schedule(&mut self, now: Millis) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.armed = Some(Armed {
            id,
            deadline: now.saturating_add(self.delay),
        });
        id
    }

    /// Disarms the pending timer, returning its id if one was armed.
    pub fn cancel(&mut self) -> Option<TimerId> {
        self.armed.take().map(|a| a.id)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn armed_id(&self) -> Option<TimerId> {
        self.armed.map(|a| a.id)
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.armed.map(|a| a.deadline)
    }

    /// Fires (and disarms) the armed timer if its deadline has been reached.
    pub fn fire_if_due(&mut self, now: Millis) -> Option<TimerId> {
        let armed = self.armed?;
        if now < armed.deadline {
            return None;
        }
        self.armed = None;
        Some(armed.id)
    }

    /// Fires timer `id` if it is still the armed one and is due.
    ///
    /// Returns `false` when the timer was cancelled or superseded by a later
    /// `schedule`, or when it is not yet due.
    pub fn fire(&mut self, id: TimerId, now: Millis) -> bool {
        match self.armed {
            Some(armed) if armed.id == id && now >= armed.deadline => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}
