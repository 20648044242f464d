//! Quiet-period gate for heartbeat status reports.
//!
//! Two producers report session status: the lifecycle relay (on every session
//! event) and the heartbeat supervisor (on a timer).  They meet only here.  A
//! lifecycle event pushes the last-event instant forward; the supervisor only
//! reports once the quiet period has elapsed since that instant, and claims the
//! period by resetting it in the same critical section it checks it in.
//!
//! Instants are always passed in by the caller so that tests can drive the
//! gate with a synthetic clock.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Last instant at which a session status was reported.
#[derive(Debug)]
pub struct HeartbeatState {
    last_event: Mutex<Instant>,
}

impl HeartbeatState {
    /// Creates the gate with `now` as the initial last-event instant.
    pub fn new(now: Instant) -> Self {
        Self {
            last_event: Mutex::new(now),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Instant> {
        self.last_event
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a lifecycle event at `now`.
    ///
    /// The stored instant only moves forward, so a call that loses the race
    /// for the lock cannot overwrite a later call's instant with its own.
    pub fn mark_event(&self, now: Instant) {
        let mut last = self.lock();
        if now > *last {
            *last = now;
        }
    }

    /// Returns the last-event instant.
    pub fn last_event(&self) -> Instant {
        *self.lock()
    }

    /// Time elapsed between the last event and `now` (zero if `now` is earlier).
    pub fn elapsed_since_event(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.lock())
    }

    /// Whether at least `quiet_period` has passed since the last event.
    pub fn is_quiet(&self, now: Instant, quiet_period: Duration) -> bool {
        self.elapsed_since_event(now) >= quiet_period
    }

    /// Claims the quiet period: if it has elapsed at `now`, resets the
    /// last-event instant to `now` and returns `true`.  Check and reset happen
    /// under one lock acquisition.
    pub fn claim_if_quiet(&self, now: Instant, quiet_period: Duration) -> bool {
        let mut last = self.lock();
        if now.saturating_duration_since(*last) >= quiet_period {
            *last = now;
            true
        } else {
            false
        }
    }
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}
