//! Sliding-window rate limiting.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use feedwatch_core::clock::Clock;

/// Counts attempts in a trailing time window.
///
/// Shared by every stream sending on a channel; access is serialized by an
/// internal mutex that is never held across an await point.
pub struct SlidingWindowLimiter {
    max: u32,
    window: TimeDelta,
    clock: Arc<dyn Clock>,
    attempts: Mutex<VecDeque<DateTime<Utc>>>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter allowing `max` attempts per `window`. A `max` of
    /// zero allows everything.
    #[must_use]
    pub fn new(max: u32, window: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            max,
            window,
            clock,
            attempts: Mutex::new(VecDeque::new()),
        }
    }

    /// Creates a limiter allowing `max` attempts per 60 seconds.
    #[must_use]
    pub fn per_minute(max: u32, clock: Arc<dyn Clock>) -> Self {
        Self::new(max, TimeDelta::seconds(60), clock)
    }

    /// Returns `true` and records the attempt if it fits in the window.
    ///
    /// The attempt is recorded before delivery is attempted, so concurrent
    /// callers cannot burst past the limit.
    pub fn try_acquire(&self) -> bool {
        if self.max == 0 {
            return true;
        }
        let now = self.clock.now();
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while attempts
            .front()
            .is_some_and(|oldest| now - *oldest > self.window)
        {
            attempts.pop_front();
        }
        if attempts.len() >= self.max as usize {
            return false;
        }
        attempts.push_back(now);
        true
    }

    /// Configured ceiling. Zero means unlimited.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("max", &self.max)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
