//! Wall-clock source for state-machine transitions.
//!
//! The state machine never reads time itself; callers pass `now` from a
//! `Clock`. Production uses `SystemClock`. Tests that drive timers with a
//! paused tokio runtime use `TokioClock`, whose wall time advances together
//! with `tokio::time`.

use std::fmt::Debug;

use time::OffsetDateTime;
use tokio::time::Instant;

pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Wall time anchored to a tokio `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    wall: OffsetDateTime,
    anchor: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at(OffsetDateTime::now_utc())
    }

    pub fn starting_at(wall: OffsetDateTime) -> Self {
        Self {
            wall,
            anchor: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> OffsetDateTime {
        self.wall + Instant::now().duration_since(self.anchor)
    }
}
