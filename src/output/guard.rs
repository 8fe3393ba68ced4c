//! Reset-time guard
//!
//! LEDs latch a frame only after the data line has been idle for the
//! family's reset time. A new transfer may start no earlier than that
//! interval after the previous one completed.

use embassy_time::{Duration, Instant};

/// Minimum idle time between two transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetGuard {
    reset_time: Duration,
}

impl ResetGuard {
    pub const fn new(reset_time: Duration) -> Self {
        Self { reset_time }
    }

    pub const fn reset_time(self) -> Duration {
        self.reset_time
    }

    /// Earliest start of the next transfer
    ///
    /// Without a previous transfer there is nothing to wait for.
    pub fn ready_at(self, last_completion: Option<Instant>) -> Instant {
        last_completion.map_or(Instant::MIN, |at| at + self.reset_time)
    }

    /// Time still to wait at `now`, zero once the line has settled
    pub fn remaining(self, last_completion: Option<Instant>, now: Instant) -> Duration {
        self.ready_at(last_completion).saturating_duration_since(now)
    }
}
