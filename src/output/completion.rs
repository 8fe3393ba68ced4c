//! Transfer completion tracking
//!
//! The transfer-complete interrupt is the only writer of this state and the
//! processing task the only reader, so a pair of atomics is enough. A
//! [`Signal`] lets async code wait for the interrupt instead of polling.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, block_for};
use portable_atomic::{AtomicBool, AtomicU64, Ordering};

/// Pause between checks in [`TransmitCompletion::wait_ready_blocking`]
pub const READY_POLL_INTERVAL: Duration = Duration::from_micros(50);

/// Number of checks before [`TransmitCompletion::wait_ready_blocking`] gives up
pub const READY_POLL_RETRIES: u32 = 200;

/// Tick value meaning "no transfer has completed yet"
const NEVER: u64 = 0;

/// Busy flag plus timestamp of the last finished transfer
pub struct TransmitCompletion {
    busy: AtomicBool,
    last_completion: AtomicU64,
    done: Signal<CriticalSectionRawMutex, ()>,
}

impl TransmitCompletion {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            last_completion: AtomicU64::new(NEVER),
            done: Signal::new(),
        }
    }

    /// Mark a transfer as started
    ///
    /// Returns `false` if a transfer is already in flight.
    pub fn begin(&self) -> bool {
        !self.busy.swap(true, Ordering::AcqRel)
    }

    /// Called from the transfer-complete interrupt
    pub fn complete(&self, at: Instant) {
        // a zero tick count would read back as "never"
        self.last_completion
            .store(at.as_ticks().max(NEVER + 1), Ordering::Relaxed);
        self.busy.store(false, Ordering::Release);
        self.done.signal(());
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// When the last transfer finished, `None` before the first one
    pub fn last_completion(&self) -> Option<Instant> {
        match self.last_completion.load(Ordering::Relaxed) {
            NEVER => None,
            ticks => Some(Instant::from_ticks(ticks)),
        }
    }

    /// Spin until the transfer finishes, bounded by [`READY_POLL_RETRIES`]
    ///
    /// Only meant for reconfiguration, which is rare. Returns whether the
    /// hardware is idle.
    pub fn wait_ready_blocking(&self) -> bool {
        for _ in 0..READY_POLL_RETRIES {
            if !self.is_busy() {
                return true;
            }
            block_for(READY_POLL_INTERVAL);
        }
        !self.is_busy()
    }

    /// Wait for the transfer-complete interrupt
    pub async fn wait_ready(&self) {
        while self.is_busy() {
            self.done.wait().await;
        }
    }
}

impl Default for TransmitCompletion {
    fn default() -> Self {
        Self::new()
    }
}
