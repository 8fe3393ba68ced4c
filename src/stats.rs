//! Link statistics
//!
//! Counters are bumped by the decoder and the processor as side effects;
//! they never change what the protocol does. Once per second of steady
//! traffic the counters are folded into a [`LinkReport`].

use embassy_time::{Duration, Instant};

/// Length of one statistics window
pub const STATS_WINDOW: Duration = Duration::from_millis(1000);

/// Extra time a window may run before it is discarded instead of reported
pub const STATS_WINDOW_SLACK: Duration = Duration::from_millis(25);

/// A window with this many good frames or fewer is not reported
const MIN_REPORTED_FRAMES: u32 = 3;

/// Classification of the last window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkHealth {
    /// No data arrived during the window
    Idle,
    /// Every started frame was accepted
    Stable,
    /// Some started frames were rejected
    Lossy,
}

/// Summary of one statistics window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkReport {
    /// Frames that passed validation
    pub good_frames: u32,
    /// Frames whose header was seen, valid or not
    pub total_frames: u32,
    /// Transmissions started
    pub shows: u32,
    pub health: LinkHealth,
}

impl LinkReport {
    const fn idle() -> Self {
        Self {
            good_frames: 0,
            total_frames: 0,
            shows: 0,
            health: LinkHealth::Idle,
        }
    }
}

/// Frame and transmission counters for the current window
#[derive(Debug, Clone)]
pub struct Statistics {
    window_start: Instant,
    frame_start: Instant,
    good_frames: u32,
    total_frames: u32,
    shows: u32,
    last_report: Option<LinkReport>,
}

impl Statistics {
    pub const fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frame_start: now,
            good_frames: 0,
            total_frames: 0,
            shows: 0,
            last_report: None,
        }
    }

    pub fn increase_total(&mut self) {
        self.total_frames = self.total_frames.saturating_add(1);
    }

    pub fn increase_good(&mut self) {
        self.good_frames = self.good_frames.saturating_add(1);
    }

    pub fn increase_show(&mut self) {
        self.shows = self.shows.saturating_add(1);
    }

    pub fn record_frame_start(&mut self, now: Instant) {
        self.frame_start = now;
    }

    pub const fn good_frames(&self) -> u32 {
        self.good_frames
    }

    pub const fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub const fn shows(&self) -> u32 {
        self.shows
    }

    pub const fn window_start(&self) -> Instant {
        self.window_start
    }

    /// When the header of the most recent frame arrived
    pub const fn last_frame_start(&self) -> Instant {
        self.frame_start
    }

    /// The most recently published report
    pub const fn last_report(&self) -> Option<LinkReport> {
        self.last_report
    }

    /// Close the window if it is due
    ///
    /// Returns the report when a full window of steady traffic was seen.
    /// Windows that ran too long are dropped without a report so a stall
    /// does not show up as a low frame rate.
    pub fn update(&mut self, now: Instant, has_data: bool) -> Option<LinkReport> {
        let elapsed = now.saturating_duration_since(self.window_start);

        if has_data
            && elapsed >= STATS_WINDOW
            && elapsed <= STATS_WINDOW + STATS_WINDOW_SLACK
            && self.good_frames > MIN_REPORTED_FRAMES
        {
            let report = self.snapshot();
            self.reset(now);
            self.last_report = Some(report);

            #[cfg(feature = "defmt")]
            defmt::info!("[Statistics] {}", report);

            return Some(report);
        }

        if elapsed > STATS_WINDOW + STATS_WINDOW_SLACK {
            self.light_reset(now, has_data);
        }
        None
    }

    fn snapshot(&self) -> LinkReport {
        let health = if self.good_frames >= self.total_frames {
            LinkHealth::Stable
        } else {
            LinkHealth::Lossy
        };
        LinkReport {
            good_frames: self.good_frames,
            total_frames: self.total_frames,
            shows: self.shows,
            health,
        }
    }

    fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.good_frames = 0;
        self.total_frames = 0;
        self.shows = 0;
    }

    fn light_reset(&mut self, now: Instant, has_data: bool) {
        self.reset(now);
        if !has_data {
            self.last_report = Some(LinkReport::idle());
        }
    }
}
