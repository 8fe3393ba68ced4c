//! LED transmission
//!
//! A [`LedOutput`] drives one strip, or one strip wired as two segments,
//! through [`TransmitBackend`]s. Backends own their transfer memory and
//! report completion through a [`TransmitCompletion`] written from the
//! transfer-complete interrupt.
//!
//! Rendering never blocks. A render requested while a transfer is in
//! flight, or before the LEDs had their reset time, stays pending and is
//! retried by the processing task. Frames that complete in the meantime
//! overwrite the staged pixels, so only the latest one is shown.

mod buffer;
pub mod completion;
pub mod dotstar;
pub mod family;
pub mod guard;
pub mod neopixel;
pub mod parallel;
pub mod slot;

use embassy_time::Instant;

pub use completion::TransmitCompletion;
pub use dotstar::{DotstarBus, dotstar_buffer_len};
pub use family::{Lanes, LedFamily};
pub use guard::ResetGuard;
pub use neopixel::{NeopixelBus, neopixel_buffer_len};
pub use parallel::{LaneBus, LaneHandle, LaneLut, LaneMux, SharedLaneMux, parallel_buffer_len};
pub use slot::BusSlot;

use crate::color::{ColorLayout, Pixel};
use crate::error::{Error, Result};
use crate::protocol::PixelSink;

/// What happened to a render request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderOutcome {
    /// Nothing was pending
    Idle,
    /// A transfer was handed to the hardware
    Started,
    /// A transfer is still in flight
    Busy,
    /// The LEDs still need their reset time
    Settling { ready_at: Instant },
    /// Another lane starts the shared transfer
    Shared,
}

/// One physical LED bus
///
/// Implemented by every backend and by [`BusSlot`]. Indices are local to
/// the bus; writes past [`TransmitBackend::led_count`] are ignored.
pub trait TransmitBackend {
    fn layout(&self) -> ColorLayout;

    fn led_count(&self) -> usize;

    /// Rebuild for `led_count` LEDs, clearing all staged pixels
    fn resize(&mut self, led_count: usize) -> Result<()>;

    fn set_pixel(&mut self, index: usize, pixel: Pixel);

    /// No transfer in flight
    fn is_ready(&self) -> bool;

    /// Spin with a bounded number of retries until no transfer is in flight
    fn is_ready_blocking(&self) -> bool;

    /// Earliest instant a render could start, `None` while busy
    fn earliest_start(&self) -> Option<Instant>;

    /// Start a transfer of the staged pixels if the line allows it
    fn render(&mut self, now: Instant) -> RenderOutcome;
}

/// Where a strip wired as two segments is cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SegmentSplit {
    /// First logical index that belongs to the second segment
    pub start_index: usize,
    /// Second segment is wired from its far end
    pub reversed: bool,
}

/// Compile-time output settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputConfig {
    /// Largest LED count the host may announce
    pub max_leds: usize,
    pub split: Option<SegmentSplit>,
}

impl OutputConfig {
    pub const fn new(max_leds: usize) -> Self {
        Self {
            max_leds,
            split: None,
        }
    }

    pub const fn with_split(mut self, start_index: usize, reversed: bool) -> Self {
        self.split = Some(SegmentSplit {
            start_index,
            reversed,
        });
        self
    }
}

/// Maps logical LED indices onto one or two backends
pub struct LedOutput<B: TransmitBackend> {
    primary: B,
    secondary: Option<B>,
    config: OutputConfig,
    led_count: usize,
    pending: bool,
}

impl<B: TransmitBackend> LedOutput<B> {
    /// Output over a single backend
    pub const fn single(primary: B, max_leds: usize) -> Self {
        Self {
            primary,
            secondary: None,
            config: OutputConfig::new(max_leds),
            led_count: 0,
            pending: false,
        }
    }

    /// Output over two segments, the second starting at `split.start_index`
    pub const fn split(primary: B, secondary: B, max_leds: usize, split: SegmentSplit) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
            config: OutputConfig {
                max_leds,
                split: Some(split),
            },
            led_count: 0,
            pending: false,
        }
    }

    pub const fn config(&self) -> OutputConfig {
        self.config
    }

    pub const fn led_count(&self) -> usize {
        self.led_count
    }

    pub const fn primary(&self) -> &B {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut B {
        &mut self.primary
    }

    pub const fn secondary(&self) -> Option<&B> {
        self.secondary.as_ref()
    }

    pub fn secondary_mut(&mut self) -> Option<&mut B> {
        self.secondary.as_mut()
    }

    /// Rebuild the backends for `led_count` LEDs
    ///
    /// Waits for a transfer in flight first since the backends drop their
    /// buffers. Any pending render refers to the old layout and is dropped.
    /// If a backend cannot take its share, every backend is emptied so the
    /// segments never disagree.
    pub fn configure(&mut self, led_count: usize) -> Result<()> {
        if led_count > self.config.max_leds {
            return Err(Error::TooManyLeds {
                requested: led_count,
                max: self.config.max_leds,
            });
        }

        if !self.wait_ready_blocking() {
            #[cfg(feature = "defmt")]
            defmt::warn!("[LedOutput.configure] transfer still running, resizing anyway");
        }
        self.pending = false;

        if let Err(err) = self.resize_segments(led_count) {
            self.clear_segments();
            return Err(err);
        }
        self.led_count = led_count;

        #[cfg(feature = "defmt")]
        defmt::info!("[LedOutput.configure] {=usize} LEDs", led_count);
        Ok(())
    }

    /// Stage one pixel, returns whether more pixels follow
    pub fn set_pixel(&mut self, index: usize, pixel: Pixel) -> bool {
        match (&mut self.secondary, self.config.split) {
            (Some(secondary), Some(split)) if index >= split.start_index => {
                let local = index - split.start_index;
                let local = if split.reversed {
                    secondary.led_count().saturating_sub(local + 1)
                } else {
                    local
                };
                secondary.set_pixel(local, pixel);
            }
            _ => self.primary.set_pixel(index, pixel),
        }
        index + 1 < self.led_count
    }

    /// Mark the staged frame for display and try to start it
    pub fn request_render(&mut self, now: Instant) -> RenderOutcome {
        self.pending = true;
        self.render_pending(now)
    }

    /// Start the pending frame if every backend can take it
    ///
    /// Either all segments start together or none does, so both halves of
    /// the strip always show the same frame.
    pub fn render_pending(&mut self, now: Instant) -> RenderOutcome {
        if !self.pending {
            return RenderOutcome::Idle;
        }

        let mut ready_at = Instant::MIN;
        for backend in self.active_backends() {
            match backend.earliest_start() {
                None => return RenderOutcome::Busy,
                Some(at) => ready_at = ready_at.max(at),
            }
        }
        if ready_at > now {
            return RenderOutcome::Settling { ready_at };
        }

        self.pending = false;
        let mut outcome = RenderOutcome::Idle;
        for backend in self.active_backends_mut() {
            match backend.render(now) {
                RenderOutcome::Started => outcome = RenderOutcome::Started,
                RenderOutcome::Shared => {
                    if outcome == RenderOutcome::Idle {
                        outcome = RenderOutcome::Shared;
                    }
                }
                _other => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("[LedOutput.render] backend refused: {}", _other);
                }
            }
        }
        outcome
    }

    pub const fn has_pending_render(&self) -> bool {
        self.pending
    }

    /// Forget the pending frame without showing it
    pub fn drop_pending_render(&mut self) {
        self.pending = false;
    }

    /// Whether no backend has a transfer in flight
    pub fn is_ready(&self) -> bool {
        self.active_backends().all(TransmitBackend::is_ready)
    }

    fn resize_segments(&mut self, led_count: usize) -> Result<()> {
        match (&mut self.secondary, self.config.split) {
            (Some(secondary), Some(split)) if led_count > split.start_index => {
                self.primary.resize(split.start_index)?;
                secondary.resize(led_count - split.start_index)
            }
            (Some(secondary), _) => {
                self.primary.resize(led_count)?;
                secondary.resize(0)
            }
            (None, _) => self.primary.resize(led_count),
        }
    }

    fn clear_segments(&mut self) {
        // zero length always fits
        let _ = self.primary.resize(0);
        if let Some(secondary) = &mut self.secondary {
            let _ = secondary.resize(0);
        }
        self.led_count = 0;
    }

    fn wait_ready_blocking(&self) -> bool {
        let primary = self.primary.is_ready_blocking();
        let secondary = self
            .secondary
            .as_ref()
            .is_none_or(TransmitBackend::is_ready_blocking);
        primary && secondary
    }

    fn active_backends(&self) -> impl Iterator<Item = &B> {
        core::iter::once(&self.primary)
            .chain(self.secondary.as_ref())
            .filter(|backend| backend.led_count() > 0)
    }

    fn active_backends_mut(&mut self) -> impl Iterator<Item = &mut B> {
        core::iter::once(&mut self.primary)
            .chain(self.secondary.as_mut())
            .filter(|backend| backend.led_count() > 0)
    }
}

impl<B: TransmitBackend> PixelSink for LedOutput<B> {
    fn led_count(&self) -> usize {
        self.led_count
    }

    fn configure(&mut self, led_count: usize) -> Result<()> {
        LedOutput::configure(self, led_count)
    }

    fn set_pixel(&mut self, index: usize, pixel: Pixel) -> bool {
        LedOutput::set_pixel(self, index, pixel)
    }

    fn request_render(&mut self, now: Instant) -> RenderOutcome {
        LedOutput::request_render(self, now)
    }
}
