//! Byte-synchronous frame decoder
//!
//! Wire format, one frame:
//!
//! ```text
//! 'A' 'd' 'a' count_hi count_lo crc (R G B) * (count + 1) [trailer]
//! ```
//!
//! `count` is the number of LEDs minus one, big-endian. `crc` is
//! [`header_crc`] over the two count bytes. Pixels are written to a
//! [`PixelSink`] as soon as their last channel arrives, so a frame is never
//! materialized in memory. Any trailing checksum bytes are skipped by the
//! magic scanner like any other noise.
//!
//! A valid `count_hi` never exceeds `0x0F`, so an `'A'` in its place is
//! taken as the start of new magic. A trailer that happens to read `"Ada"`
//! therefore does not swallow the header of the frame behind it.

pub mod checksum;

use embassy_time::Instant;

pub use checksum::{Fletcher, PayloadChecksum, header_crc};

use crate::calibration::{RgbOnly, WhiteExtraction};
use crate::color::{Pixel, Rgb};
use crate::error::{Error, Result};
use crate::output::RenderOutcome;
use crate::stats::{LinkReport, Statistics};

/// Frame magic
pub const MAGIC: [u8; 3] = *b"Ada";

/// Largest LED count a frame may announce
pub const MAX_LED_COUNT: usize = 4096;

/// Magic, two count bytes and the check byte
pub const HEADER_LEN: usize = MAGIC.len() + 3;

/// Bytes per LED in the payload
pub const CHANNELS_PER_LED: usize = 3;

/// Length of a complete frame for `led_count` LEDs, trailer excluded
pub const fn frame_len(led_count: usize) -> usize {
    HEADER_LEN + led_count * CHANNELS_PER_LED
}

/// Where the decoder is inside the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolState {
    /// Waiting for `'A'`
    HeaderA,
    /// Waiting for `'d'`
    HeaderD,
    /// Waiting for `'a'`
    HeaderLowerA,
    /// High byte of the LED count
    HeaderHi,
    /// Low byte of the LED count
    HeaderLo,
    /// Header check byte
    HeaderCrc,
    Red,
    Green,
    Blue,
    /// Frame fully received, left again within the same step
    Final,
}

/// Receiver of decoded pixels
///
/// Implemented by [`LedOutput`](crate::output::LedOutput); tests provide
/// recording sinks.
pub trait PixelSink {
    /// Number of LEDs the sink is configured for
    fn led_count(&self) -> usize;

    /// Resize the sink for a new LED count
    fn configure(&mut self, led_count: usize) -> Result<()>;

    /// Store one pixel, returns `true` while more pixels are expected
    fn set_pixel(&mut self, index: usize, pixel: Pixel) -> bool;

    /// Show the pixels written so far
    fn request_render(&mut self, now: Instant) -> RenderOutcome;
}

/// Result of feeding a single byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeEvent {
    /// Byte consumed, frame still in progress (or waiting for magic)
    Pending,
    /// A magic byte did not match, scanning restarted
    SyncLost,
    /// Header check byte did not match the count bytes
    HeaderRejected,
    /// Announced LED count exceeds the protocol limit
    Oversized { led_count: usize },
    /// The output could not be resized for the announced LED count
    OutputRejected { led_count: usize, error: Error },
    /// Last pixel stored and a render was requested
    FrameComplete {
        render: RenderOutcome,
        /// Statistics window closed by this frame
        report: Option<LinkReport>,
    },
}

/// Frame protocol state machine
///
/// Holds only what is needed to place the next byte: the state, the
/// count being parsed, the pixel under construction and the checksum
/// accumulators.
#[derive(Debug)]
pub struct FrameDecoder<W: WhiteExtraction = RgbOnly> {
    state: ProtocolState,
    count: u16,
    crc: u8,
    current_led: usize,
    color: Rgb,
    fletcher: Fletcher,
    last_checksum: Option<PayloadChecksum>,
    white: W,
}

impl FrameDecoder<RgbOnly> {
    pub const fn new() -> Self {
        Self::with_white_extraction(RgbOnly)
    }
}

impl Default for FrameDecoder<RgbOnly> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WhiteExtraction> FrameDecoder<W> {
    /// Create a decoder that expands every RGB triplet through `white`
    pub const fn with_white_extraction(white: W) -> Self {
        Self {
            state: ProtocolState::HeaderA,
            count: 0,
            crc: 0,
            current_led: 0,
            color: Rgb { r: 0, g: 0, b: 0 },
            fletcher: Fletcher::new(),
            last_checksum: None,
            white,
        }
    }

    pub const fn state(&self) -> ProtocolState {
        self.state
    }

    /// Index of the pixel currently being received
    pub const fn current_led(&self) -> usize {
        self.current_led
    }

    /// Payload checksum of the last completed frame
    pub const fn payload_checksum(&self) -> Option<PayloadChecksum> {
        self.last_checksum
    }

    /// Drop the frame in progress and wait for magic again
    pub fn resync(&mut self) {
        self.state = ProtocolState::HeaderA;
    }

    /// Feed one received byte
    pub fn feed<S: PixelSink>(
        &mut self,
        byte: u8,
        sink: &mut S,
        stats: &mut Statistics,
        now: Instant,
    ) -> DecodeEvent {
        match self.state {
            ProtocolState::HeaderA => {
                if byte == MAGIC[0] {
                    self.state = ProtocolState::HeaderD;
                }
                DecodeEvent::Pending
            }
            ProtocolState::HeaderD => self.match_magic(byte, MAGIC[1], ProtocolState::HeaderLowerA),
            ProtocolState::HeaderLowerA => self.match_magic(byte, MAGIC[2], ProtocolState::HeaderHi),
            ProtocolState::HeaderHi if byte == MAGIC[0] => {
                self.state = ProtocolState::HeaderD;
                DecodeEvent::SyncLost
            }
            ProtocolState::HeaderHi => {
                stats.increase_total();
                stats.record_frame_start(now);
                self.start_frame(byte);
                self.state = ProtocolState::HeaderLo;
                DecodeEvent::Pending
            }
            ProtocolState::HeaderLo => {
                self.count |= u16::from(byte);
                self.crc = header_crc(self.count_hi(), byte);
                self.state = ProtocolState::HeaderCrc;
                DecodeEvent::Pending
            }
            ProtocolState::HeaderCrc => self.check_header(byte, sink),
            ProtocolState::Red => {
                self.color.r = byte;
                self.fletcher.add(byte);
                self.state = ProtocolState::Green;
                DecodeEvent::Pending
            }
            ProtocolState::Green => {
                self.color.g = byte;
                self.fletcher.add(byte);
                self.state = ProtocolState::Blue;
                DecodeEvent::Pending
            }
            ProtocolState::Blue => {
                self.color.b = byte;
                self.fletcher.add(byte);
                let pixel = self.white.expand(self.color);

                if sink.set_pixel(self.current_led, pixel) {
                    self.current_led += 1;
                    self.state = ProtocolState::Red;
                    DecodeEvent::Pending
                } else {
                    self.state = ProtocolState::Final;
                    self.finish_frame(sink, stats, now)
                }
            }
            // Never observed between calls, `finish_frame` leaves it immediately
            ProtocolState::Final => {
                self.state = ProtocolState::HeaderA;
                self.feed(byte, sink, stats, now)
            }
        }
    }

    /// Advance on a magic byte; a mismatch may itself be the start of new magic
    fn match_magic(&mut self, byte: u8, expected: u8, next: ProtocolState) -> DecodeEvent {
        if byte == expected {
            self.state = next;
            return DecodeEvent::Pending;
        }

        self.state = if byte == MAGIC[0] {
            ProtocolState::HeaderD
        } else {
            ProtocolState::HeaderA
        };
        DecodeEvent::SyncLost
    }

    fn start_frame(&mut self, count_hi: u8) {
        self.count = u16::from(count_hi) << 8;
        self.current_led = 0;
        self.fletcher.reset();
    }

    const fn count_hi(&self) -> u8 {
        self.count.to_be_bytes()[0]
    }

    fn check_header<S: PixelSink>(&mut self, byte: u8, sink: &mut S) -> DecodeEvent {
        if byte != self.crc {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "[FrameDecoder] header check mismatch: got {=u8:#x}, expected {=u8:#x}",
                byte,
                self.crc
            );
            self.state = ProtocolState::HeaderA;
            return DecodeEvent::HeaderRejected;
        }

        let led_count = usize::from(self.count) + 1;
        if led_count > MAX_LED_COUNT {
            self.state = ProtocolState::HeaderA;
            return DecodeEvent::Oversized { led_count };
        }

        if led_count != sink.led_count() {
            if let Err(error) = sink.configure(led_count) {
                #[cfg(feature = "defmt")]
                defmt::warn!("[FrameDecoder] cannot resize output: {}", error);
                self.state = ProtocolState::HeaderA;
                return DecodeEvent::OutputRejected { led_count, error };
            }
        }

        self.state = ProtocolState::Red;
        DecodeEvent::Pending
    }

    fn finish_frame<S: PixelSink>(
        &mut self,
        sink: &mut S,
        stats: &mut Statistics,
        now: Instant,
    ) -> DecodeEvent {
        stats.increase_good();
        self.last_checksum = Some(self.fletcher.finish());
        let render = sink.request_render(now);
        if render == RenderOutcome::Started {
            stats.increase_show();
        }
        let report = stats.update(now, true);
        self.state = ProtocolState::HeaderA;
        DecodeEvent::FrameComplete { render, report }
    }
}
