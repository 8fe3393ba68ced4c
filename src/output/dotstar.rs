//! Clocked two-wire output (APA102 and compatibles)
//!
//! Transfer layout: a start frame of four zero bytes, one four-byte word per
//! LED in wire order, then an end frame of `0xFF` bytes that gives the
//! clock enough edges to push the last pixel through the chain.

use embassy_time::Instant;

use super::buffer::TransferBuffer;
use super::completion::TransmitCompletion;
use super::family::{Lanes, LedFamily};
use super::guard::ResetGuard;
use super::{RenderOutcome, TransmitBackend};
use crate::Transmitter;
use crate::color::{ColorLayout, Pixel};
use crate::error::Result;

/// Bytes per LED and per framing word
pub const DOTSTAR_WORD_BYTES: usize = 4;

/// Transfer buffer size needed for `led_count` LEDs
pub const fn dotstar_buffer_len(led_count: usize) -> usize {
    (led_count + 2) * DOTSTAR_WORD_BYTES
}

const END_FRAME_BYTE: u8 = 0xFF;

/// Clocked LED strip on an SPI-style data and clock pair
pub struct DotstarBus<'a, T: Transmitter, const BYTES: usize> {
    buffer: TransferBuffer<'a, T, BYTES>,
    layout: ColorLayout,
    led_count: usize,
}

impl<'a, T: Transmitter, const BYTES: usize> DotstarBus<'a, T, BYTES> {
    pub const fn new(family: LedFamily, transmitter: T, completion: &'a TransmitCompletion) -> Self {
        Self {
            buffer: TransferBuffer::new(
                transmitter,
                completion,
                ResetGuard::new(family.reset_time(Lanes::Single)),
            ),
            layout: family.layout(),
            led_count: 0,
        }
    }

    pub fn transmitter(&self) -> &T {
        self.buffer.transmitter()
    }

    pub fn transmitter_mut(&mut self) -> &mut T {
        self.buffer.transmitter_mut()
    }

    fn write_framing(&mut self) {
        let end = self.buffer.len();
        let staging = self.buffer.staging_mut();
        if end < 2 * DOTSTAR_WORD_BYTES {
            return;
        }
        staging[..DOTSTAR_WORD_BYTES].fill(0);
        staging[end - DOTSTAR_WORD_BYTES..].fill(END_FRAME_BYTE);
    }
}

impl<T: Transmitter, const BYTES: usize> TransmitBackend for DotstarBus<'_, T, BYTES> {
    fn layout(&self) -> ColorLayout {
        self.layout
    }

    fn led_count(&self) -> usize {
        self.led_count
    }

    fn resize(&mut self, led_count: usize) -> Result<()> {
        let len = if led_count == 0 {
            0
        } else {
            dotstar_buffer_len(led_count)
        };
        self.buffer.resize(len)?;
        self.led_count = led_count;
        Ok(())
    }

    fn set_pixel(&mut self, index: usize, pixel: Pixel) {
        if index >= self.led_count {
            return;
        }

        let wire = self.layout.wire_bytes(pixel);
        let start = (index + 1) * DOTSTAR_WORD_BYTES;
        let word = &mut self.buffer.staging_mut()[start..start + DOTSTAR_WORD_BYTES];
        word[..wire.len()].copy_from_slice(wire.as_slice());
    }

    fn is_ready(&self) -> bool {
        self.buffer.is_ready()
    }

    fn is_ready_blocking(&self) -> bool {
        self.buffer.completion().wait_ready_blocking()
    }

    fn earliest_start(&self) -> Option<Instant> {
        self.buffer.earliest_start()
    }

    fn render(&mut self, now: Instant) -> RenderOutcome {
        self.write_framing();
        self.buffer.render(now)
    }
}
