//! Single-lane one-wire output
//!
//! The shift-out hardware pulls one 32-bit word per LED and sends it most
//! significant byte first, so every pixel is stored as a little-endian word
//! with the first wire byte in the top byte. Three-byte layouts leave the
//! low byte unused.

use embassy_time::Instant;

use super::buffer::TransferBuffer;
use super::completion::TransmitCompletion;
use super::family::{Lanes, LedFamily};
use super::guard::ResetGuard;
use super::{RenderOutcome, TransmitBackend};
use crate::Transmitter;
use crate::color::{ColorLayout, Pixel};
use crate::error::Result;

/// Bytes per LED in the transfer buffer
pub const WORD_BYTES: usize = 4;

/// Transfer buffer size needed for `led_count` LEDs
pub const fn neopixel_buffer_len(led_count: usize) -> usize {
    led_count * WORD_BYTES
}

/// One-wire LED strip on its own data line
pub struct NeopixelBus<'a, T: Transmitter, const BYTES: usize> {
    buffer: TransferBuffer<'a, T, BYTES>,
    layout: ColorLayout,
    led_count: usize,
}

impl<'a, T: Transmitter, const BYTES: usize> NeopixelBus<'a, T, BYTES> {
    /// Create a bus with the layout and reset time of `family`
    pub const fn new(family: LedFamily, transmitter: T, completion: &'a TransmitCompletion) -> Self {
        Self::with_layout(
            family.layout(),
            ResetGuard::new(family.reset_time(Lanes::Single)),
            transmitter,
            completion,
        )
    }

    pub const fn with_layout(
        layout: ColorLayout,
        guard: ResetGuard,
        transmitter: T,
        completion: &'a TransmitCompletion,
    ) -> Self {
        Self {
            buffer: TransferBuffer::new(transmitter, completion, guard),
            layout,
            led_count: 0,
        }
    }

    pub fn transmitter(&self) -> &T {
        self.buffer.transmitter()
    }

    pub fn transmitter_mut(&mut self) -> &mut T {
        self.buffer.transmitter_mut()
    }

    /// Pixel words not yet handed to the hardware
    pub fn staging(&self) -> &[u8] {
        self.buffer.staging()
    }
}

impl<T: Transmitter, const BYTES: usize> TransmitBackend for NeopixelBus<'_, T, BYTES> {
    fn layout(&self) -> ColorLayout {
        self.layout
    }

    fn led_count(&self) -> usize {
        self.led_count
    }

    fn resize(&mut self, led_count: usize) -> Result<()> {
        self.buffer.resize(neopixel_buffer_len(led_count))?;
        self.led_count = led_count;
        Ok(())
    }

    fn set_pixel(&mut self, index: usize, pixel: Pixel) {
        if index >= self.led_count {
            return;
        }

        let wire = self.layout.wire_bytes(pixel);
        let start = index * WORD_BYTES;
        let word = &mut self.buffer.staging_mut()[start..start + WORD_BYTES];
        word.fill(0);
        for (offset, &byte) in wire.as_slice().iter().enumerate() {
            word[WORD_BYTES - 1 - offset] = byte;
        }
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
        self.buffer.render(now)
    }
}
