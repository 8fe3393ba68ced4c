//! Parallel lane output
//!
//! Up to eight one-wire strips share a single transfer. Every output byte
//! is one bit-cell: bit `L` of the byte is the level of lane `L` for that
//! bit time. A pixel therefore expands to `8 * bytes_per_pixel` bytes, and
//! a write replaces only its own lane's bit in them, so lanes can be written
//! in any order and a pixel can be rewritten before the next transfer.
//!
//! The hardware pulls 32-bit words and shifts them out most significant byte
//! first. For a wire byte `b` at position `k` of a pixel, the word at `8k`
//! carries bits 7..4 of `b` and the word at `8k + 4` carries bits 3..0, each
//! stored little-endian so bit 7 lands in the top byte.
//!
//! All lanes live in one [`LaneMux`]. Registering a lane rebuilds the shared
//! buffer and bumps its generation; [`LaneHandle`]s from an older generation
//! are rejected with [`Error::StaleLane`] instead of writing into a buffer
//! whose geometry they no longer match.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_time::Instant;

use super::buffer::TransferBuffer;
use super::completion::TransmitCompletion;
use super::family::{Lanes, LedFamily};
use super::guard::ResetGuard;
use super::{RenderOutcome, TransmitBackend};
use crate::Transmitter;
use crate::color::{ColorLayout, Pixel};
use crate::error::{Error, Result};

/// Lanes one transfer can carry
pub const MAX_LANES: usize = 8;

/// Bit-cells per wire byte
pub const CELLS_PER_BYTE: usize = 8;

/// Bit-cells filled from one nibble
const CELLS_PER_NIBBLE: usize = 4;

/// Transfer buffer size needed for `max_leds` LEDs per lane
pub const fn parallel_buffer_len(max_leds: usize, layout: ColorLayout) -> usize {
    max_leds * CELLS_PER_BYTE * layout.bytes_per_pixel()
}

/// Nibble to bit-cell lookup table of one lane
///
/// Entry `n` holds four cells; cell `i` is the lane mask if bit `i` of `n`
/// is set and zero otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneLut([[u8; CELLS_PER_NIBBLE]; 16]);

impl LaneLut {
    pub const fn new(lane_mask: u8) -> Self {
        let mut table = [[0; CELLS_PER_NIBBLE]; 16];
        let mut nibble = 0;
        while nibble < 16 {
            let mut bit = 0;
            while bit < CELLS_PER_NIBBLE {
                if nibble & (1 << bit) != 0 {
                    table[nibble][bit] = lane_mask;
                }
                bit += 1;
            }
            nibble += 1;
        }
        Self(table)
    }

    pub const fn entry(&self, nibble: u8) -> [u8; CELLS_PER_NIBBLE] {
        self.0[(nibble & 0x0F) as usize]
    }
}

/// Registration of one lane in a [`LaneMux`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneHandle {
    lane: u8,
    mask: u8,
    generation: u32,
    lut: LaneLut,
}

impl LaneHandle {
    pub const fn lane(&self) -> u8 {
        self.lane
    }

    pub const fn mask(&self) -> u8 {
        self.mask
    }

    /// Buffer generation this handle was issued for
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Shared bit-plane buffer and transmitter of all parallel lanes
pub struct LaneMux<'a, T: Transmitter, const BYTES: usize> {
    buffer: TransferBuffer<'a, T, BYTES>,
    layout: ColorLayout,
    lanes: u8,
    lane_leds: [usize; MAX_LANES],
    max_leds: usize,
    generation: u32,
}

/// A [`LaneMux`] that lanes can reach from the processing task
pub type SharedLaneMux<'a, T, const BYTES: usize> = Mutex<RefCell<LaneMux<'a, T, BYTES>>>;

impl<'a, T: Transmitter, const BYTES: usize> LaneMux<'a, T, BYTES> {
    pub const fn new(family: LedFamily, transmitter: T, completion: &'a TransmitCompletion) -> Self {
        Self::with_layout(
            family.layout(),
            ResetGuard::new(family.reset_time(Lanes::Parallel)),
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
            lanes: 0,
            lane_leds: [0; MAX_LANES],
            max_leds: 0,
            generation: 0,
        }
    }

    /// Wrap the mux for sharing between lanes
    pub const fn into_shared(self) -> SharedLaneMux<'a, T, BYTES> {
        Mutex::new(RefCell::new(self))
    }

    pub const fn layout(&self) -> ColorLayout {
        self.layout
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Longest lane, the buffer is sized for it
    pub const fn max_leds(&self) -> usize {
        self.max_leds
    }

    pub const fn lane_count(&self) -> u32 {
        self.lanes.count_ones()
    }

    /// Lane that triggers the shared transfer
    ///
    /// The lowest registered lane with LEDs, or the lowest registered lane
    /// if all of them are empty.
    #[allow(clippy::cast_possible_truncation)]
    pub fn leader(&self) -> Option<u8> {
        if self.lanes == 0 {
            return None;
        }
        let first = self.lanes.trailing_zeros() as u8;
        let lit = (0..MAX_LANES as u8)
            .find(|&lane| self.lanes & (1 << lane) != 0 && self.lane_leds[usize::from(lane)] > 0);
        Some(lit.unwrap_or(first))
    }

    pub const fn completion(&self) -> &'a TransmitCompletion {
        self.buffer.completion()
    }

    pub fn transmitter(&self) -> &T {
        self.buffer.transmitter()
    }

    pub fn transmitter_mut(&mut self) -> &mut T {
        self.buffer.transmitter_mut()
    }

    /// Bit-cells staged for the next transfer
    pub fn staging(&self) -> &[u8] {
        self.buffer.staging()
    }

    /// Claim the lowest free lane for a strip of `led_count` LEDs
    ///
    /// The shared buffer is rebuilt, which invalidates every handle issued
    /// before.
    #[allow(clippy::cast_possible_truncation)]
    pub fn register(&mut self, led_count: usize) -> Result<LaneHandle> {
        let free = !self.lanes;
        if free == 0 {
            return Err(Error::NoFreeLane);
        }
        let lane = free.trailing_zeros() as u8;
        let mask = 1 << lane;

        self.rebuild(self.max_leds.max(led_count))?;
        self.lanes |= mask;
        self.lane_leds[usize::from(lane)] = led_count;

        Ok(LaneHandle {
            lane,
            mask,
            generation: self.generation,
            lut: LaneLut::new(mask),
        })
    }

    /// Release a lane and blank its bits; the last one out frees the buffer
    pub fn release(&mut self, handle: &LaneHandle) {
        if self.check_registered(handle).is_err() {
            return;
        }
        self.lanes &= !handle.mask;
        self.lane_leds[usize::from(handle.lane)] = 0;
        if self.lanes == 0 {
            self.max_leds = 0;
            self.generation = self.generation.wrapping_add(1);
            // zero length always fits
            let _ = self.buffer.resize(0);
        } else {
            self.clear_lane(handle.mask);
        }
    }

    /// Change the length of one lane, growing the buffer if needed
    ///
    /// The lane starts blank. The buffer never shrinks while lanes are
    /// registered.
    pub fn resize_lane(&mut self, handle: &mut LaneHandle, led_count: usize) -> Result<()> {
        self.check_registered(handle)?;
        if led_count > self.max_leds {
            self.rebuild(led_count)?;
        } else {
            self.clear_lane(handle.mask);
        }
        self.lane_leds[usize::from(handle.lane)] = led_count;
        handle.generation = self.generation;
        Ok(())
    }

    /// Bring a handle up to the current generation
    pub fn refresh(&self, handle: &mut LaneHandle) -> Result<()> {
        self.check_registered(handle)?;
        handle.generation = self.generation;
        Ok(())
    }

    /// Write the bits of `pixel` into the cells of lane `handle`
    ///
    /// Indices past the longest lane are ignored.
    pub fn set_pixel(&mut self, handle: &LaneHandle, index: usize, pixel: Pixel) -> Result<()> {
        self.check_registered(handle)?;
        if handle.generation != self.generation {
            return Err(Error::StaleLane {
                handle: handle.generation,
                current: self.generation,
            });
        }
        if index >= self.max_leds {
            return Ok(());
        }

        let wire = self.layout.wire_bytes(pixel);
        let pixel_cells = CELLS_PER_BYTE * self.layout.bytes_per_pixel();
        let base = index * pixel_cells;
        let staging = self.buffer.staging_mut();

        for (position, &byte) in wire.as_slice().iter().enumerate() {
            let high = base + position * CELLS_PER_BYTE;
            let low = high + CELLS_PER_NIBBLE;
            write_cells(&mut staging[high..low], handle.mask, handle.lut.entry(byte >> 4));
            write_cells(
                &mut staging[low..low + CELLS_PER_NIBBLE],
                handle.mask,
                handle.lut.entry(byte),
            );
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.buffer.is_ready()
    }

    pub fn earliest_start(&self) -> Option<Instant> {
        self.buffer.earliest_start()
    }

    /// Transfer all lanes at once
    pub fn render(&mut self, now: Instant) -> RenderOutcome {
        self.buffer.render(now)
    }

    fn rebuild(&mut self, max_leds: usize) -> Result<()> {
        self.buffer
            .resize(parallel_buffer_len(max_leds, self.layout))?;
        self.max_leds = max_leds;
        self.generation = self.generation.wrapping_add(1);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "[LaneMux] rebuilt for {=usize} LEDs per lane, generation {=u32}",
            max_leds,
            self.generation
        );
        Ok(())
    }

    fn clear_lane(&mut self, mask: u8) {
        for cell in self.buffer.staging_mut() {
            *cell &= !mask;
        }
    }

    const fn check_registered(&self, handle: &LaneHandle) -> Result<()> {
        if self.lanes & handle.mask == 0 {
            return Err(Error::LaneReleased);
        }
        Ok(())
    }
}

/// Replace the `mask` bit of each cell, other lanes stay untouched
fn write_cells(cells: &mut [u8], mask: u8, bits: [u8; CELLS_PER_NIBBLE]) {
    for (cell, bit) in cells.iter_mut().zip(bits) {
        *cell = (*cell & !mask) | bit;
    }
}

/// One lane of a [`LaneMux`] as a transmit backend
///
/// Every access goes through the mux; a handle outdated by another lane's
/// registration or growth is refreshed on the spot.
pub struct LaneBus<'m, 'a, T: Transmitter, const BYTES: usize> {
    mux: &'m SharedLaneMux<'a, T, BYTES>,
    handle: LaneHandle,
    led_count: usize,
}

impl<'m, 'a, T: Transmitter, const BYTES: usize> LaneBus<'m, 'a, T, BYTES> {
    /// Register a new lane of `led_count` LEDs
    pub fn register(mux: &'m SharedLaneMux<'a, T, BYTES>, led_count: usize) -> Result<Self> {
        let handle = critical_section::with(|cs| mux.borrow(cs).borrow_mut().register(led_count))?;
        Ok(Self {
            mux,
            handle,
            led_count,
        })
    }

    pub const fn handle(&self) -> &LaneHandle {
        &self.handle
    }

    fn with_mux<R>(&self, f: impl FnOnce(&mut LaneMux<'a, T, BYTES>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.mux.borrow(cs).borrow_mut()))
    }

    fn completion(&self) -> &'a TransmitCompletion {
        self.with_mux(|mux| mux.completion())
    }
}

impl<T: Transmitter, const BYTES: usize> TransmitBackend for LaneBus<'_, '_, T, BYTES> {
    fn layout(&self) -> ColorLayout {
        self.with_mux(|mux| mux.layout())
    }

    fn led_count(&self) -> usize {
        self.led_count
    }

    fn resize(&mut self, led_count: usize) -> Result<()> {
        let handle = &mut self.handle;
        critical_section::with(|cs| {
            self.mux
                .borrow(cs)
                .borrow_mut()
                .resize_lane(handle, led_count)
        })?;
        self.led_count = led_count;
        Ok(())
    }

    fn set_pixel(&mut self, index: usize, pixel: Pixel) {
        if index >= self.led_count {
            return;
        }

        let handle = &mut self.handle;
        critical_section::with(|cs| {
            let mut mux = self.mux.borrow(cs).borrow_mut();
            if let Err(Error::StaleLane { .. }) = mux.set_pixel(handle, index, pixel) {
                if mux.refresh(handle).is_ok() {
                    let _ = mux.set_pixel(handle, index, pixel);
                }
            }
        });
    }

    fn is_ready(&self) -> bool {
        self.with_mux(|mux| mux.is_ready())
    }

    fn is_ready_blocking(&self) -> bool {
        // spin outside the critical section so the completion interrupt can run
        self.completion().wait_ready_blocking()
    }

    fn earliest_start(&self) -> Option<Instant> {
        self.with_mux(|mux| mux.earliest_start())
    }

    fn render(&mut self, now: Instant) -> RenderOutcome {
        let lane = self.handle.lane;
        self.with_mux(|mux| {
            if mux.leader() == Some(lane) {
                mux.render(now)
            } else {
                RenderOutcome::Shared
            }
        })
    }
}

impl<T: Transmitter, const BYTES: usize> Drop for LaneBus<'_, '_, T, BYTES> {
    fn drop(&mut self) {
        let handle = self.handle;
        self.with_mux(|mux| mux.release(&handle));
    }
}
