//! Backend selection without trait objects
//!
//! All backends a device can be built with live in one enum, so the output
//! manager stays free of heap allocation and dynamic dispatch.

use embassy_time::Instant;

use super::dotstar::DotstarBus;
use super::neopixel::NeopixelBus;
use super::parallel::LaneBus;
use super::{RenderOutcome, TransmitBackend};
use crate::Transmitter;
use crate::color::{ColorLayout, Pixel};
use crate::error::Result;

/// Any transmit backend sharing one transmitter type and buffer size
pub enum BusSlot<'m, 'a, T: Transmitter, const BYTES: usize> {
    /// One-wire strip on its own line
    Neopixel(NeopixelBus<'a, T, BYTES>),
    /// Clocked two-wire strip
    Dotstar(DotstarBus<'a, T, BYTES>),
    /// One lane of a parallel transfer
    Lane(LaneBus<'m, 'a, T, BYTES>),
}

impl<'a, T: Transmitter, const BYTES: usize> From<NeopixelBus<'a, T, BYTES>>
    for BusSlot<'_, 'a, T, BYTES>
{
    fn from(bus: NeopixelBus<'a, T, BYTES>) -> Self {
        Self::Neopixel(bus)
    }
}

impl<'a, T: Transmitter, const BYTES: usize> From<DotstarBus<'a, T, BYTES>>
    for BusSlot<'_, 'a, T, BYTES>
{
    fn from(bus: DotstarBus<'a, T, BYTES>) -> Self {
        Self::Dotstar(bus)
    }
}

impl<'m, 'a, T: Transmitter, const BYTES: usize> From<LaneBus<'m, 'a, T, BYTES>>
    for BusSlot<'m, 'a, T, BYTES>
{
    fn from(bus: LaneBus<'m, 'a, T, BYTES>) -> Self {
        Self::Lane(bus)
    }
}

impl<T: Transmitter, const BYTES: usize> TransmitBackend for BusSlot<'_, '_, T, BYTES> {
    fn layout(&self) -> ColorLayout {
        match self {
            Self::Neopixel(bus) => bus.layout(),
            Self::Dotstar(bus) => bus.layout(),
            Self::Lane(bus) => bus.layout(),
        }
    }

    fn led_count(&self) -> usize {
        match self {
            Self::Neopixel(bus) => bus.led_count(),
            Self::Dotstar(bus) => bus.led_count(),
            Self::Lane(bus) => bus.led_count(),
        }
    }

    fn resize(&mut self, led_count: usize) -> Result<()> {
        match self {
            Self::Neopixel(bus) => bus.resize(led_count),
            Self::Dotstar(bus) => bus.resize(led_count),
            Self::Lane(bus) => bus.resize(led_count),
        }
    }

    fn set_pixel(&mut self, index: usize, pixel: Pixel) {
        match self {
            Self::Neopixel(bus) => bus.set_pixel(index, pixel),
            Self::Dotstar(bus) => bus.set_pixel(index, pixel),
            Self::Lane(bus) => bus.set_pixel(index, pixel),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            Self::Neopixel(bus) => bus.is_ready(),
            Self::Dotstar(bus) => bus.is_ready(),
            Self::Lane(bus) => bus.is_ready(),
        }
    }

    fn is_ready_blocking(&self) -> bool {
        match self {
            Self::Neopixel(bus) => bus.is_ready_blocking(),
            Self::Dotstar(bus) => bus.is_ready_blocking(),
            Self::Lane(bus) => bus.is_ready_blocking(),
        }
    }

    fn earliest_start(&self) -> Option<Instant> {
        match self {
            Self::Neopixel(bus) => bus.earliest_start(),
            Self::Dotstar(bus) => bus.earliest_start(),
            Self::Lane(bus) => bus.earliest_start(),
        }
    }

    fn render(&mut self, now: Instant) -> RenderOutcome {
        match self {
            Self::Neopixel(bus) => bus.render(now),
            Self::Dotstar(bus) => bus.render(now),
            Self::Lane(bus) => bus.render(now),
        }
    }
}
