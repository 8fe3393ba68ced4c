//! Physical channel order of an LED family
//!
//! Every layout turns a [`Pixel`] into the bytes that leave the chip,
//! in transmission order. Backends decide how those bytes are packed
//! into their hardware buffer.

use super::{MAX_PIXEL_BYTES, Pixel};

/// Dotstar brightness byte: three marker bits plus full global brightness
const DOTSTAR_FULL_BRIGHTNESS: u8 = 0xFF;

/// Channel order and byte count of a LED family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorLayout {
    /// Green, red, blue (WS2812 and compatibles)
    Grb,
    /// Green, red, blue, white (SK6812 RGBW)
    Grbw,
    /// Brightness, blue, green, red (APA102 and other clocked strips)
    DotstarBgr,
}

/// Pixel bytes in transmission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireBytes {
    bytes: [u8; MAX_PIXEL_BYTES],
    len: usize,
}

impl WireBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl ColorLayout {
    /// Number of bytes one pixel takes on the wire
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Grb => 3,
            Self::Grbw | Self::DotstarBgr => 4,
        }
    }

    /// Whether the layout carries a dedicated white channel
    pub const fn has_white(self) -> bool {
        matches!(self, Self::Grbw)
    }

    /// Encode a pixel into transmission order
    pub const fn wire_bytes(self, pixel: Pixel) -> WireBytes {
        let bytes = match self {
            Self::Grb => [pixel.g, pixel.r, pixel.b, 0],
            Self::Grbw => [pixel.g, pixel.r, pixel.b, pixel.w],
            Self::DotstarBgr => [DOTSTAR_FULL_BRIGHTNESS, pixel.b, pixel.g, pixel.r],
        };
        WireBytes {
            bytes,
            len: self.bytes_per_pixel(),
        }
    }
}
