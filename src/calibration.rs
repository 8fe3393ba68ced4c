//! RGB to RGBW expansion
//!
//! The host always sends three channels. Strips with a dedicated white
//! LED get the white share extracted before the pixel is committed.
//! Full calibration tables live outside this crate; anything that
//! implements [`WhiteExtraction`] can be plugged into the decoder.

use crate::color::{Pixel, Rgb};

/// Converts a received RGB triplet into the pixel that is stored
pub trait WhiteExtraction {
    fn expand(&self, color: Rgb) -> Pixel;
}

/// Pass-through for strips without a white channel
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbOnly;

impl WhiteExtraction for RgbOnly {
    fn expand(&self, color: Rgb) -> Pixel {
        Pixel::from(color)
    }
}

/// Moves the common part of the three channels to the white LED
///
/// The white LED output is scaled by `white_scale` (0-255 = 0%-100%),
/// which compensates for a white LED that is brighter than the mixed RGB.
#[derive(Debug, Clone, Copy)]
pub struct ExtractWhite {
    white_scale: u8,
}

impl ExtractWhite {
    pub const fn new(white_scale: u8) -> Self {
        Self { white_scale }
    }
}

impl Default for ExtractWhite {
    fn default() -> Self {
        Self::new(u8::MAX)
    }
}

impl WhiteExtraction for ExtractWhite {
    fn expand(&self, color: Rgb) -> Pixel {
        let white = color.r.min(color.g).min(color.b);
        Pixel::with_white(
            color.r - white,
            color.g - white,
            color.b - white,
            scale8(white, self.white_scale),
        )
    }
}

/// Scale `value` by `scale / 256`, keeping 255 * 255 at 255
#[inline]
#[allow(clippy::cast_lossless)]
const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}
