mod layout;

pub use layout::{ColorLayout, WireBytes};
use smart_leds::RGB8;

pub type Rgb = RGB8;

/// Maximum number of channel bytes a single pixel occupies on the wire
pub const MAX_PIXEL_BYTES: usize = 4;

/// Color of one LED as it is handed to a transmit backend
///
/// The white channel is ignored by layouts without a white LED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Pixel {
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create an RGB pixel with the white channel off
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, w: 0 }
    }

    /// Create a pixel with an explicit white channel
    pub const fn with_white(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// Create a pixel with every channel set to the same level
    pub const fn gray(level: u8) -> Self {
        Self::with_white(level, level, level, level)
    }

    pub const fn rgb(self) -> Rgb {
        Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

impl From<Rgb> for Pixel {
    fn from(color: Rgb) -> Self {
        Self::new(color.r, color.g, color.b)
    }
}
