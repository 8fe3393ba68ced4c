use embassy_time::Duration;

use crate::color::ColorLayout;

/// How many data lines one transfer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lanes {
    /// One data line per transfer
    Single,
    /// Up to eight data lines bit-interleaved into one transfer
    Parallel,
}

/// Supported LED chip families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedFamily {
    /// WS2812B, WS2813 and other GRB one-wire chips
    Ws2812,
    /// SK6812 RGBW one-wire chips
    Sk6812,
    /// APA102, HD107, SK9822 clocked two-wire chips
    Apa102,
}

impl LedFamily {
    pub const fn layout(self) -> ColorLayout {
        match self {
            Self::Ws2812 => ColorLayout::Grb,
            Self::Sk6812 => ColorLayout::Grbw,
            Self::Apa102 => ColorLayout::DotstarBgr,
        }
    }

    /// Idle time the chips need before they latch a new frame
    ///
    /// Parallel output uses shorter values because the interleaved
    /// transfer itself is longer per LED.
    pub const fn reset_time(self, lanes: Lanes) -> Duration {
        let micros = match (self, lanes) {
            (Self::Ws2812, Lanes::Single) => 650,
            (Self::Ws2812, Lanes::Parallel) => 300,
            (Self::Sk6812, Lanes::Single) => 450,
            (Self::Sk6812, Lanes::Parallel) => 80,
            (Self::Apa102, _) => 100,
        };
        Duration::from_micros(micros)
    }

    /// Whether the chips need a separate clock line
    pub const fn is_clocked(self) -> bool {
        matches!(self, Self::Apa102)
    }
}
