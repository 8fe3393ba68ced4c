//! Frame checksums
//!
//! The header check byte protects the length field and is verified before the
//! length is trusted. The payload checksum is accumulated per channel byte and
//! only kept for diagnostics.

/// Constant folded into the header check byte
pub const HEADER_CRC_SEED: u8 = 0x55;

/// Fletcher sums are taken modulo 255
const FLETCHER_MODULUS: u16 = 255;

/// The extended sum never equals `'A'`, so it cannot be mistaken for magic
const EXT_FORBIDDEN: u8 = b'A';
const EXT_REPLACEMENT: u8 = 0xAA;

/// Check byte over the big-endian length field
pub const fn header_crc(count_hi: u8, count_lo: u8) -> u8 {
    count_hi ^ count_lo ^ HEADER_CRC_SEED
}

/// Snapshot of the payload checksum after the last byte of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PayloadChecksum {
    pub fletcher1: u8,
    pub fletcher2: u8,
    pub fletcher_ext: u8,
}

/// Running Fletcher-16 over the pixel payload plus a position-mixed sum
#[derive(Debug, Clone, Copy, Default)]
pub struct Fletcher {
    sum1: u16,
    sum2: u16,
    ext: u16,
    position: u16,
}

impl Fletcher {
    pub const fn new() -> Self {
        Self {
            sum1: 0,
            sum2: 0,
            ext: 0,
            position: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fold one payload byte into the sums
    #[allow(clippy::cast_possible_truncation)]
    pub fn add(&mut self, byte: u8) {
        let value = u16::from(byte);
        self.sum1 = (self.sum1 + value) % FLETCHER_MODULUS;
        self.sum2 = (self.sum2 + self.sum1) % FLETCHER_MODULUS;
        let mixed = u32::from(self.ext) + u32::from(value ^ self.position);
        self.ext = (mixed % u32::from(FLETCHER_MODULUS)) as u16;
        self.position = self.position.wrapping_add(1);
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn finish(&self) -> PayloadChecksum {
        // every sum is below 255 after the modulo
        let ext = self.ext as u8;
        PayloadChecksum {
            fletcher1: self.sum1 as u8,
            fletcher2: self.sum2 as u8,
            fletcher_ext: if ext == EXT_FORBIDDEN {
                EXT_REPLACEMENT
            } else {
                ext
            },
        }
    }
}
