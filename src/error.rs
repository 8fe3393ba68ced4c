use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while configuring or driving the LED outputs.
///
/// Protocol problems are never errors: the decoder reports them as
/// [`DecodeEvent`](crate::protocol::DecodeEvent)s and resynchronizes.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[display("{requested} LEDs requested, at most {max} supported")]
    TooManyLeds { requested: usize, max: usize },

    #[display("backend buffer holds {capacity} bytes, {required} required")]
    BufferTooSmall { required: usize, capacity: usize },

    #[display("all parallel lanes are in use")]
    NoFreeLane,

    #[display("lane handle refers to a released lane")]
    LaneReleased,

    #[display("lane handle is from generation {handle}, buffer is at {current}")]
    StaleLane { handle: u32, current: u32 },
}
