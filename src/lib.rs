#![no_std]

pub mod calibration;
pub mod color;
pub mod error;
pub mod output;
pub mod processor;
pub mod protocol;
pub mod queue;
pub mod stats;
pub mod task;

pub use calibration::{ExtractWhite, RgbOnly, WhiteExtraction};
pub use color::{ColorLayout, Pixel, Rgb};
pub use error::{Error, Result};
pub use output::{
    BusSlot, DotstarBus, LaneBus, LaneMux, LedFamily, LedOutput, NeopixelBus, OutputConfig,
    RenderOutcome, SegmentSplit, TransmitBackend, TransmitCompletion,
};
pub use processor::{FrameProcessor, ProcessSummary};
pub use protocol::{DecodeEvent, FrameDecoder, PixelSink, ProtocolState};
pub use queue::{ByteConsumer, ByteProducer, FRAME_QUEUE_SIZE, FrameQueue};
pub use stats::{LinkHealth, LinkReport, Statistics};
pub use embassy_time::{Duration, Instant};

/// Abstract transfer hardware
///
/// Implement this trait to support different hardware platforms.
/// A backend calls `start` with its front buffer; the hardware shifts the
/// bytes out in the background and reports the end of the transfer through
/// [`TransmitCompletion::complete`].
pub trait Transmitter {
    /// Begin shifting `frame` out to the LEDs
    fn start(&mut self, frame: &[u8]);
}
