//! Processing side of the bridge
//!
//! Drains the byte queue through the decoder into the LED output and keeps
//! the statistics window rolling.

use embassy_time::Instant;

use crate::calibration::{RgbOnly, WhiteExtraction};
use crate::output::{LedOutput, RenderOutcome, TransmitBackend};
use crate::protocol::{DecodeEvent, FrameDecoder};
use crate::queue::ByteConsumer;
use crate::stats::{LinkReport, Statistics};

/// What one processing pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProcessSummary {
    /// Bytes taken from the queue
    pub bytes: usize,
    /// Frames that completed
    pub frames: u32,
    /// Outcome of the last render attempt, retried or requested
    pub render: RenderOutcome,
    /// Statistics window closed during this pass
    pub report: Option<LinkReport>,
}

/// Decoder, output and statistics owned by the processing task
pub struct FrameProcessor<B: TransmitBackend, W: WhiteExtraction = RgbOnly> {
    decoder: FrameDecoder<W>,
    output: LedOutput<B>,
    stats: Statistics,
}

impl<B: TransmitBackend> FrameProcessor<B, RgbOnly> {
    pub const fn new(output: LedOutput<B>, now: Instant) -> Self {
        Self::with_decoder(FrameDecoder::new(), output, now)
    }
}

impl<B: TransmitBackend, W: WhiteExtraction> FrameProcessor<B, W> {
    pub const fn with_decoder(decoder: FrameDecoder<W>, output: LedOutput<B>, now: Instant) -> Self {
        Self {
            decoder,
            output,
            stats: Statistics::new(now),
        }
    }

    /// Run one pass over everything currently queued
    ///
    /// A render deferred by an earlier pass is retried before new bytes are
    /// decoded, so a frame waiting for the reset time is shown as soon as
    /// the line allows even when no more data arrives.
    pub fn process<const N: usize>(
        &mut self,
        consumer: &mut ByteConsumer<'_, N>,
        now: Instant,
    ) -> ProcessSummary {
        let mut report = self.stats.update(now, !consumer.is_empty());

        let mut render = self.output.render_pending(now);
        if render == RenderOutcome::Started {
            self.stats.increase_show();
        }

        let mut bytes = 0;
        let mut frames = 0;
        while let Some(byte) = consumer.pop() {
            bytes += 1;
            if let DecodeEvent::FrameComplete {
                render: outcome,
                report: closed,
            } = self.process_byte(byte, now)
            {
                frames += 1;
                render = outcome;
                report = closed.or(report);
            }
        }

        ProcessSummary {
            bytes,
            frames,
            render,
            report,
        }
    }

    /// Feed a single byte through the decoder
    pub fn process_byte(&mut self, byte: u8, now: Instant) -> DecodeEvent {
        let event = self
            .decoder
            .feed(byte, &mut self.output, &mut self.stats, now);

        if let DecodeEvent::Oversized { led_count: _led_count } = event {
            #[cfg(feature = "defmt")]
            defmt::debug!("[FrameProcessor] dropped frame of {=usize} LEDs", _led_count);
        }
        event
    }

    /// Whether a frame is waiting for the line
    pub const fn has_pending_render(&self) -> bool {
        self.output.has_pending_render()
    }

    pub const fn decoder(&self) -> &FrameDecoder<W> {
        &self.decoder
    }

    pub const fn output(&self) -> &LedOutput<B> {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut LedOutput<B> {
        &mut self.output
    }

    pub const fn stats(&self) -> &Statistics {
        &self.stats
    }
}
