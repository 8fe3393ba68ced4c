//! Task bodies for the two execution contexts
//!
//! The firmware spawns one task per function. Reception only copies bytes
//! into the queue; processing owns the decoder and the LED output.

use embassy_futures::select::select;
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::Read;

use crate::calibration::WhiteExtraction;
use crate::output::TransmitBackend;
use crate::processor::FrameProcessor;
use crate::queue::{ByteConsumer, ByteProducer};

/// Bytes read from the host per call
pub const RECEIVE_CHUNK: usize = 64;

/// How often a deferred render is retried while no bytes arrive
pub const RENDER_RETRY_INTERVAL: Duration = Duration::from_micros(50);

/// Copy bytes from `reader` into the queue until the reader reports end of stream
///
/// Bytes that do not fit are dropped by the queue; reception never waits
/// for the processing task.
pub async fn reception_task<R: Read, const N: usize>(
    reader: &mut R,
    producer: &mut ByteProducer<'_, N>,
) -> Result<(), R::Error> {
    let mut chunk = [0u8; RECEIVE_CHUNK];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            #[cfg(feature = "defmt")]
            defmt::info!("[reception_task] end of stream");
            return Ok(());
        }
        producer.push_slice(&chunk[..read]);
    }
}

/// Drain the queue and drive the LEDs forever
pub async fn processing_task<B, W, const N: usize>(
    processor: &mut FrameProcessor<B, W>,
    consumer: &mut ByteConsumer<'_, N>,
) -> !
where
    B: TransmitBackend,
    W: WhiteExtraction,
{
    loop {
        let summary = processor.process(consumer, Instant::now());
        if let Some(_report) = summary.report {
            #[cfg(feature = "defmt")]
            defmt::info!("[processing_task] {}", _report);
        }

        if processor.has_pending_render() {
            select(consumer.wait(), Timer::after(RENDER_RETRY_INTERVAL)).await;
        } else {
            consumer.wait().await;
        }
    }
}
