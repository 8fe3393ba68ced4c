//! Cross-task byte queue
//!
//! A single-producer/single-consumer ring built on `heapless::spsc`. Each
//! cursor has exactly one writer, so no lock is taken on the byte path.
//! A [`Signal`] wakes the consumer when bytes arrive.
//!
//! When the ring is full the newest byte is dropped and counted. The
//! producer never blocks and never overwrites unread bytes, so a stalled
//! consumer costs at most the frame that was being received; the decoder
//! resynchronizes on the next magic.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::spsc::{Consumer, Producer, Queue};
use portable_atomic::{AtomicU32, Ordering};

use crate::protocol::{MAX_LED_COUNT, frame_len};

/// Trailing checksum bytes a host may append after the payload
pub const MAX_TRAILER_LEN: usize = 3;

/// Ring size that holds one maximum frame plus trailer
///
/// One slot of a `heapless::spsc::Queue` always stays free.
pub const FRAME_QUEUE_SIZE: usize = frame_len(MAX_LED_COUNT) + MAX_TRAILER_LEN + 1;

/// Error returned when a byte does not fit into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Overrun(pub u8);

/// Byte ring shared by the reception and processing tasks
///
/// Owned by whoever sets up the tasks; [`FrameQueue::split`] hands out
/// the two ends.
pub struct FrameQueue<const N: usize = FRAME_QUEUE_SIZE> {
    queue: Queue<u8, N>,
    data_ready: Signal<CriticalSectionRawMutex, ()>,
    overruns: AtomicU32,
}

impl<const N: usize> FrameQueue<N> {
    /// Create a new empty queue.
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
            data_ready: Signal::new(),
            overruns: AtomicU32::new(0),
        }
    }

    /// Number of bytes the queue holds when full
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Split into the reception end and the processing end
    pub fn split(&mut self) -> (ByteProducer<'_, N>, ByteConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (
            ByteProducer {
                inner: producer,
                data_ready: &self.data_ready,
                overruns: &self.overruns,
            },
            ByteConsumer {
                inner: consumer,
                data_ready: &self.data_ready,
                overruns: &self.overruns,
            },
        )
    }
}

impl<const N: usize> Default for FrameQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writing end, used only by the reception path
pub struct ByteProducer<'a, const N: usize> {
    inner: Producer<'a, u8, N>,
    data_ready: &'a Signal<CriticalSectionRawMutex, ()>,
    overruns: &'a AtomicU32,
}

impl<const N: usize> ByteProducer<'_, N> {
    /// Append one byte and wake the consumer
    ///
    /// Returns `Err(Overrun(byte))` if the queue is full; the byte is dropped.
    pub fn push(&mut self, byte: u8) -> Result<(), Overrun> {
        match self.inner.enqueue(byte) {
            Ok(()) => {
                self.data_ready.signal(());
                Ok(())
            }
            Err(byte) => {
                self.overruns.fetch_add(1, Ordering::Relaxed);
                Err(Overrun(byte))
            }
        }
    }

    /// Append as many bytes as fit, returns how many were accepted
    ///
    /// Bytes that do not fit are dropped and counted as overruns.
    pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.inner.enqueue(byte).is_err() {
                break;
            }
            accepted += 1;
        }

        let dropped = bytes.len() - accepted;
        if dropped > 0 {
            let dropped = u32::try_from(dropped).unwrap_or(u32::MAX);
            self.overruns.fetch_add(dropped, Ordering::Relaxed);

            #[cfg(feature = "defmt")]
            defmt::warn!("[FrameQueue] overrun, dropped {=u32} bytes", dropped);
        }
        if accepted > 0 {
            self.data_ready.signal(());
        }
        accepted
    }

    /// Bytes that can still be pushed without an overrun
    pub fn free(&self) -> usize {
        self.inner.capacity() - self.inner.len()
    }
}

/// Reading end, used only by the processing task
pub struct ByteConsumer<'a, const N: usize> {
    inner: Consumer<'a, u8, N>,
    data_ready: &'a Signal<CriticalSectionRawMutex, ()>,
    overruns: &'a AtomicU32,
}

impl<const N: usize> ByteConsumer<'_, N> {
    /// Take the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.inner.dequeue()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.inner.ready()
    }

    /// Bytes dropped because the queue was full
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Wait until at least one byte is available
    pub async fn wait(&mut self) {
        while self.is_empty() {
            self.data_ready.wait().await;
        }
    }
}
