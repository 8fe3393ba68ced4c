//! Double-buffered transfer memory shared by all backends
//!
//! Pixels are written into the staging half at any time. A render copies
//! staging into the front half and hands the front half to the
//! [`Transmitter`]; the front half is left alone until the transfer
//! completes, so the hardware may read it in the background.

use embassy_time::Instant;

use super::completion::TransmitCompletion;
use super::guard::ResetGuard;
use super::RenderOutcome;
use crate::Transmitter;
use crate::error::{Error, Result};

pub(crate) struct TransferBuffer<'a, T: Transmitter, const BYTES: usize> {
    transmitter: T,
    completion: &'a TransmitCompletion,
    guard: ResetGuard,
    staging: [u8; BYTES],
    front: [u8; BYTES],
    len: usize,
}

impl<'a, T: Transmitter, const BYTES: usize> TransferBuffer<'a, T, BYTES> {
    pub(crate) const fn new(
        transmitter: T,
        completion: &'a TransmitCompletion,
        guard: ResetGuard,
    ) -> Self {
        Self {
            transmitter,
            completion,
            guard,
            staging: [0; BYTES],
            front: [0; BYTES],
            len: 0,
        }
    }

    /// Change the used length and clear the staging half
    pub(crate) fn resize(&mut self, len: usize) -> Result<()> {
        if len > BYTES {
            return Err(Error::BufferTooSmall {
                required: len,
                capacity: BYTES,
            });
        }
        self.len = len;
        self.staging.fill(0);
        Ok(())
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn staging(&self) -> &[u8] {
        &self.staging[..self.len]
    }

    pub(crate) fn staging_mut(&mut self) -> &mut [u8] {
        &mut self.staging[..self.len]
    }

    pub(crate) const fn completion(&self) -> &'a TransmitCompletion {
        self.completion
    }

    pub(crate) fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub(crate) fn transmitter_mut(&mut self) -> &mut T {
        &mut self.transmitter
    }

    pub(crate) fn is_ready(&self) -> bool {
        !self.completion.is_busy()
    }

    /// `None` while a transfer is in flight
    pub(crate) fn earliest_start(&self) -> Option<Instant> {
        if self.completion.is_busy() {
            return None;
        }
        Some(self.guard.ready_at(self.completion.last_completion()))
    }

    /// Start a transfer of the staging contents if the line allows it
    ///
    /// Staging keeps its contents, so pixels not rewritten before the next
    /// render are sent again unchanged.
    pub(crate) fn render(&mut self, now: Instant) -> RenderOutcome {
        let Some(ready_at) = self.earliest_start() else {
            return RenderOutcome::Busy;
        };
        if ready_at > now {
            return RenderOutcome::Settling { ready_at };
        }
        if !self.completion.begin() {
            return RenderOutcome::Busy;
        }

        let len = self.len;
        self.front[..len].copy_from_slice(&self.staging[..len]);
        self.transmitter.start(&self.front[..len]);
        RenderOutcome::Started
    }
}
