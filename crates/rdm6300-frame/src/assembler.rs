use rdm6300_transport::ByteSource;
use tracing::{debug, trace};

use crate::codec::{RawFrame, FRAME_LEN, HEAD};
use crate::error::Result;

/// Most bytes one marker scan discards before handing control back.
///
/// About a quarter second of line time at 9600 baud.
pub const SCAN_LIMIT: usize = 256;

/// Outcome of one assembly attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembled {
    /// A full candidate frame, starting with the head marker.
    Frame(RawFrame),
    /// A read timed out, or [`SCAN_LIMIT`] bytes went by without a head
    /// marker, before a full frame arrived; any fragment was dropped.
    Timeout,
}

/// Cuts fixed-size candidate frames out of a byte stream.
///
/// Bytes are consumed one at a time until the head marker appears, then the
/// rest of the frame is read in one bounded request. A short read discards the
/// fragment and scanning starts over; nothing is ever pushed back. Frame
/// content is not inspected here.
pub struct FrameAssembler<S> {
    source: S,
    discarded: u64,
    resyncs: u64,
}

impl<S: ByteSource> FrameAssembler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            discarded: 0,
            resyncs: 0,
        }
    }

    /// Read the next candidate frame (blocking), riding out timeouts.
    ///
    /// Returns `Err(FrameError::EndOfStream)` when the source is exhausted.
    pub fn next_frame(&mut self) -> Result<RawFrame> {
        loop {
            if let Assembled::Frame(frame) = self.poll_frame()? {
                return Ok(frame);
            }
        }
    }

    /// Make one attempt at a frame, returning early on a timeout.
    pub fn poll_frame(&mut self) -> Result<Assembled> {
        if !self.scan_for_marker()? {
            return Ok(Assembled::Timeout);
        }
        Ok(match self.assemble()? {
            Some(frame) => Assembled::Frame(frame),
            None => Assembled::Timeout,
        })
    }

    /// Consume bytes until the head marker.
    ///
    /// Returns `false` if a read times out first, or after [`SCAN_LIMIT`]
    /// non-marker bytes, so a line that never goes quiet still yields.
    pub fn scan_for_marker(&mut self) -> Result<bool> {
        for _ in 0..SCAN_LIMIT {
            match self.source.read_one()? {
                None => return Ok(false),
                Some(HEAD) => return Ok(true),
                Some(byte) => {
                    trace!(byte, "discarding byte outside frame");
                    self.discarded += 1;
                }
            }
        }
        debug!(limit = SCAN_LIMIT, "no head marker within scan limit");
        Ok(false)
    }

    /// Read the remainder of a frame whose head marker was just consumed.
    ///
    /// Returns `None` after a short read; the fragment is dropped.
    pub fn assemble(&mut self) -> Result<Option<RawFrame>> {
        let rest = self.source.read_up_to(FRAME_LEN - 1)?;
        if rest.len() < FRAME_LEN - 1 {
            debug!(received = rest.len() + 1, "discarding partial frame");
            self.discarded += rest.len() as u64 + 1;
            self.resyncs += 1;
            return Ok(None);
        }

        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = HEAD;
        bytes[1..].copy_from_slice(&rest);
        Ok(Some(RawFrame::from_bytes(bytes)))
    }

    /// Bytes dropped while scanning or in partial frames.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded
    }

    /// Partial frames dropped so far.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the assembler and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S> std::fmt::Debug for FrameAssembler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameAssembler")
            .field("discarded", &self.discarded)
            .field("resyncs", &self.resyncs)
            .finish_non_exhaustive()
    }
}
