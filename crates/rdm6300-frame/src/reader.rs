use rdm6300_transport::ByteSource;
use tracing::debug;

use crate::assembler::FrameAssembler;
use crate::codec::{RawFrame, TagRecord};
use crate::error::{DecodeError, Result};

/// Where a [`TagReader`] is in its read cycle.
///
/// The cycle is `Scanning -> AssemblingFrame -> Decoding -> Reporting ->
/// Scanning`. A timeout or an exhausted scan stays in `Scanning`; a short read
/// while assembling goes straight back to `Scanning`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderState {
    /// Looking for the head marker.
    Scanning,
    /// Head marker seen, reading the rest of the frame.
    AssemblingFrame,
    /// A full candidate frame is waiting to be validated.
    Decoding(RawFrame),
    /// The decode outcome is waiting to be handed to the caller.
    Reporting(std::result::Result<TagRecord, DecodeError>),
}

/// What one call to [`TagReader::poll`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A frame decoded into a tag.
    Tag(TagRecord),
    /// A complete frame failed validation; reading continues.
    Rejected(DecodeError),
    /// A read timed out, or a scan hit its byte limit, with nothing to report.
    Idle,
}

/// Reads tags from a byte source, one explicit state transition at a time.
///
/// Owns the source for as long as the reader lives.
pub struct TagReader<S> {
    assembler: FrameAssembler<S>,
    state: ReaderState,
}

impl<S: ByteSource> TagReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            assembler: FrameAssembler::new(source),
            state: ReaderState::Scanning,
        }
    }

    /// Run the cycle until it reports something.
    ///
    /// Decode failures come back as [`ReadEvent::Rejected`]; only the byte
    /// source can make this return `Err`, after which the reader is back in
    /// [`ReaderState::Scanning`].
    pub fn poll(&mut self) -> Result<ReadEvent> {
        loop {
            if let Some(event) = self.step()? {
                return Ok(event);
            }
        }
    }

    /// Perform a single state transition.
    pub fn step(&mut self) -> Result<Option<ReadEvent>> {
        let (next, event) = match std::mem::replace(&mut self.state, ReaderState::Scanning) {
            ReaderState::Scanning => {
                if self.assembler.scan_for_marker()? {
                    (ReaderState::AssemblingFrame, None)
                } else {
                    (ReaderState::Scanning, Some(ReadEvent::Idle))
                }
            }
            ReaderState::AssemblingFrame => match self.assembler.assemble()? {
                Some(frame) => (ReaderState::Decoding(frame), None),
                None => (ReaderState::Scanning, Some(ReadEvent::Idle)),
            },
            ReaderState::Decoding(frame) => (ReaderState::Reporting(frame.decode()), None),
            ReaderState::Reporting(Ok(tag)) => {
                debug!(raw_tag = tag.raw_tag(), version = tag.protocol_version(), "decoded tag");
                (ReaderState::Scanning, Some(ReadEvent::Tag(tag)))
            }
            ReaderState::Reporting(Err(err)) => {
                debug!(%err, class = ?err.class(), "rejected frame");
                (ReaderState::Scanning, Some(ReadEvent::Rejected(err)))
            }
        };
        self.state = next;
        Ok(event)
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn assembler(&self) -> &FrameAssembler<S> {
        &self.assembler
    }

    /// Consume the reader and return the byte source.
    pub fn into_inner(self) -> S {
        self.assembler.into_inner()
    }
}

impl<S> std::fmt::Debug for TagReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagReader")
            .field("assembler", &self.assembler)
            .field("state", &self.state)
            .finish()
    }
}
