use rdm6300_transport::TransportError;

use crate::codec::Field;

/// Why a candidate frame was rejected.
///
/// Every variant is recoverable: the frame is dropped and scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer is not exactly one frame long.
    #[error("invalid message length {actual} (expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    /// The head or tail byte is not the frame marker.
    #[error("invalid message head or tail: got head={head:#04x}, tail={tail:#04x}, expected 0x02 & 0x03")]
    InvalidMarker { head: u8, tail: u8 },

    /// A field that must be ASCII hex contains something else.
    #[error("invalid hex in {field} field: {value:?}")]
    InvalidHex { field: Field, value: String },

    /// The XOR of the version and tag pairs disagrees with the transmitted checksum.
    #[error("checksum mismatch: computed {computed:#04x}, expected {expected:#04x}")]
    ChecksumMismatch { computed: u8, expected: u8 },
}

/// Coarse grouping of [`DecodeError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Length or marker problems: the frame boundary is wrong.
    Structural,
    /// A field is not valid hex.
    Parse,
    /// The payload was corrupted in transit.
    Checksum,
}

impl DecodeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DecodeError::InvalidLength { .. } | DecodeError::InvalidMarker { .. } => {
                ErrorClass::Structural
            }
            DecodeError::InvalidHex { .. } => ErrorClass::Parse,
            DecodeError::ChecksumMismatch { .. } => ErrorClass::Checksum,
        }
    }
}

/// Errors that end a read loop.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source will not produce any more data.
    #[error("end of stream")]
    EndOfStream,

    /// The byte source failed.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for FrameError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => FrameError::EndOfStream,
            other => FrameError::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
