//! Frame synchronization and decoding for RDM6300 reader output.
//!
//! The module emits one fixed 14-byte frame per tag read:
//! - a `0x02` head marker
//! - 2 ASCII hex digits of version, 8 of tag ID, 2 of checksum
//! - a `0x03` tail marker
//!
//! [`FrameAssembler`] finds frames in the byte stream, [`decode_frame`]
//! validates them, and [`TagReader`] drives both as an explicit state machine.

pub mod assembler;
pub mod codec;
pub mod error;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_support;

pub use assembler::{Assembled, FrameAssembler, SCAN_LIMIT};
pub use codec::{
    checksum, decode_frame, encode_frame, Field, RawFrame, TagRecord, FRAME_LEN, HEAD, TAIL,
};
pub use error::{DecodeError, ErrorClass, FrameError, Result};
pub use reader::{ReadEvent, ReaderState, TagReader};
