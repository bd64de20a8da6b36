//! Byte-source abstraction for RFID reader modules.
//!
//! The frame layer only ever asks for one byte, or up to `n` bytes, and expects
//! each request to be bounded by a timeout. This crate provides:
//! - [`ByteSource`], the trait the frame layer consumes
//! - [`ReadSource`], an adapter over any [`std::io::Read`]
//! - [`SerialPort`], a termios-configured serial device (Unix)
//!
//! This is the lowest layer of rdm6300. Everything else builds on top of
//! [`ByteSource`].

pub mod config;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod serial;

pub use config::{SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT, SUPPORTED_BAUD_RATES};
pub use error::{Result, TransportError};
pub use traits::{ByteSource, ReadSource};

#[cfg(unix)]
pub use serial::SerialPort;
