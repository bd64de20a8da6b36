//! Read and validate tag IDs from RDM6300 RFID reader modules.
//!
//! # Crate Structure
//!
//! - [`transport`] - Byte-source abstraction and serial port
//! - [`frame`] - Frame synchronization, decoding and the read loop state machine
//!
//! ```no_run
//! # #[cfg(unix)]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rdm6300::frame::{ReadEvent, TagReader};
//! use rdm6300::transport::{SerialConfig, SerialPort};
//!
//! let port = SerialPort::open(&SerialConfig::new("/dev/ttyUSB0"))?;
//! let mut reader = TagReader::new(port);
//! loop {
//!     match reader.poll()? {
//!         ReadEvent::Tag(tag) => println!("{tag}"),
//!         ReadEvent::Rejected(err) => println!("{err}"),
//!         ReadEvent::Idle => {}
//!     }
//! }
//! # }
//! # #[cfg(not(unix))]
//! # fn main() {}
//! ```

/// Re-export transport types.
pub mod transport {
    pub use rdm6300_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rdm6300_frame::*;
}
