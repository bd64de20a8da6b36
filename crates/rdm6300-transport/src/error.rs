use std::path::PathBuf;

/// Errors that can occur while reading from a byte source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to apply line settings to the device.
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested baud rate has no termios speed constant.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),

    /// A zero read timeout would turn every read into a busy poll.
    #[error("read timeout must be non-zero")]
    InvalidTimeout,

    /// An I/O error occurred on the source.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source reached permanent end of stream (device unplugged, pipe closed).
    #[error("byte source closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
