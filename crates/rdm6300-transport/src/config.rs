use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TransportError};

/// The RDM6300 module transmits at 9600 baud, 8N1.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default bound on a single read request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Baud rates accepted by [`SerialConfig::validate`].
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400,
];

/// Line settings for a serial byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Path of the serial device, e.g. `/dev/ttyUSB0`.
    pub device_path: PathBuf,
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Upper bound on each read request.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Config for `device_path` with the module's default line settings.
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
            ..Self::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject settings the serial driver cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(TransportError::UnsupportedBaudRate(self.baud_rate));
        }
        if self.timeout.is_zero() {
            return Err(TransportError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
