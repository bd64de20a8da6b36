use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, trace};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::traits::ByteSource;

/// A serial device in raw 8N1 mode with bounded reads.
///
/// Reads wait on `poll(2)` for at most the configured timeout; an expired wait
/// is a timeout, never end of stream. A descriptor that polls readable but
/// yields zero bytes has been hung up (USB adapter unplugged, pty master
/// closed) and is reported as [`TransportError::Closed`], as are `EIO`,
/// `ENXIO` and `ENODEV`.
pub struct SerialPort {
    file: File,
    path: PathBuf,
    timeout: Duration,
}

impl SerialPort {
    /// Open and configure the device described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        config.validate()?;
        let path = config.device_path.clone();

        // O_NONBLOCK keeps open(2) from waiting on carrier detect before
        // CLOCAL is set; it is cleared again once the line is configured.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        configure_line(&file, config)
            .and_then(|()| set_blocking(&file))
            .map_err(|source| TransportError::Configure {
                path: path.clone(),
                source,
            })?;

        info!(
            ?path,
            baud_rate = config.baud_rate,
            timeout_ms = config.timeout.as_millis() as u64,
            "opened serial device"
        );

        Ok(Self {
            file,
            path,
            timeout: config.timeout,
        })
    }

    /// The device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The per-request read timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "serial"
    }

    /// Wait up to `wait` for input, then issue one `read(2)`.
    ///
    /// `Ok(0)` means the wait expired with no data.
    fn read_raw(&mut self, buf: &mut [u8], wait: Duration) -> Result<usize> {
        if !wait_readable(&self.file, wait)? {
            return Ok(0);
        }
        loop {
            match self.file.read(buf) {
                Ok(0) => {
                    debug!(path = ?self.path, "serial device hung up");
                    return Err(TransportError::Closed);
                }
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) if is_hangup(&err) => {
                    debug!(path = ?self.path, %err, "serial device went away");
                    return Err(TransportError::Closed);
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl ByteSource for SerialPort {
    fn read_one(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read_raw(&mut byte, self.timeout)? {
            0 => Ok(None),
            _ => {
                trace!(byte = byte[0], "read byte");
                Ok(Some(byte[0]))
            }
        }
    }

    fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        let deadline = Instant::now() + self.timeout;
        let mut buf = BytesMut::zeroed(n);
        let mut filled = 0;
        while filled < n {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.read_raw(&mut buf[filled..], remaining)? {
                0 => break,
                read => filled += read,
            }
        }
        buf.truncate(filled);
        Ok(buf.freeze())
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn is_hangup(err: &std::io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EIO) | Some(libc::ENXIO) | Some(libc::ENODEV)
    )
}

/// Block until `file` is readable or `wait` expires. Hang-ups count as
/// readable so the following `read` can observe them.
fn wait_readable(file: &File, wait: Duration) -> Result<bool> {
    let timeout_ms = wait
        .as_micros()
        .div_ceil(1000)
        .min(libc::c_int::MAX as u128) as libc::c_int;
    let mut fds = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        // SAFETY: `fds` is a single valid pollfd for an open descriptor.
        let rc = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(TransportError::Io(err));
        }
        if fds.revents & libc::POLLNVAL != 0 {
            return Err(TransportError::Closed);
        }
        return Ok(rc > 0);
    }
}

fn speed_for(baud_rate: u32) -> std::io::Result<libc::speed_t> {
    let speed = match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        other => {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("unsupported baud rate {other}"),
            ))
        }
    };
    Ok(speed)
}

fn configure_line(file: &File, config: &SerialConfig) -> std::io::Result<()> {
    let fd = file.as_raw_fd();
    let speed = speed_for(config.baud_rate)?;

    // SAFETY: `termios` is a plain C struct for which all-zero is a valid bit
    // pattern; it is fully overwritten by `tcgetattr` below.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open descriptor owned by `file`, `tio` is a valid
    // writable termios struct.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `tio` was initialized by `tcgetattr`.
    unsafe { libc::cfmakeraw(&mut tio) };

    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    tio.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    tio.c_cflag |= libc::CS8;
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        tio.c_cflag &= !libc::CRTSCTS;
    }
    // Reads return whatever is buffered; waiting is done with poll(2).
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = 0;

    // SAFETY: `tio` is a valid termios struct and `speed` a valid speed constant.
    let rc = unsafe {
        libc::cfsetispeed(&mut tio, speed) | libc::cfsetospeed(&mut tio, speed)
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `fd` is open and `tio` is fully initialized.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // Drop whatever the module sent before we were listening.
    // SAFETY: `fd` is an open terminal descriptor.
    if unsafe { libc::tcflush(fd, libc::TCIFLUSH) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    debug!(fd, baud_rate = config.baud_rate, "applied raw 8N1 line settings");
    Ok(())
}

/// Clear `O_NONBLOCK` left over from opening the device.
fn set_blocking(file: &File) -> std::io::Result<()> {
    let fd = file.as_raw_fd();
    // SAFETY: `fd` is an open descriptor owned by `file`.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: as above; only the file status flags are changed.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}
