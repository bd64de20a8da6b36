use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{Result, TransportError};

/// A blocking byte stream whose reads are bounded by a timeout.
///
/// Implementations decide how long a single request may block. A timeout is
/// not an error: it is reported as `Ok(None)` from [`read_one`] or as a short
/// buffer from [`read_up_to`]. Permanent end of stream is
/// [`TransportError::Closed`].
///
/// [`read_one`]: ByteSource::read_one
/// [`read_up_to`]: ByteSource::read_up_to
pub trait ByteSource {
    /// Read a single byte. `Ok(None)` means the read timed out.
    fn read_one(&mut self) -> Result<Option<u8>>;

    /// Read up to `n` bytes.
    ///
    /// Returns fewer than `n` bytes (possibly none) when the timeout elapses or
    /// the stream ends part-way. End of stream is reported by the next call.
    fn read_up_to(&mut self, n: usize) -> Result<Bytes>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_one(&mut self) -> Result<Option<u8>> {
        (**self).read_one()
    }

    fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        (**self).read_up_to(n)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_one(&mut self) -> Result<Option<u8>> {
        (**self).read_one()
    }

    fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        (**self).read_up_to(n)
    }
}

/// Adapts any [`Read`] into a [`ByteSource`].
///
/// `Ok(0)` from the reader is end of stream. `TimedOut` and `WouldBlock` are
/// timeouts (sockets with `set_read_timeout`), `Interrupted` is retried.
pub struct ReadSource<R> {
    inner: R,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the adapter and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn read_one(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(_) => {
                    trace!(byte = byte[0], "read byte");
                    return Ok(Some(byte[0]));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(None),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn read_up_to(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(n);
        let mut filled = 0;
        while filled < n {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => break,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        buf.truncate(filled);
        Ok(buf.freeze())
    }
}

impl<R> std::fmt::Debug for ReadSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSource").finish_non_exhaustive()
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
