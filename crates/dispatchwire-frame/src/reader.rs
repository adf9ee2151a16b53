use std::io::{ErrorKind, Read};

use bytes::Bytes;
use dispatchwire_transport::DispatcherStream;

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::writer::transport_to_frame_error;

/// Reads acknowledgement buffers from any `Read` stream.
///
/// Unlike a stream decoder this never waits for a complete frame: the
/// dispatcher answers each command with one burst, and whatever arrives in
/// a single bounded read is the acknowledgement. Partial or glued frames are
/// sorted out later by [`crate::parse_buffer`].
pub struct AckReader<T> {
    inner: T,
    config: FrameConfig,
    buf: Vec<u8>,
}

impl<T: Read> AckReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            buf: Vec::new(),
        }
    }

    /// Perform exactly one read of at most `max_ack_size` bytes (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` on EOF. A read timeout
    /// surfaces as `FrameError::Io` with kind `WouldBlock` or `TimedOut`.
    ///
    /// The scratch buffer is reused between calls; the returned `Bytes` owns
    /// only the bytes that arrived.
    pub fn read_ack(&mut self) -> Result<Bytes> {
        self.buf.resize(self.config.max_ack_size.max(1), 0);
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => return Ok(Bytes::copy_from_slice(&self.buf[..n])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl AckReader<DispatcherStream> {
    /// Create a reader for a dispatcher stream and apply the read timeout
    /// from config.
    pub fn with_config_stream(inner: DispatcherStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
