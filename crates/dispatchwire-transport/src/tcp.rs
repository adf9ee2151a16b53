use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::DispatcherStream;

/// Default connect timeout, kept below one second so a missing dispatcher
/// fails fast.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Connect to a dispatcher using [`DEFAULT_CONNECT_TIMEOUT`].
pub fn connect(addr: &str) -> Result<DispatcherStream> {
    connect_timeout(addr, DEFAULT_CONNECT_TIMEOUT)
}

/// Connect to a dispatcher, trying every resolved address in turn.
///
/// Each attempt is bounded by `timeout`. The error of the last attempt is
/// returned when none of them succeeds.
pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<DispatcherStream> {
    let candidates: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: addr.to_string(),
            source,
        })?
        .collect();

    if candidates.is_empty() {
        return Err(TransportError::Resolve {
            addr: addr.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "address resolved to no socket addresses",
            ),
        });
    }

    let mut last_err = None;
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                debug!(%candidate, "connected to dispatcher");
                return Ok(DispatcherStream::from_tcp(stream));
            }
            Err(err) => {
                debug!(%candidate, error = %err, "dispatcher connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        addr: addr.to_string(),
        source: last_err.unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::NotConnected)),
    })
}
