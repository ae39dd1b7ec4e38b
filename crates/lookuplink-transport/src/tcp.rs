use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::TimedStream;

/// Default dial and per-call I/O timeout for lookup daemon connections.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Dial `addr` (`host:port`) with a bounded connect timeout.
///
/// Every resolved address is tried in order; the last connect error is
/// returned if none succeeds. The returned stream applies `timeout` to each
/// subsequent read and write.
pub fn dial(addr: &str, timeout: Duration) -> Result<TimedStream> {
    let candidates = addr
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: addr.to_string(),
            source,
        })?;

    let mut last_err = None;
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                debug!(%addr, peer = %candidate, "dialed lookup peer");
                return Ok(TimedStream::new(stream, timeout));
            }
            Err(err) => {
                debug!(%addr, peer = %candidate, error = %err, "dial attempt failed");
                last_err = Some(err);
            }
        }
    }

    match last_err {
        Some(source) => Err(TransportError::Connect {
            addr: addr.to_string(),
            source,
        }),
        None => Err(TransportError::NoAddress {
            addr: addr.to_string(),
        }),
    }
}
