use std::io::{ErrorKind, Read};

use bytes::Bytes;
use tracing::debug;

use crate::codec::SIZE_PREFIX_LEN;
use crate::error::{FrameError, Result};

/// Read exactly one length-prefixed response from `reader` (blocking).
///
/// The declared length is rejected if it is negative or exceeds `limit`; in
/// that case the body is left unread and the stream is no longer aligned on a
/// frame boundary, so the caller must discard the connection.
pub fn read_response_bounded<R: Read + ?Sized>(reader: &mut R, limit: u64) -> Result<Bytes> {
    let mut prefix = [0u8; SIZE_PREFIX_LEN];
    read_full(reader, &mut prefix)?;
    let size = i32::from_be_bytes(prefix);

    if size < 0 {
        debug!(size, "rejecting negative response size");
        return Err(FrameError::NegativeSize(size));
    }
    if size as u64 > limit {
        debug!(size, limit, "rejecting oversized response");
        return Err(FrameError::BodyTooLarge {
            size: i64::from(size),
            limit,
        });
    }

    let mut body = vec![0u8; size as usize];
    read_full(reader, &mut body)?;
    Ok(Bytes::from(body))
}

fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(FrameError::ShortRead {
                    expected: buf.len(),
                    received: filled,
                })
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}
