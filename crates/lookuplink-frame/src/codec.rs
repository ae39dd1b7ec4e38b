use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Protocol preamble sent once on every fresh connection, before any command.
pub const MAGIC_V1: &[u8; 4] = b"  V1";

/// Response header: a single big-endian `i32` body length.
pub const SIZE_PREFIX_LEN: usize = 4;

/// Default response body ceiling: 1 MiB.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 1024 * 1024;

/// Encode a response body into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬─────────────────┐
/// │ Length (4B BE)   │ Body            │
/// │ signed i32       │ (Length bytes)  │
/// └──────────────────┴─────────────────┘
/// ```
///
/// Lookup daemons produce these frames; the encoder exists for in-process
/// servers and tests.
pub fn encode_response(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = i32::try_from(body.len()).map_err(|_| FrameError::BodyTooLarge {
        size: body.len() as i64,
        limit: i32::MAX as u64,
    })?;
    dst.reserve(SIZE_PREFIX_LEN + body.len());
    dst.put_i32(len);
    dst.put_slice(body);
    Ok(())
}
