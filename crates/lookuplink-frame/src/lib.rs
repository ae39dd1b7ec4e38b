//! Command encoding and size-bounded response framing for lookup daemons.
//!
//! Requests are line-oriented commands with an optional length-prefixed body.
//! Every response is framed as:
//! - A 4-byte big-endian signed body length
//! - Exactly that many body bytes
//!
//! The declared length is checked against a caller-supplied ceiling before
//! any buffer is sized from it.

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;

pub use codec::{encode_response, DEFAULT_MAX_BODY_SIZE, MAGIC_V1, SIZE_PREFIX_LEN};
pub use command::{Command, WriteTo};
pub use error::{FrameError, Result};
pub use reader::read_response_bounded;
