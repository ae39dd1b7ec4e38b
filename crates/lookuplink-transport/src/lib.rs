//! Time-bounded TCP transport for lookup daemon clients.
//!
//! This is the lowest layer of lookuplink. It dials a lookup daemon with a
//! fixed connect timeout and hands back a [`TimedStream`], which re-arms its
//! deadline before every read and write.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::TimedStream;
pub use tcp::{dial, LOOKUP_TIMEOUT};
