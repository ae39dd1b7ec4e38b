//! Lazily connecting, self-healing lookup daemon peer.
//!
//! This is the "just works" layer. A [`LookupPeer`] connects on first use,
//! sends the protocol preamble, notifies a [`ReconnectHandler`] on every
//! fresh connection, and drops back to disconnected on any failure so the
//! next [`LookupPeer::command`] starts clean.

pub mod error;
pub mod handler;
pub mod info;
pub mod peer;

pub use error::{PeerError, Result};
pub use handler::ReconnectHandler;
pub use info::PeerInfo;
pub use peer::{LookupPeer, PeerConfig, PeerState};
