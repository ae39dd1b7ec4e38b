//! Resilient client endpoint for lookup/discovery daemons.
//!
//! # Crate Structure
//!
//! - [`transport`]: Time-bounded TCP dial and per-call deadlines
//! - [`frame`]: Command encoding and size-bounded response framing
//! - [`peer`]: Lazily connecting, self-healing lookup peer

/// Re-export transport types.
pub mod transport {
    pub use lookuplink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use lookuplink_frame::*;
}

/// Re-export peer types.
pub mod peer {
    pub use lookuplink_peer::*;
}
