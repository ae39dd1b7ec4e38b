use lookuplink_frame::Command;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata this node advertises to a lookup daemon.
///
/// The peer stores it verbatim and never reads it; the announcement flow
/// owns its contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerInfo {
    pub tcp_port: u16,
    pub http_port: u16,
    pub version: String,
    pub broadcast_address: String,
}

impl PeerInfo {
    /// Create a metadata record.
    pub fn new(
        tcp_port: u16,
        http_port: u16,
        version: impl Into<String>,
        broadcast_address: impl Into<String>,
    ) -> Self {
        Self {
            tcp_port,
            http_port,
            version: version.into(),
            broadcast_address: broadcast_address.into(),
        }
    }

    /// Build an `IDENTIFY` command carrying this record as JSON.
    pub fn identify_command(&self) -> Result<Command> {
        let body = serde_json::to_vec(self)?;
        Ok(Command::identify(body))
    }
}
