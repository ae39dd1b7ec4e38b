/// Errors that can occur in peer operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Dialing or releasing the connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] lookuplink_transport::TransportError),

    /// The response frame could not be read.
    #[error("read failed: {0}")]
    Frame(#[from] lookuplink_frame::FrameError),

    /// The preamble or command could not be written.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    /// `connect` was called while the peer is already connected.
    #[error("already connected to {0}")]
    AlreadyConnected(String),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PeerError>;
