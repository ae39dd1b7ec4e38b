/// Errors that can occur while decoding a response frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared body length is negative.
    #[error("response body size ({0}) is negative")]
    NegativeSize(i32),

    /// The declared body length exceeds the configured ceiling.
    #[error("response body size ({size}) is greater than limit ({limit})")]
    BodyTooLarge { size: i64, limit: u64 },

    /// The stream ended before the declared bytes arrived.
    #[error("short read ({received} of {expected} bytes)")]
    ShortRead { expected: usize, received: usize },

    /// An I/O error occurred while reading the frame.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether the declared length itself was rejected.
    pub fn is_size_error(&self) -> bool {
        matches!(self, Self::NegativeSize(_) | Self::BodyTooLarge { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
