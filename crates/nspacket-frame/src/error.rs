/// Errors raised by frame sources, sinks and the stream codec.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A stream frame starts with a kind byte that is neither TEXT nor BINARY.
    #[error("invalid frame kind byte {0:#04x}")]
    InvalidFrameKind(u8),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The underlying transport failed.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No further frame will arrive, or the stream ended inside one.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
