use nspacket_frame::{FrameError, FrameKind};

/// Errors that can occur while encoding or decoding a packet.
///
/// Every error is local to the packet being processed.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The leading type digit is not `0`..`6`.
    #[error("invalid packet type byte {0:#04x}")]
    InvalidPacketType(u8),

    /// A header field was present but could not be read.
    #[error("malformed header at byte {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: String },

    /// The payload array could not be scanned.
    #[error("malformed payload at byte {offset}: {reason}")]
    MalformedPayload { offset: usize, reason: String },

    /// Announced count, placeholders and delivered chunks do not all agree.
    #[error("binary attachments not found (expected {expected}, received {received})")]
    MissingAttachments { expected: u64, received: u64 },

    /// A placeholder refers to a chunk that was never delivered.
    #[error("missing binary attachment {index} ({available} available)")]
    AttachmentIndexOutOfRange { index: u64, available: usize },

    /// The transport delivered a frame of the wrong kind.
    #[error("unexpected {actual} frame (expected {expected})")]
    UnsupportedFrameType {
        expected: FrameKind,
        actual: FrameKind,
    },

    /// A decoder operation was called out of order.
    #[error("cannot {operation} while decoder is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// JSON serialization of a scalar failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame-level error from the transport collaborator.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

impl CodecError {
    pub(crate) fn header(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn payload(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
