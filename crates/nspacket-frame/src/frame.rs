use bytes::Bytes;

use crate::kind::FrameKind;

/// Largest frame payload a stream codec accepts by default: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// One complete message from a frame-oriented transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// A TEXT frame carrying a packet line.
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Text, payload)
    }

    /// A BINARY frame carrying one attachment chunk.
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Binary, payload)
    }

    pub fn is_text(&self) -> bool {
        self.kind == FrameKind::Text
    }

    /// The payload as UTF-8, for TEXT frames only.
    pub fn as_text(&self) -> Option<&str> {
        if !self.is_text() {
            return None;
        }
        std::str::from_utf8(&self.payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_exposes_line() {
        let frame = Frame::text(r#"2["hi"]"#);
        assert!(frame.is_text());
        assert_eq!(frame.as_text(), Some(r#"2["hi"]"#));
    }

    #[test]
    fn binary_frame_is_not_text() {
        let frame = Frame::binary(b"abc".to_vec());
        assert!(!frame.is_text());
        assert_eq!(frame.as_text(), None);

        let garbled = Frame::text(vec![0xffu8, 0xfe]);
        assert_eq!(garbled.as_text(), None);
    }
}
