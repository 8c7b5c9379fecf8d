//! Frame kinds.
//!
//! A packet's header and JSON payload always occupy a TEXT frame; each
//! attachment occupies its own BINARY frame.

use std::fmt;

/// Tag carried by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// UTF-8 header line plus JSON payload.
    Text,
    /// One raw attachment chunk.
    Binary,
}

impl FrameKind {
    /// Wire byte used by the stream framing.
    pub const fn as_byte(self) -> u8 {
        match self {
            FrameKind::Text => 0,
            FrameKind::Binary => 1,
        }
    }

    /// Parse a wire byte; `None` for anything but 0 or 1.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(FrameKind::Text),
            1 => Some(FrameKind::Binary),
            _ => None,
        }
    }

    /// Returns a human-readable name for the kind.
    pub const fn name(self) -> &'static str {
        match self {
            FrameKind::Text => "TEXT",
            FrameKind::Binary => "BINARY",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
