//! Namespace-aware event packets with out-of-band binary attachments.
//!
//! # Crate Structure
//!
//! - [`frame`]: tagged TEXT/BINARY framing and the frame source/sink seam
//! - [`codec`]: packet model, encoder, two-phase decoder and frame binding

/// Re-export frame types.
pub mod frame {
    pub use nspacket_frame::*;
}

/// Re-export codec types.
pub mod codec {
    pub use nspacket_codec::*;
}

pub use nspacket_codec::{decode, encode, Packet, Value};
