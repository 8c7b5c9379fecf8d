//! Tagged message framing for the nspacket codec.
//!
//! Packets travel as one TEXT frame (header and JSON payload) followed by one
//! BINARY frame per attachment. The [`FrameSource`] and [`FrameSink`] traits
//! are the seam the packet codec talks to; any transport that can deliver
//! whole tagged messages implements them. [`FrameQueue`] is the in-memory
//! implementation, and with the `async` feature [`TaggedFrameCodec`] carries
//! frames over a plain byte stream.

pub mod error;
pub mod frame;
pub mod kind;
pub mod queue;
pub mod traits;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::TaggedFrameCodec;
pub use error::{FrameError, Result};
pub use frame::{Frame, DEFAULT_MAX_PAYLOAD};
pub use kind::FrameKind;
pub use queue::FrameQueue;
pub use traits::{FrameSink, FrameSource};
