use crate::error::Result;
use crate::frame::Frame;
use crate::kind::FrameKind;

/// Read side of a frame-oriented transport.
///
/// Each call hands back one complete, owned frame. Dropping the frame releases
/// it; nothing is held between calls.
pub trait FrameSource {
    /// Return the next frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when no frame will follow.
    fn next_frame(&mut self) -> Result<Frame>;
}

/// Write side of a frame-oriented transport.
pub trait FrameSink {
    /// Send `payload` as one complete frame of the given kind.
    fn send_frame(&mut self, kind: FrameKind, payload: &[u8]) -> Result<()>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Frame> {
        (**self).next_frame()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn send_frame(&mut self, kind: FrameKind, payload: &[u8]) -> Result<()> {
        (**self).send_frame(kind, payload)
    }
}
