use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::kind::FrameKind;
use crate::traits::{FrameSink, FrameSource};

/// In-memory FIFO of frames.
///
/// Implements both [`FrameSink`] and [`FrameSource`], so a writer and a
/// reader can share one queue when both ends live in the same process (or
/// when a transport already hands over whole messages).
#[derive(Debug, Default, Clone)]
pub struct FrameQueue {
    frames: VecDeque<Frame>,
}

impl FrameQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame at the back.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    /// Append a TEXT frame.
    pub fn push_text(&mut self, payload: impl Into<Bytes>) {
        self.push(Frame::text(payload));
    }

    /// Append a BINARY frame.
    pub fn push_binary(&mut self, payload: impl Into<Bytes>) {
        self.push(Frame::binary(payload));
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frames are queued.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over queued frames front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}

impl FrameSource for FrameQueue {
    fn next_frame(&mut self) -> Result<Frame> {
        self.frames.pop_front().ok_or(FrameError::ConnectionClosed)
    }
}

impl FrameSink for FrameQueue {
    fn send_frame(&mut self, kind: FrameKind, payload: &[u8]) -> Result<()> {
        self.push(Frame::new(kind, Bytes::copy_from_slice(payload)));
        Ok(())
    }
}

impl FromIterator<Frame> for FrameQueue {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut queue = FrameQueue::new();
        queue.push_text("51-[{}]");
        queue.push_binary(vec![1u8, 2, 3]);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next_frame().unwrap().kind, FrameKind::Text);
        let frame = queue.next_frame().unwrap();
        assert_eq!(frame.kind, FrameKind::Binary);
        assert_eq!(frame.payload.as_ref(), &[1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_queue_reports_closed() {
        let mut queue = FrameQueue::new();
        assert!(matches!(
            queue.next_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn sink_copies_payload() {
        let mut queue = FrameQueue::new();
        queue.send_frame(FrameKind::Binary, &[4, 5]).unwrap();
        let frames: Vec<_> = queue.iter().cloned().collect();
        assert_eq!(frames, vec![Frame::binary(vec![4u8, 5])]);
    }
}
