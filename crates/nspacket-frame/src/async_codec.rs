//! `tokio_util::codec` adapter for tagged frames.
//!
//! Async transports that only have a byte stream wrap it in
//! `FramedRead`/`FramedWrite` and exchange [`Frame`] values. Each frame is
//! written as its kind byte (`0` TEXT, `1` BINARY), a big-endian `u32`
//! payload length, then the payload.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::frame::{Frame, DEFAULT_MAX_PAYLOAD};
use crate::kind::FrameKind;

const PREFIX_LEN: usize = 5;

/// Stream codec producing and consuming [`Frame`] values.
#[derive(Debug, Clone)]
pub struct TaggedFrameCodec {
    max_payload: usize,
}

impl Default for TaggedFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggedFrameCodec {
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    /// Codec rejecting payloads longer than `max_payload` in both directions.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self { max_payload }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len > self.max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.max_payload,
            });
        }
        Ok(())
    }
}

impl Decoder for TaggedFrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        // Kind byte is validated before the length is read.
        let Some(&tag) = src.first() else {
            return Ok(None);
        };
        let kind = FrameKind::from_byte(tag).ok_or(FrameError::InvalidFrameKind(tag))?;
        if src.len() < PREFIX_LEN {
            return Ok(None);
        }

        let len = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
        self.check_len(len)?;
        let total = PREFIX_LEN + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(PREFIX_LEN);
        let payload = src.split_to(len).freeze();
        trace!(%kind, len, "frame decoded");
        Ok(Some(Frame { kind, payload }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Frame> for TaggedFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        let len = item.payload.len();
        self.check_len(len)?;
        let wire_len = u32::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
            size: len,
            max: u32::MAX as usize,
        })?;

        dst.reserve(PREFIX_LEN + len);
        dst.put_u8(item.kind.as_byte());
        dst.put_u32(wire_len);
        dst.put_slice(&item.payload);
        trace!(kind = %item.kind, len, "frame encoded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(frames: &[Frame]) -> BytesMut {
        let mut codec = TaggedFrameCodec::new();
        let mut buf = BytesMut::new();
        for frame in frames {
            codec.encode(frame.clone(), &mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn packet_frames_in_order() {
        let frames = [
            Frame::text(r#"51-["msg",{"_placeholder":true,"num":0}]"#),
            Frame::binary(vec![0u8, 255]),
        ];
        let mut buf = encoded(&frames);
        let mut codec = TaggedFrameCodec::new();

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(frames[0].clone()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(frames[1].clone()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn layout_is_kind_then_length() {
        let buf = encoded(&[Frame::binary(vec![7u8, 8])]);
        assert_eq!(&buf[..], &[1, 0, 0, 0, 2, 7, 8]);

        let buf = encoded(&[Frame::text("")]);
        assert_eq!(&buf[..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn waits_for_whole_frame() {
        let full = encoded(&[Frame::text("3/chat,7[]")]);
        let mut codec = TaggedFrameCodec::new();

        let mut buf = BytesMut::from(&full[..3]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(&full[3..full.len() - 1]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(&full[full.len() - 1..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.as_text(), Some("3/chat,7[]"));
    }

    #[test]
    fn unknown_kind_fails_on_first_byte() {
        let mut buf = BytesMut::from(&[9u8][..]);
        let err = TaggedFrameCodec::new().decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::InvalidFrameKind(9)));
    }

    #[test]
    fn oversized_length_rejected_before_payload() {
        let mut codec = TaggedFrameCodec::with_max_payload(4);
        let mut buf = BytesMut::from(&[1u8, 0, 0, 0, 5][..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 5, max: 4 }));

        let err = codec
            .encode(Frame::binary(vec![0u8; 5]), &mut BytesMut::new())
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 5, max: 4 }));
    }

    #[test]
    fn truncated_stream_at_eof_is_closed() {
        let mut buf = encoded(&[Frame::text("2[\"x\"]")]);
        buf.truncate(buf.len() - 1);

        let err = TaggedFrameCodec::new().decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[tokio::test]
    async fn framed_over_duplex() {
        use futures_util::{SinkExt, StreamExt};
        use tokio_util::codec::{FramedRead, FramedWrite};

        let (client, server) = tokio::io::duplex(1024);
        let mut sink = FramedWrite::new(client, TaggedFrameCodec::new());
        let mut stream = FramedRead::new(server, TaggedFrameCodec::new());

        sink.send(Frame::text("51-[{\"_placeholder\":true,\"num\":0}]"))
            .await
            .unwrap();
        sink.send(Frame::binary(vec![1u8, 2, 3])).await.unwrap();
        drop(sink);

        let text = stream.next().await.unwrap().unwrap();
        assert_eq!(text.kind, FrameKind::Text);
        let binary = stream.next().await.unwrap().unwrap();
        assert_eq!(binary, Frame::binary(vec![1u8, 2, 3]));
        assert!(stream.next().await.is_none());
    }
}
