//! Packet transport over tagged frames, and the single-buffer embedded form.
//!
//! On a frame transport a packet is one TEXT frame followed by one BINARY
//! frame per attachment. When only a single byte buffer is available, the
//! chunks follow the text line, each preceded by a separator byte.

use bytes::{BufMut, Bytes, BytesMut};
use nspacket_frame::{FrameKind, FrameSink, FrameSource};
use tracing::trace;

use crate::decoder::{DecodeState, Decoder, DecoderConfig};
use crate::encoder::{Encoder, EncoderConfig};
use crate::error::{CodecError, Result};
use crate::packet::Packet;

/// Separator between the text line and embedded chunks.
pub const DEFAULT_SEPARATOR: u8 = b'\n';

/// Writes packets to a [`FrameSink`].
#[derive(Debug)]
pub struct PacketWriter<S> {
    sink: S,
    encoder: Encoder,
}

impl<S: FrameSink> PacketWriter<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, EncoderConfig::default())
    }

    pub fn with_config(sink: S, config: EncoderConfig) -> Self {
        Self {
            sink,
            encoder: Encoder::with_config(config),
        }
    }

    /// Send one TEXT frame, then one BINARY frame per attachment in index order.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        let encoded = self.encoder.encode(packet)?;
        self.sink.send_frame(FrameKind::Text, &encoded.text)?;
        for chunk in &encoded.attachments {
            self.sink.send_frame(FrameKind::Binary, chunk)?;
        }
        trace!(frames = 1 + encoded.attachments.len(), "packet written");
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

/// Reads packets from a [`FrameSource`].
#[derive(Debug)]
pub struct PacketReader<S> {
    source: S,
    decoder: Decoder,
}

impl<S: FrameSource> PacketReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    pub fn with_config(source: S, config: DecoderConfig) -> Self {
        Self {
            source,
            decoder: Decoder::with_config(config),
        }
    }

    /// Read one packet: a TEXT frame and as many BINARY frames as it announces.
    ///
    /// A frame of the wrong kind fails with [`CodecError::UnsupportedFrameType`].
    /// After any error the next call starts over with a fresh frame.
    pub fn read_packet(&mut self) -> Result<Packet> {
        if self.decoder.state() != DecodeState::Fresh {
            self.decoder.reset();
        }

        let frame = self.source.next_frame()?;
        expect_kind(FrameKind::Text, frame.kind)?;
        let expected = self.decoder.decode_text(&frame.payload)?;

        for _ in 0..expected {
            let frame = self.source.next_frame()?;
            expect_kind(FrameKind::Binary, frame.kind)?;
            self.decoder.supply_attachment(frame.payload)?;
        }
        self.decoder.finish()
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

fn expect_kind(expected: FrameKind, actual: FrameKind) -> Result<()> {
    if actual != expected {
        return Err(CodecError::UnsupportedFrameType { expected, actual });
    }
    Ok(())
}

/// How embedded chunks are delimited after the text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkBoundaries<'a> {
    /// Chunks are split on the separator byte, so they must not contain it.
    Separated,
    /// Exact chunk lengths known out of band; chunks may contain any byte.
    Lengths(&'a [usize]),
    /// A single chunk running to the end of input.
    Trailing,
}

/// Encode a packet into one buffer: the text line, then for each attachment
/// the separator followed by the chunk bytes.
pub fn encode_embedded(packet: &Packet, separator: u8) -> Result<Bytes> {
    let encoded = Encoder::new().encode(packet)?;
    let extra: usize = encoded.attachments.iter().map(|c| c.len() + 1).sum();
    let mut dst = BytesMut::with_capacity(encoded.text.len() + extra);
    dst.put_slice(&encoded.text);
    for chunk in &encoded.attachments {
        dst.put_u8(separator);
        dst.put_slice(chunk);
    }
    Ok(dst.freeze())
}

/// Decode a buffer produced by [`encode_embedded`].
pub fn decode_embedded(src: &[u8], separator: u8, boundaries: ChunkBoundaries<'_>) -> Result<Packet> {
    let src = Bytes::copy_from_slice(src);
    let mut decoder = Decoder::new();

    let parsed = decoder.decode_header(&src)?;
    let expected = decoder.decode_payload(&src[parsed.payload_offset..])?;
    let tail_start = parsed.payload_offset + decoder.payload_len();
    let tail = &src[tail_start..];

    if expected == 0 {
        if !tail.trim_ascii().is_empty() {
            return Err(CodecError::payload(tail_start, "trailing data after payload"));
        }
        return decoder.finish();
    }

    if tail.first() != Some(&separator) {
        return Err(CodecError::MissingAttachments {
            expected: expected as u64,
            received: 0,
        });
    }
    let body_start = tail_start + 1;
    for (start, end) in chunk_ranges(&src[body_start..], separator, boundaries, body_start)? {
        decoder.supply_attachment(src.slice(body_start + start..body_start + end))?;
    }
    decoder.finish()
}

/// Chunk ranges within `body`; `base` is only used for error offsets.
fn chunk_ranges(
    body: &[u8],
    separator: u8,
    boundaries: ChunkBoundaries<'_>,
    base: usize,
) -> Result<Vec<(usize, usize)>> {
    match boundaries {
        ChunkBoundaries::Trailing => Ok(vec![(0, body.len())]),
        ChunkBoundaries::Separated => {
            let mut ranges = Vec::new();
            let mut start = 0;
            for (i, &byte) in body.iter().enumerate() {
                if byte == separator {
                    ranges.push((start, i));
                    start = i + 1;
                }
            }
            ranges.push((start, body.len()));
            Ok(ranges)
        }
        ChunkBoundaries::Lengths(lengths) => {
            let mut ranges = Vec::with_capacity(lengths.len());
            let mut pos = 0;
            for (i, &len) in lengths.iter().enumerate() {
                if i > 0 {
                    if body.get(pos) != Some(&separator) {
                        return Err(CodecError::payload(base + pos, "expected chunk separator"));
                    }
                    pos += 1;
                }
                let end = pos
                    .checked_add(len)
                    .filter(|&end| end <= body.len())
                    .ok_or_else(|| CodecError::payload(base + pos, "chunk runs past end of input"))?;
                ranges.push((pos, end));
                pos = end;
            }
            if pos != body.len() {
                return Err(CodecError::payload(base + pos, "trailing data after attachments"));
            }
            Ok(ranges)
        }
    }
}

#[cfg(test)]
mod tests {
    use nspacket_frame::{Frame, FrameError, FrameQueue};

    use super::*;
    use crate::packet::{Header, PacketType};
    use crate::value::Value;

    fn sample() -> Packet {
        Packet::with_payload(
            Header::new(PacketType::Event)
                .with_namespace("/woot")
                .with_ack_id(1),
            vec![
                Value::from("msg"),
                Value::bytes(vec![1u8, 2, 3]),
                Value::List(vec![Value::bytes(vec![4u8])]),
            ],
        )
    }

    #[test]
    fn writer_emits_text_then_binary_frames() {
        let mut writer = PacketWriter::new(FrameQueue::new());
        writer.write_packet(&sample()).unwrap();

        let frames: Vec<Frame> = writer.into_inner().iter().cloned().collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].kind, FrameKind::Text);
        assert!(frames[0].payload.starts_with(b"52-/woot,1["));
        assert_eq!(frames[1], Frame::binary(vec![1u8, 2, 3]));
        assert_eq!(frames[2], Frame::binary(vec![4u8]));
    }

    #[test]
    fn queue_round_trip() {
        let mut queue = FrameQueue::new();
        PacketWriter::new(&mut queue).write_packet(&sample()).unwrap();
        PacketWriter::new(&mut queue)
            .write_packet(&Packet::event("second", []))
            .unwrap();

        let mut reader = PacketReader::new(queue);
        assert_eq!(reader.read_packet().unwrap(), sample());
        assert_eq!(reader.read_packet().unwrap().event_name(), Some("second"));
        assert!(matches!(
            reader.read_packet(),
            Err(CodecError::Frame(FrameError::ConnectionClosed))
        ));
    }

    #[test]
    fn first_frame_must_be_text() {
        let mut queue = FrameQueue::new();
        queue.push_binary(vec![1u8]);
        let err = PacketReader::new(queue).read_packet().unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedFrameType {
                expected: FrameKind::Text,
                actual: FrameKind::Binary
            }
        ));
    }

    #[test]
    fn attachment_frames_must_be_binary() {
        let mut queue = FrameQueue::new();
        queue.push_text(r#"51-["msg",{"_placeholder":true,"num":0}]"#);
        queue.push_text("2[]");
        let err = PacketReader::new(queue).read_packet().unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedFrameType {
                expected: FrameKind::Binary,
                actual: FrameKind::Text
            }
        ));
    }

    #[test]
    fn reader_recovers_after_error() {
        let mut queue = FrameQueue::new();
        queue.push_text("9");
        queue.push_text(r#"2["ok"]"#);
        let mut reader = PacketReader::new(queue);

        assert!(matches!(
            reader.read_packet(),
            Err(CodecError::InvalidPacketType(b'9'))
        ));
        assert_eq!(reader.read_packet().unwrap().event_name(), Some("ok"));
    }

    #[test]
    fn embedded_layout() {
        let packet = Packet::with_payload(
            Header::new(PacketType::Event)
                .with_namespace("/woot")
                .with_ack_id(1),
            vec![Value::from("msg"), Value::bytes(vec![2u8, 3, 4])],
        );
        let bytes = encode_embedded(&packet, DEFAULT_SEPARATOR).unwrap();
        assert_eq!(
            bytes.as_ref(),
            b"51-/woot,1[\"msg\",{\"_placeholder\":true,\"num\":0}]\n\x02\x03\x04"
        );

        let decoded = decode_embedded(&bytes, DEFAULT_SEPARATOR, ChunkBoundaries::Trailing).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn embedded_separated_chunks() {
        let mut src =
            br#"52-["hello",{"_placeholder":true,"num":0},"word",{"_placeholder":true,"num":1}]"#
                .to_vec();
        src.extend_from_slice(b"\n\x01\x02\x03\n\x04\x05\x06");

        let packet = decode_embedded(&src, b'\n', ChunkBoundaries::Separated).unwrap();
        let args = packet.args();
        assert_eq!(args.len(), 4);
        assert_eq!(args[1].as_attachment().unwrap().data.as_ref(), &[1, 2, 3]);
        assert_eq!(args[3].as_attachment().unwrap().data.as_ref(), &[4, 5, 6]);
    }

    #[test]
    fn embedded_lengths_allow_separator_in_chunk() {
        let packet = Packet::event(
            "raw",
            [Value::bytes(b"a\nb".to_vec()), Value::bytes(b"\n".to_vec())],
        );
        let bytes = encode_embedded(&packet, b'\n').unwrap();

        let decoded = decode_embedded(&bytes, b'\n', ChunkBoundaries::Lengths(&[3, 1])).unwrap();
        assert_eq!(decoded, packet);

        let err = decode_embedded(&bytes, b'\n', ChunkBoundaries::Lengths(&[3, 5])).unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload { .. }));
    }

    #[test]
    fn embedded_without_chunks_fails() {
        let src = br#"51-["msg",{"_placeholder":true,"num":0}]"#;
        let err = decode_embedded(src, b'\n', ChunkBoundaries::Separated).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingAttachments {
                expected: 1,
                received: 0
            }
        ));
    }

    #[test]
    fn embedded_text_only_packet() {
        let packet = Packet::event("plain", [Value::from(1)]);
        let bytes = encode_embedded(&packet, b'\n').unwrap();
        assert_eq!(bytes.as_ref(), br#"2["plain",1]"#);
        assert_eq!(
            decode_embedded(&bytes, b'\n', ChunkBoundaries::Separated).unwrap(),
            packet
        );
    }
}
