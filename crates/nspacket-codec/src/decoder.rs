use std::fmt;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::error::{CodecError, Result};
use crate::header::{decode_header, ParsedHeader};
use crate::packet::Packet;
use crate::scanner::scan_payload;
use crate::value::Value;
use crate::walker::detach;

/// Default limit on attachments announced by a single packet.
pub const DEFAULT_MAX_ATTACHMENTS: usize = 1024;

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Packets announcing more attachments than this are rejected before any
    /// chunk is buffered.
    pub max_attachments: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_attachments: DEFAULT_MAX_ATTACHMENTS,
        }
    }
}

/// Where a [`Decoder`] is in its per-packet cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Fresh,
    HeaderParsed,
    PayloadParsed,
    Complete,
    Failed,
}

impl DecodeState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::HeaderParsed => "header_parsed",
            Self::PayloadParsed => "payload_parsed",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stateful two-phase packet decoder.
///
/// A packet is decoded by calling, in order:
///
/// 1. [`decode_header`](Self::decode_header) on the text line,
/// 2. [`decode_payload`](Self::decode_payload) on the bytes after the header,
///    which returns the number of chunks still expected,
/// 3. [`supply_attachment`](Self::supply_attachment) once per chunk,
/// 4. [`finish`](Self::finish) to get the packet.
///
/// Calls out of that order fail with [`CodecError::InvalidState`]. Any error
/// leaves the decoder in [`DecodeState::Failed`] until [`reset`](Self::reset).
/// After `finish`, the next `decode_header` starts a new packet.
#[derive(Debug)]
pub struct Decoder {
    config: DecoderConfig,
    state: DecodeState,
    header: Option<ParsedHeader>,
    payload: Option<Vec<Value>>,
    expected: usize,
    consumed: usize,
    chunks: Vec<Bytes>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            state: DecodeState::Fresh,
            header: None,
            payload: None,
            expected: 0,
            consumed: 0,
            chunks: Vec::new(),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Chunks still to be supplied before [`finish`](Self::finish).
    pub fn pending_attachments(&self) -> usize {
        self.expected.saturating_sub(self.chunks.len())
    }

    /// Bytes of payload consumed by the last [`decode_payload`](Self::decode_payload).
    pub fn payload_len(&self) -> usize {
        self.consumed
    }

    /// Read the header fields of a new packet.
    pub fn decode_header(&mut self, src: &[u8]) -> Result<ParsedHeader> {
        if !matches!(self.state, DecodeState::Fresh | DecodeState::Complete) {
            return self.fail(self.invalid_state("decode header"));
        }
        self.clear();

        let parsed = match decode_header(src) {
            Ok(parsed) => parsed,
            Err(err) => return self.fail(err),
        };
        if parsed.attachment_count > self.config.max_attachments as u64 {
            return self.fail(CodecError::header(
                1,
                format!(
                    "{} attachments announced, limit is {}",
                    parsed.attachment_count, self.config.max_attachments
                ),
            ));
        }

        trace!(
            packet_type = %parsed.header.packet_type,
            attachments = parsed.attachment_count,
            "decoded header"
        );
        self.header = Some(parsed.clone());
        self.state = DecodeState::HeaderParsed;
        Ok(parsed)
    }

    /// Scan the payload array from `rest`, the bytes following the header.
    ///
    /// Empty (or all-whitespace) input means the packet has no payload.
    /// Returns the number of placeholders found, which is the number of
    /// chunks [`finish`](Self::finish) requires. A binary packet whose
    /// announced count differs from that number fails with
    /// [`CodecError::MissingAttachments`].
    pub fn decode_payload(&mut self, rest: &[u8]) -> Result<usize> {
        if self.state != DecodeState::HeaderParsed {
            return self.fail(self.invalid_state("decode payload"));
        }
        let (binary, announced) = self
            .header
            .as_ref()
            .map_or((false, 0), |parsed| (parsed.binary, parsed.attachment_count));

        let (payload, consumed, placeholders) = if rest.trim_ascii().is_empty() {
            (None, rest.len(), 0)
        } else {
            let scanned = match scan_payload(rest) {
                Ok(scanned) => scanned,
                Err(err) => return self.fail(err),
            };
            if scanned.placeholders > self.config.max_attachments {
                return self.fail(CodecError::payload(
                    scanned.consumed,
                    format!(
                        "{} placeholders, limit is {}",
                        scanned.placeholders, self.config.max_attachments
                    ),
                ));
            }
            (Some(scanned.values), scanned.consumed, scanned.placeholders)
        };

        if binary && announced != placeholders as u64 {
            return self.fail(CodecError::MissingAttachments {
                expected: announced,
                received: placeholders as u64,
            });
        }

        self.payload = payload;
        self.consumed = consumed;
        self.expected = placeholders;
        self.state = DecodeState::PayloadParsed;
        Ok(self.expected)
    }

    /// Header and payload of a complete text line in one call.
    ///
    /// Anything but whitespace after the payload array is rejected.
    pub fn decode_text(&mut self, src: &[u8]) -> Result<usize> {
        let parsed = self.decode_header(src)?;
        let rest = &src[parsed.payload_offset..];
        let expected = self.decode_payload(rest)?;
        if !rest[self.consumed..].trim_ascii().is_empty() {
            let offset = parsed.payload_offset + self.consumed;
            return self.fail(CodecError::payload(offset, "trailing data after payload"));
        }
        Ok(expected)
    }

    /// Hand over the next attachment chunk, in index order.
    pub fn supply_attachment(&mut self, chunk: Bytes) -> Result<()> {
        if self.state != DecodeState::PayloadParsed {
            return self.fail(self.invalid_state("supply attachment"));
        }
        if self.chunks.len() == self.expected {
            return self.fail(CodecError::MissingAttachments {
                expected: self.expected as u64,
                received: self.expected as u64 + 1,
            });
        }
        trace!(index = self.chunks.len(), len = chunk.len(), "attachment supplied");
        self.chunks.push(chunk);
        Ok(())
    }

    /// Reinsert the supplied chunks and return the packet.
    pub fn finish(&mut self) -> Result<Packet> {
        if self.state != DecodeState::PayloadParsed {
            return self.fail(self.invalid_state("finish"));
        }
        if self.chunks.len() != self.expected {
            return self.fail(CodecError::MissingAttachments {
                expected: self.expected as u64,
                received: self.chunks.len() as u64,
            });
        }

        let mut payload = self.payload.take();
        if let Some(values) = payload.as_mut() {
            if let Err(err) = detach(values, &self.chunks) {
                return self.fail(err);
            }
        }
        let Some(parsed) = self.header.take() else {
            return self.fail(self.invalid_state("finish"));
        };

        debug!(
            packet_type = %parsed.header.packet_type,
            namespace = %parsed.header.namespace,
            attachments = self.chunks.len(),
            "decoded packet"
        );
        self.chunks.clear();
        self.state = DecodeState::Complete;
        Ok(Packet {
            header: parsed.header,
            payload,
        })
    }

    /// Abandon the current packet and return to [`DecodeState::Fresh`].
    pub fn reset(&mut self) {
        if !self.chunks.is_empty() {
            warn!(
                state = %self.state,
                buffered = self.chunks.len(),
                "discarding partially decoded packet"
            );
        }
        self.clear();
        self.state = DecodeState::Fresh;
    }

    fn clear(&mut self) {
        self.header = None;
        self.payload = None;
        self.expected = 0;
        self.consumed = 0;
        self.chunks.clear();
    }

    fn invalid_state(&self, operation: &'static str) -> CodecError {
        CodecError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    fn fail<T>(&mut self, err: CodecError) -> Result<T> {
        self.state = DecodeState::Failed;
        Err(err)
    }
}

/// Decode a text line and its attachment chunks.
pub fn decode(text: &[u8], chunks: &[Bytes]) -> Result<Packet> {
    let mut decoder = Decoder::new();
    decoder.decode_text(text)?;
    for chunk in chunks {
        decoder.supply_attachment(chunk.clone())?;
    }
    decoder.finish()
}
