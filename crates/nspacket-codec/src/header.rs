//! Header line grammar.
//!
//! ```text
//! packet        = type-digit [ attach-prefix ] [ namespace ] [ ack-id ] [ payload ]
//! type-digit    = "0".."6"
//! attach-prefix = 1*DIGIT "-"
//! namespace     = "/" 1*(byte except ",") [","]
//! ack-id        = 1*DIGIT
//! ```
//!
//! The attachment count and an ack id with no namespace occupy the same
//! position after the type digit; only the trailing `-` tells them apart, so
//! the decoder keeps the first digit run as a candidate ack id until it has
//! looked past the namespace.

use bytes::{BufMut, BytesMut};

use crate::error::{CodecError, Result};
use crate::packet::{Header, PacketType};

const ATTACHMENT_SEP: u8 = b'-';
const NAMESPACE_START: u8 = b'/';
const NAMESPACE_END: u8 = b',';

/// Result of reading the header fields of a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    /// Header with binary types already folded back to Event/Ack.
    pub header: Header,
    /// The type digit was BinaryEvent or BinaryAck.
    pub binary: bool,
    /// Attachments announced by the prefix; 0 for non-binary types.
    pub attachment_count: u64,
    /// Offset of the first byte after the header fields.
    pub payload_offset: usize,
}

/// Write the header fields.
///
/// `packet_type` is written as given; promotion to a binary variant is the
/// encoder's job. `has_payload` controls the `,` after the namespace. A
/// namespace outside the grammar fails with [`CodecError::MalformedHeader`]
/// and leaves `dst` untouched.
pub fn encode_header(
    header: &Header,
    attachment_count: u64,
    has_payload: bool,
    dst: &mut BytesMut,
) -> Result<()> {
    let namespace_offset = if header.packet_type.is_binary() {
        decimal_len(attachment_count) + 2
    } else {
        1
    };
    check_namespace(&header.namespace, namespace_offset)?;

    dst.put_u8(b'0' + header.packet_type.ordinal());

    if header.packet_type.is_binary() {
        put_decimal(dst, attachment_count);
        dst.put_u8(ATTACHMENT_SEP);
    }

    if !header.namespace.is_empty() {
        dst.put_slice(header.namespace.as_bytes());
        if header.need_ack || has_payload {
            dst.put_u8(NAMESPACE_END);
        }
    }

    if header.need_ack {
        put_decimal(dst, header.ack_id);
    }
    Ok(())
}

/// Empty, or `/` followed by at least one byte and no `,`.
fn check_namespace(namespace: &str, offset: usize) -> Result<()> {
    if namespace.is_empty() {
        return Ok(());
    }
    let Some(name) = namespace.strip_prefix(NAMESPACE_START as char) else {
        return Err(CodecError::header(
            offset,
            format!("namespace must start with '/': {namespace:?}"),
        ));
    };
    if name.is_empty() {
        return Err(CodecError::header(
            offset,
            "the root namespace is written as an empty string, not '/'",
        ));
    }
    if let Some(pos) = namespace.bytes().position(|b| b == NAMESPACE_END) {
        return Err(CodecError::header(
            offset + pos,
            format!("namespace contains ',': {namespace:?}"),
        ));
    }
    Ok(())
}

/// Read the header fields from the start of `src`.
pub fn decode_header(src: &[u8]) -> Result<ParsedHeader> {
    let mut cursor = Cursor::new(src);

    let type_byte = cursor
        .next()
        .ok_or_else(|| CodecError::header(0, "empty packet"))?;
    let packet_type = type_byte
        .checked_sub(b'0')
        .and_then(PacketType::from_ordinal)
        .ok_or(CodecError::InvalidPacketType(type_byte))?;

    // First digit run: attachment count if followed by '-', otherwise a
    // candidate ack id for packets without a namespace.
    let mut candidate = cursor.read_digits()?;
    let mut attachment_count = 0;
    if cursor.peek() == Some(ATTACHMENT_SEP) {
        cursor.bump();
        attachment_count = candidate.take().unwrap_or(0);
    }

    let namespace = if cursor.peek() == Some(NAMESPACE_START) {
        cursor.read_namespace()?
    } else {
        String::new()
    };

    let ack = match cursor.read_digits()? {
        Some(id) => Some(id),
        None => candidate,
    };

    let header = Header {
        packet_type: packet_type.to_plain(),
        need_ack: ack.is_some(),
        ack_id: ack.unwrap_or(0),
        namespace,
    };

    Ok(ParsedHeader {
        header,
        binary: packet_type.is_binary(),
        attachment_count: if packet_type.is_binary() {
            attachment_count
        } else {
            0
        },
        payload_offset: cursor.pos,
    })
}

/// Append the decimal digits of `n`.
pub(crate) fn put_decimal(dst: &mut BytesMut, mut n: u64) {
    let mut digits = [0u8; 20];
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    dst.put_slice(&digits[start..]);
}

fn decimal_len(mut n: u64) -> usize {
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}

/// Byte cursor with one byte of lookahead.
struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.bump();
        Some(byte)
    }

    /// Read a run of ASCII digits; `None` when the run is empty.
    fn read_digits(&mut self) -> Result<Option<u64>> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(byte @ b'0'..=b'9') = self.peek() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(byte - b'0')))
                .ok_or_else(|| CodecError::header(start, "number does not fit in 64 bits"))?;
            self.bump();
        }
        Ok((self.pos > start).then_some(value))
    }

    /// Read a namespace up to `,` (consumed, not included) or end of input.
    fn read_namespace(&mut self) -> Result<String> {
        let start = self.pos;
        let rest = &self.src[start..];
        let len = rest
            .iter()
            .position(|&b| b == NAMESPACE_END)
            .unwrap_or(rest.len());
        let namespace = std::str::from_utf8(&rest[..len])
            .map_err(|_| CodecError::header(start, "namespace is not valid UTF-8"))?
            .to_string();
        self.pos += len;
        if self.peek() == Some(NAMESPACE_END) {
            self.bump();
        }
        Ok(namespace)
    }
}
