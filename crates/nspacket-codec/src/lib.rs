//! Event packet codec with namespaces, acknowledgement ids and out-of-band
//! binary attachments.
//!
//! A packet is a single text line:
//!
//! ```text
//! 2/admin,456["project:delete",123]
//! 51-["msg",{"_placeholder":true,"num":0}]
//! ```
//!
//! The type digit comes first, then (for binary packets) the attachment count
//! and `-`, the namespace, the ack id and finally a JSON payload array. Binary
//! blobs inside the payload are replaced by numbered placeholders on encode
//! and travel as separate chunks; the decoder puts them back.
//!
//! - [`Encoder`] / [`encode`] turn a [`Packet`] into text plus chunks.
//! - [`Decoder`] / [`decode`] reverse that, in two phases so a transport can
//!   read the text frame before the binary frames arrive.
//! - [`PacketWriter`] / [`PacketReader`] drive the codec over
//!   [`nspacket_frame`] sinks and sources.
//! - [`encode_embedded`] / [`decode_embedded`] pack everything into one buffer.

pub mod attachment;
pub mod binding;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod header;
pub mod packet;
pub mod scanner;
pub mod value;
pub mod walker;

pub use attachment::{Attachment, AttachmentMode};
pub use binding::{
    decode_embedded, encode_embedded, ChunkBoundaries, PacketReader, PacketWriter,
    DEFAULT_SEPARATOR,
};
pub use decoder::{decode, DecodeState, Decoder, DecoderConfig, DEFAULT_MAX_ATTACHMENTS};
pub use encoder::{encode, EncodedPacket, Encoder, EncoderConfig};
pub use error::{CodecError, Result};
pub use header::{decode_header, encode_header, ParsedHeader};
pub use packet::{Header, Packet, PacketType};
pub use scanner::{scan_payload, Scanned};
pub use value::{Map, Value};
pub use walker::{attach, count_placeholders, detach, Attached};
