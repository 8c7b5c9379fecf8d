use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::attachment::AttachmentMode;
use crate::error::Result;
use crate::header::encode_header;
use crate::packet::{Packet, PacketType};
use crate::value::write_list;
use crate::walker::attach;

/// Encoder configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    /// How attachments are carried. `Inline` keeps every byte inside the text
    /// line and never promotes the packet type.
    pub attachment_mode: AttachmentMode,
}

/// An encoded packet: one text line plus zero or more binary chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedPacket {
    /// Header fields followed by the JSON payload array.
    pub text: Bytes,
    /// Attachment chunks in index order.
    pub attachments: Vec<Bytes>,
}

impl EncodedPacket {
    /// True if the packet needs out-of-band chunks.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// Packet encoder.
///
/// Holds no per-packet state; one instance can encode any number of packets.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    /// Encoder with multiplexed attachments.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode a packet into its text line and attachment chunks.
    ///
    /// In multiplex mode an Event or Ack carrying at least one attachment is
    /// written as BinaryEvent or BinaryAck. The input packet is not modified.
    /// A namespace that does not start with `/`, or that contains `,`, fails
    /// with [`CodecError::MalformedHeader`](crate::CodecError::MalformedHeader).
    pub fn encode(&self, packet: &Packet) -> Result<EncodedPacket> {
        let mode = self.config.attachment_mode;
        let mut header = packet.header.clone();

        let (payload, attachments) = match (&packet.payload, mode) {
            (Some(payload), AttachmentMode::Multiplex) => {
                let attached = attach(payload);
                (Some(attached.payload), attached.chunks)
            }
            (Some(payload), AttachmentMode::Inline) => (Some(payload.clone()), Vec::new()),
            (None, _) => (None, Vec::new()),
        };

        if !attachments.is_empty()
            && matches!(header.packet_type, PacketType::Event | PacketType::Ack)
        {
            header.packet_type = header.packet_type.to_binary();
        }

        let mut text = BytesMut::new();
        encode_header(&header, attachments.len() as u64, payload.is_some(), &mut text)?;
        if let Some(payload) = &payload {
            write_list(payload, &mut text, mode)?;
        }

        debug!(
            packet_type = %header.packet_type,
            namespace = %header.namespace,
            attachments = attachments.len(),
            len = text.len(),
            "encoded packet"
        );

        Ok(EncodedPacket {
            text: text.freeze(),
            attachments,
        })
    }
}

/// Encode with the default configuration.
pub fn encode(packet: &Packet) -> Result<EncodedPacket> {
    Encoder::new().encode(packet)
}
