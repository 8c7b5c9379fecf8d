use std::fmt;

use crate::value::Value;

/// Semantic packet kind, encoded as a single ASCII digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Request (client) or grant (server) of access to a namespace.
    Connect = 0,
    /// One side leaves a namespace. Carries no payload.
    Disconnect = 1,
    /// Event with arguments and an optional ack id.
    Event = 2,
    /// Reply to an event that carried an ack id.
    Ack = 3,
    /// Namespace connection refused.
    Error = 4,
    /// Wire-only: an Event whose payload carries attachments.
    BinaryEvent = 5,
    /// Wire-only: an Ack whose payload carries attachments.
    BinaryAck = 6,
}

impl PacketType {
    /// Map an ordinal `0..=6` to its type.
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(PacketType::Connect),
            1 => Some(PacketType::Disconnect),
            2 => Some(PacketType::Event),
            3 => Some(PacketType::Ack),
            4 => Some(PacketType::Error),
            5 => Some(PacketType::BinaryEvent),
            6 => Some(PacketType::BinaryAck),
            _ => None,
        }
    }

    /// Numeric ordinal of the type.
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// True for the attachment-carrying wire variants.
    pub const fn is_binary(self) -> bool {
        matches!(self, PacketType::BinaryEvent | PacketType::BinaryAck)
    }

    /// Promote Event/Ack to their attachment-carrying variant.
    pub const fn to_binary(self) -> Self {
        match self {
            PacketType::Event => PacketType::BinaryEvent,
            PacketType::Ack => PacketType::BinaryAck,
            other => other,
        }
    }

    /// Fold the attachment-carrying variants back to Event/Ack.
    pub const fn to_plain(self) -> Self {
        match self {
            PacketType::BinaryEvent => PacketType::Event,
            PacketType::BinaryAck => PacketType::Ack,
            other => other,
        }
    }

    /// Lower-case name, as used by the CLI packet description.
    pub const fn name(self) -> &'static str {
        match self {
            PacketType::Connect => "connect",
            PacketType::Disconnect => "disconnect",
            PacketType::Event => "event",
            PacketType::Ack => "ack",
            PacketType::Error => "error",
            PacketType::BinaryEvent => "binary_event",
            PacketType::BinaryAck => "binary_ack",
        }
    }

    /// Parse a lower-case name produced by [`PacketType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        (0..=6)
            .filter_map(PacketType::from_ordinal)
            .find(|t| t.name() == name)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Packet header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub packet_type: PacketType,
    /// True iff an ack id is present; an id of 0 is a valid present id.
    pub need_ack: bool,
    pub ack_id: u64,
    /// Empty for the root namespace, otherwise `/` and a name without `,`.
    pub namespace: String,
}

impl Header {
    /// Header with no namespace and no ack id.
    pub fn new(packet_type: PacketType) -> Self {
        Self {
            packet_type,
            need_ack: false,
            ack_id: 0,
            namespace: String::new(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set (and mark present) the ack id.
    pub fn with_ack_id(mut self, ack_id: u64) -> Self {
        self.need_ack = true;
        self.ack_id = ack_id;
        self
    }

    /// The ack id, if present.
    pub fn ack(&self) -> Option<u64> {
        self.need_ack.then_some(self.ack_id)
    }
}

/// A decoded or to-be-encoded packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub header: Header,
    /// `None` when no payload array is present on the wire; `Some(vec![])`
    /// for an explicit `[]`.
    pub payload: Option<Vec<Value>>,
}

impl Packet {
    /// Packet without a payload.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            payload: None,
        }
    }

    /// Packet with the given payload arguments.
    pub fn with_payload(header: Header, payload: Vec<Value>) -> Self {
        Self {
            header,
            payload: Some(payload),
        }
    }

    /// Event packet on the root namespace: `[name, args...]`.
    pub fn event(name: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        let mut payload = vec![Value::String(name.into())];
        payload.extend(args);
        Self::with_payload(Header::new(PacketType::Event), payload)
    }

    /// Event name: the first payload element when it is a string.
    pub fn event_name(&self) -> Option<&str> {
        match self.payload.as_deref()?.first()? {
            Value::String(name) => Some(name),
            _ => None,
        }
    }

    /// Payload elements (empty when the payload is absent).
    pub fn args(&self) -> &[Value] {
        self.payload.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_round_trip() {
        for ordinal in 0..=6u8 {
            let t = PacketType::from_ordinal(ordinal).unwrap();
            assert_eq!(t.ordinal(), ordinal);
            assert_eq!(PacketType::from_name(t.name()), Some(t));
        }
        assert_eq!(PacketType::from_ordinal(7), None);
    }

    #[test]
    fn binary_promotion_and_demotion() {
        assert_eq!(PacketType::Event.to_binary(), PacketType::BinaryEvent);
        assert_eq!(PacketType::Ack.to_binary(), PacketType::BinaryAck);
        assert_eq!(PacketType::Connect.to_binary(), PacketType::Connect);
        assert_eq!(PacketType::BinaryEvent.to_plain(), PacketType::Event);
        assert_eq!(PacketType::BinaryAck.to_plain(), PacketType::Ack);
        assert!(PacketType::BinaryAck.is_binary());
        assert!(!PacketType::Error.is_binary());
    }

    #[test]
    fn header_builders() {
        let header = Header::new(PacketType::Disconnect)
            .with_namespace("/woot")
            .with_ack_id(0);
        assert!(header.need_ack);
        assert_eq!(header.ack(), Some(0));
        assert_eq!(header.namespace, "/woot");
        assert_eq!(Header::new(PacketType::Connect).ack(), None);
    }

    #[test]
    fn event_name_is_first_string() {
        let packet = Packet::event("project:delete", [Value::from(123)]);
        assert_eq!(packet.event_name(), Some("project:delete"));
        assert_eq!(packet.args().len(), 2);

        let packet = Packet::with_payload(Header::new(PacketType::Ack), vec![Value::Null]);
        assert_eq!(packet.event_name(), None);
        assert!(Packet::new(Header::new(PacketType::Connect)).args().is_empty());
    }
}
