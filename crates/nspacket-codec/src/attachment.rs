//! Binary attachments and their two JSON renderings.

use bytes::{BufMut, Bytes, BytesMut};

use crate::header::put_decimal;
use crate::value::{Map, Value};

const PLACEHOLDER_KEY: &str = "_placeholder";
const NUM_KEY: &str = "num";
const TYPE_KEY: &str = "type";
const DATA_KEY: &str = "data";
const BUFFER_TYPE: &str = "Buffer";

/// How attachments are rendered when a payload is serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttachmentMode {
    /// `{"_placeholder":true,"num":<index>}`; bytes travel out of band.
    #[default]
    Multiplex,
    /// `{"type":"Buffer","data":[...]}`; bytes travel inside the JSON.
    Inline,
}

/// A binary blob inside a payload.
///
/// `is_binary` and `index` are wire bookkeeping: they say whether the blob is
/// a multiplexed placeholder and which out-of-band chunk it refers to.
/// Equality only compares `data`.
#[derive(Debug, Clone, Default)]
pub struct Attachment {
    pub is_binary: bool,
    pub index: u64,
    pub data: Bytes,
}

impl Attachment {
    /// A self-contained blob with no index assigned.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            is_binary: false,
            index: 0,
            data: data.into(),
        }
    }

    /// A multiplex placeholder whose bytes have not been delivered yet.
    pub fn placeholder(index: u64) -> Self {
        Self {
            is_binary: true,
            index,
            data: Bytes::new(),
        }
    }

    /// Serialize in the requested mode.
    pub fn write_json(&self, dst: &mut BytesMut, mode: AttachmentMode) {
        match mode {
            AttachmentMode::Multiplex => {
                dst.put_slice(b"{\"_placeholder\":true,\"num\":");
                put_decimal(dst, self.index);
                dst.put_u8(b'}');
            }
            AttachmentMode::Inline => {
                dst.put_slice(b"{\"type\":\"Buffer\",\"data\":[");
                for (i, byte) in self.data.iter().enumerate() {
                    if i > 0 {
                        dst.put_u8(b',');
                    }
                    put_decimal(dst, u64::from(*byte));
                }
                dst.put_slice(b"]}");
            }
        }
    }

    /// Serialize into a fresh string.
    pub fn to_json_string(&self, mode: AttachmentMode) -> String {
        let mut dst = BytesMut::new();
        self.write_json(&mut dst, mode);
        String::from_utf8_lossy(&dst).into_owned()
    }

    /// Recognise either placeholder shape in a decoded object.
    ///
    /// Returns `None` for any other object, which then stays a plain map.
    pub fn from_map(map: &Map) -> Option<Self> {
        if map.len() != 2 {
            return None;
        }

        if let (Some(Value::Bool(true)), Some(num)) = (map.get(PLACEHOLDER_KEY), map.get(NUM_KEY)) {
            return num.as_u64().map(Attachment::placeholder);
        }

        match (map.get(TYPE_KEY), map.get(DATA_KEY)) {
            (Some(Value::String(kind)), Some(Value::List(items))) if kind == BUFFER_TYPE => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Attachment::new),
            _ => None,
        }
    }
}

impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl From<Bytes> for Attachment {
    fn from(data: Bytes) -> Self {
        Attachment::new(data)
    }
}

impl From<Vec<u8>> for Attachment {
    fn from(data: Vec<u8>) -> Self {
        Attachment::new(data)
    }
}
