//! Payload value model.
//!
//! Every payload is built from [`Value`] before encoding; the attachment
//! walker and the JSON writer both match on it exhaustively.

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Number;

use crate::attachment::{Attachment, AttachmentMode};
use crate::error::Result;

/// One payload argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Map(Map),
    Attachment(Attachment),
}

impl Value {
    /// An attachment leaf holding `data`.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Value::Attachment(Attachment::new(data))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Value::Attachment(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Serialize as compact JSON, rendering attachments in `mode`.
    pub fn write_json(&self, dst: &mut BytesMut, mode: AttachmentMode) -> Result<()> {
        match self {
            Value::Null => dst.put_slice(b"null"),
            Value::Bool(true) => dst.put_slice(b"true"),
            Value::Bool(false) => dst.put_slice(b"false"),
            Value::Number(n) => serde_json::to_writer((&mut *dst).writer(), n)?,
            Value::String(s) => serde_json::to_writer((&mut *dst).writer(), s)?,
            Value::List(items) => write_list(items, dst, mode)?,
            Value::Map(map) => {
                dst.put_u8(b'{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        dst.put_u8(b',');
                    }
                    serde_json::to_writer((&mut *dst).writer(), key)?;
                    dst.put_u8(b':');
                    value.write_json(dst, mode)?;
                }
                dst.put_u8(b'}');
            }
            Value::Attachment(a) => a.write_json(dst, mode),
        }
        Ok(())
    }

    /// Convert to a `serde_json::Value`, rendering attachments in `mode`.
    pub fn to_json(&self, mode: AttachmentMode) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json(mode)).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json(mode)))
                    .collect(),
            ),
            Value::Attachment(a) => match mode {
                AttachmentMode::Multiplex => serde_json::json!({
                    "_placeholder": true,
                    "num": a.index,
                }),
                AttachmentMode::Inline => serde_json::json!({
                    "type": "Buffer",
                    "data": a.data.to_vec(),
                }),
            },
        }
    }

    /// Convert from a `serde_json::Value`.
    ///
    /// Objects shaped like an inline buffer or a multiplex placeholder become
    /// attachments; all other objects keep their key order as a [`Map`].
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(object) => {
                let map: Map = object
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect();
                Value::from_map(map)
            }
        }
    }

    /// Wrap a decoded object, turning placeholder shapes into attachments.
    pub(crate) fn from_map(map: Map) -> Self {
        match Attachment::from_map(&map) {
            Some(attachment) => Value::Attachment(attachment),
            None => Value::Map(map),
        }
    }
}

/// Serialize a payload argument list as a JSON array.
pub fn write_list(items: &[Value], dst: &mut BytesMut, mode: AttachmentMode) -> Result<()> {
    dst.put_u8(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            dst.put_u8(b',');
        }
        item.write_json(dst, mode)?;
    }
    dst.put_u8(b']');
    Ok(())
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Attachment> for Value {
    fn from(a: Attachment) -> Self {
        Value::Attachment(a)
    }
}

/// Insertion-ordered string-keyed map.
///
/// Order is part of the contract: attachment indices are assigned by walking
/// entries in the order they were inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
