//! Attachment extraction and reinsertion.
//!
//! Both directions walk the payload in the same pre-order: list elements by
//! index, map entries by insertion order. The index stamped on each
//! attachment during [`attach`] is the only link between a placeholder and
//! its out-of-band chunk, so the receiver recovers the same positions by
//! walking the tree it parsed.

use bytes::Bytes;

use crate::error::{CodecError, Result};
use crate::value::{Map, Value};

/// Payload with attachments replaced by indexed placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Attached {
    /// Copy of the input tree; every attachment is marked binary and indexed.
    pub payload: Vec<Value>,
    /// Attachment bytes in index order.
    pub chunks: Vec<Bytes>,
}

/// Assign dense indices `0..N-1` to every attachment in pre-order and collect
/// their bytes.
///
/// The input is left untouched; the returned tree carries the indices.
pub fn attach(payload: &[Value]) -> Attached {
    let mut chunks = Vec::new();
    let payload = payload
        .iter()
        .map(|value| attach_value(value, &mut chunks))
        .collect();
    Attached { payload, chunks }
}

fn attach_value(value: &Value, chunks: &mut Vec<Bytes>) -> Value {
    match value {
        Value::Attachment(attachment) => {
            let mut placeholder = attachment.clone();
            placeholder.is_binary = true;
            placeholder.index = chunks.len() as u64;
            chunks.push(attachment.data.clone());
            Value::Attachment(placeholder)
        }
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| attach_value(item, chunks))
                .collect(),
        ),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(key, item)| (key, attach_value(item, chunks)))
                .collect::<Map>(),
        ),
        scalar => scalar.clone(),
    }
}

/// Fill every multiplex placeholder with `chunks[index]`.
///
/// Inline attachments already carry their bytes and are skipped.
pub fn detach(payload: &mut [Value], chunks: &[Bytes]) -> Result<()> {
    payload
        .iter_mut()
        .try_for_each(|value| detach_value(value, chunks))
}

fn detach_value(value: &mut Value, chunks: &[Bytes]) -> Result<()> {
    match value {
        Value::Attachment(attachment) if attachment.is_binary => {
            let chunk = usize::try_from(attachment.index)
                .ok()
                .and_then(|i| chunks.get(i))
                .ok_or(CodecError::AttachmentIndexOutOfRange {
                    index: attachment.index,
                    available: chunks.len(),
                })?;
            attachment.data = chunk.clone();
            Ok(())
        }
        Value::List(items) => items
            .iter_mut()
            .try_for_each(|item| detach_value(item, chunks)),
        Value::Map(map) => map
            .values_mut()
            .try_for_each(|item| detach_value(item, chunks)),
        _ => Ok(()),
    }
}

/// Number of multiplex placeholders in a payload.
pub fn count_placeholders(payload: &[Value]) -> usize {
    payload.iter().map(count_value).sum()
}

fn count_value(value: &Value) -> usize {
    match value {
        Value::Attachment(attachment) => usize::from(attachment.is_binary),
        Value::List(items) => count_placeholders(items),
        Value::Map(map) => map.iter().map(|(_, item)| count_value(item)).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::attachment::Attachment;

    fn indices(payload: &[Value]) -> Vec<u64> {
        fn walk(value: &Value, out: &mut Vec<u64>) {
            match value {
                Value::Attachment(a) => out.push(a.index),
                Value::List(items) => items.iter().for_each(|v| walk(v, out)),
                Value::Map(map) => map.iter().for_each(|(_, v)| walk(v, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        payload.iter().for_each(|v| walk(v, &mut out));
        out
    }

    #[test]
    fn single_attachment() {
        let attached = attach(&[Value::bytes(vec![1u8, 2])]);
        assert_eq!(attached.chunks, vec![Bytes::from_static(&[1, 2])]);
        let a = attached.payload[0].as_attachment().unwrap();
        assert!(a.is_binary);
        assert_eq!(a.index, 0);
    }

    #[test]
    fn pre_order_across_lists_and_maps() {
        let mut inner = Map::new();
        inner.insert("second", Value::bytes(vec![2u8]));
        inner.insert("i", Value::from(3));
        inner.insert("third", Value::List(vec![Value::bytes(vec![3u8])]));

        let payload = vec![
            Value::from("event"),
            Value::bytes(vec![1u8]),
            Value::Map(inner),
            Value::bytes(vec![4u8]),
        ];
        let attached = attach(&payload);

        assert_eq!(indices(&attached.payload), vec![0, 1, 2, 3]);
        let bytes: Vec<u8> = attached.chunks.iter().map(|c| c[0]).collect();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert_eq!(count_placeholders(&attached.payload), 4);
    }

    #[test]
    fn attach_leaves_input_untouched() {
        let payload = vec![Value::bytes(vec![9u8])];
        let _ = attach(&payload);
        let a = payload[0].as_attachment().unwrap();
        assert!(!a.is_binary);
        assert_eq!(count_placeholders(&payload), 0);
    }

    #[test]
    fn detach_fills_placeholders() {
        let mut map = Map::new();
        map.insert("buf", Value::Attachment(Attachment::placeholder(1)));
        let mut payload = vec![
            Value::Attachment(Attachment::placeholder(0)),
            Value::Map(map),
        ];
        let chunks = vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")];

        detach(&mut payload, &chunks).unwrap();

        assert_eq!(payload[0].as_attachment().unwrap().data.as_ref(), b"first");
        let nested = payload[1].as_map().unwrap().get("buf").unwrap();
        assert_eq!(nested.as_attachment().unwrap().data.as_ref(), b"second");
    }

    #[test]
    fn detach_skips_inline_attachments() {
        let mut payload = vec![Value::bytes(vec![5u8])];
        detach(&mut payload, &[]).unwrap();
        assert_eq!(payload[0].as_attachment().unwrap().data.as_ref(), &[5]);
    }

    #[test]
    fn detach_rejects_out_of_range_index() {
        let mut payload = vec![Value::Attachment(Attachment::placeholder(2))];
        let err = detach(&mut payload, &[Bytes::new()]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::AttachmentIndexOutOfRange {
                index: 2,
                available: 1
            }
        ));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
            proptest::collection::vec(any::<u8>(), 0..8).prop_map(Value::bytes),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                proptest::collection::vec(("[a-z]{1,4}", inner), 0..4)
                    .prop_map(|entries| Value::Map(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_indices_are_dense_pre_order(payload in proptest::collection::vec(arb_value(), 0..4)) {
            let attached = attach(&payload);
            let seen = indices(&attached.payload);
            let expected: Vec<u64> = (0..attached.chunks.len() as u64).collect();
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn prop_detach_restores_attach(payload in proptest::collection::vec(arb_value(), 0..4)) {
            let mut attached = attach(&payload);
            detach(&mut attached.payload, &attached.chunks).unwrap();
            prop_assert_eq!(attached.payload, payload);
        }
    }
}
