//! Payload array scanner.
//!
//! Reads the bracketed argument array that follows the header fields in a
//! single forward pass. Quoted strings are taken as opaque tokens (unescaped
//! by `serde_json`), objects are checked against the two attachment shapes,
//! and everything else is a bare token ending at whitespace, `,` or `]`.
//! Elements must be separated by exactly one `,`.
//!
//! Scanning stops right after the closing `]`; whatever follows (for example
//! a separator and embedded attachment bytes) is left to the caller.

use crate::error::{CodecError, Result};
use crate::value::{Map, Value};

/// Nesting limit for lists and objects inside the payload.
pub const MAX_DEPTH: usize = 128;

/// Result of scanning a payload array.
#[derive(Debug, Clone, PartialEq)]
pub struct Scanned {
    /// Top-level arguments.
    pub values: Vec<Value>,
    /// Multiplex placeholders seen, in encounter order.
    pub placeholders: usize,
    /// Bytes consumed, up to and including the closing `]`.
    pub consumed: usize,
}

/// Scan a payload array from the start of `src`.
pub fn scan_payload(src: &[u8]) -> Result<Scanned> {
    let mut scanner = Scanner {
        src,
        pos: 0,
        depth: 0,
        placeholders: 0,
    };
    scanner.skip_whitespace();
    if scanner.peek() != Some(b'[') {
        return Err(CodecError::payload(scanner.pos, "expected '['"));
    }
    scanner.bump();
    let values = scanner.scan_list_body()?;
    Ok(Scanned {
        values,
        placeholders: scanner.placeholders,
        consumed: scanner.pos,
    })
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
    placeholders: usize,
}

/// Position within a list between two separators.
#[derive(Clone, Copy)]
enum Slot {
    /// Right after `[`.
    Open,
    /// Right after `,`.
    Empty,
    /// Inside a bare token starting at this offset.
    Bare(usize),
    /// An element is complete; only `,` or `]` may follow.
    Filled,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.bump();
        }
    }

    fn expect(&mut self, byte: u8, what: &str) -> Result<()> {
        self.skip_whitespace();
        if self.peek() != Some(byte) {
            return Err(CodecError::payload(self.pos, format!("expected {what}")));
        }
        self.bump();
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CodecError::payload(self.pos, "nesting too deep"));
        }
        Ok(())
    }

    /// Elements of a list whose `[` has been consumed, through its `]`.
    fn scan_list_body(&mut self) -> Result<Vec<Value>> {
        self.enter()?;
        let mut items = Vec::new();
        let mut slot = Slot::Open;

        loop {
            let byte = self
                .peek()
                .ok_or_else(|| CodecError::payload(self.pos, "unterminated array"))?;

            if let Slot::Bare(start) = slot {
                if matches!(byte, b',' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                    items.push(self.flush((start, self.pos)));
                    slot = Slot::Filled;
                }
            }

            match (byte, slot) {
                (b' ' | b'\t' | b'\n' | b'\r', _) => self.bump(),
                (b',', Slot::Filled) => {
                    self.bump();
                    slot = Slot::Empty;
                }
                (b',', _) => return Err(CodecError::payload(self.pos, "missing element before ','")),
                (b']', Slot::Open | Slot::Filled) => {
                    self.bump();
                    self.depth -= 1;
                    return Ok(items);
                }
                (b']', _) => return Err(CodecError::payload(self.pos, "trailing ','")),
                (b'"' | b'{' | b'[', Slot::Bare(_)) | (_, Slot::Filled) => {
                    return Err(CodecError::payload(self.pos, "expected ',' or ']'"));
                }
                (b'"', _) => {
                    items.push(Value::String(self.scan_string()?));
                    slot = Slot::Filled;
                }
                (b'{', _) => {
                    items.push(self.scan_object()?);
                    slot = Slot::Filled;
                }
                (b'[', _) => {
                    self.bump();
                    items.push(Value::List(self.scan_list_body()?));
                    slot = Slot::Filled;
                }
                (_, Slot::Bare(_)) => self.bump(),
                (_, Slot::Open | Slot::Empty) => {
                    slot = Slot::Bare(self.pos);
                    self.bump();
                }
            }
        }
    }

    /// Any value inside an object.
    fn scan_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'"') => Ok(Value::String(self.scan_string()?)),
            Some(b'{') => self.scan_object(),
            Some(b'[') => {
                self.bump();
                Ok(Value::List(self.scan_list_body()?))
            }
            Some(_) => {
                let start = self.pos;
                while let Some(byte) = self.peek() {
                    if matches!(byte, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                        break;
                    }
                    self.bump();
                }
                Ok(self.flush((start, self.pos)))
            }
            None => Err(CodecError::payload(self.pos, "unterminated object")),
        }
    }

    /// A quoted string token, unescaped.
    fn scan_string(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut escaped = false;
        loop {
            let byte = self
                .peek()
                .ok_or_else(|| CodecError::payload(start, "unterminated string"))?;
            self.bump();
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => break,
                _ => {}
            }
        }
        serde_json::from_slice::<String>(&self.src[start..self.pos])
            .map_err(|err| CodecError::payload(start, format!("invalid string: {err}")))
    }

    /// An object; placeholder shapes come back as attachments.
    fn scan_object(&mut self) -> Result<Value> {
        let start = self.pos;
        self.bump();
        self.enter()?;
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.bump();
        } else {
            loop {
                self.skip_whitespace();
                if self.peek() != Some(b'"') {
                    return Err(CodecError::payload(self.pos, "expected object key"));
                }
                let key = self.scan_string()?;
                self.expect(b':', "':'")?;
                let value = self.scan_value()?;
                map.insert(key, value);

                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => self.bump(),
                    Some(b'}') => {
                        self.bump();
                        break;
                    }
                    Some(_) => return Err(CodecError::payload(self.pos, "expected ',' or '}'")),
                    None => return Err(CodecError::payload(start, "unterminated object")),
                }
            }
        }
        self.depth -= 1;

        let value = Value::from_map(map);
        if let Value::Attachment(attachment) = &value {
            if attachment.is_binary {
                self.placeholders += 1;
            }
        }
        Ok(value)
    }

    /// Interpret a bare token: JSON scalar literal if it is one, else a string.
    fn flush(&self, (start, end): (usize, usize)) -> Value {
        let token = self.src[start..end].trim_ascii();
        match serde_json::from_slice::<serde_json::Value>(token) {
            Ok(serde_json::Value::Number(n)) => Value::Number(n),
            Ok(serde_json::Value::Bool(b)) => Value::Bool(b),
            Ok(serde_json::Value::Null) => Value::Null,
            _ => Value::String(String::from_utf8_lossy(token).into_owned()),
        }
    }
}
