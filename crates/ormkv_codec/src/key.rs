//! Order-preserving key encoding.
//!
//! A key is the concatenation of its encoded values. Each value starts with
//! a one-byte kind tag followed by a self-delimiting body:
//!
//! | Kind | Tag | Body |
//! |---|---|---|
//! | Bool | `0x01` | `0x00` or `0x01` |
//! | Integer | `0x02` | 8 bytes big-endian, sign bit flipped |
//! | Unsigned | `0x03` | 8 bytes big-endian |
//! | Text | `0x04` | UTF-8 bytes, escaped, `0x00 0x00` terminated |
//! | Bytes | `0x05` | raw bytes, escaped, `0x00 0x00` terminated |
//!
//! Escaping replaces every `0x00` with `0x00 0xFF`, so the terminator sorts
//! below any continuation. Comparing two encoded keys bytewise gives the same
//! result as comparing the value lists.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

const TAG_BOOL: u8 = 0x01;
const TAG_INTEGER: u8 = 0x02;
const TAG_UNSIGNED: u8 = 0x03;
const TAG_TEXT: u8 = 0x04;
const TAG_BYTES: u8 = 0x05;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x00;

const SIGN_BIT: u64 = 1 << 63;

/// Encodes `values` into an order-preserving key.
#[must_use]
pub fn encode_key(values: &[Value]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 9);
    encode_key_into(&mut buf, values);
    buf
}

/// Appends the key encoding of `values` to `buf`.
pub fn encode_key_into(buf: &mut Vec<u8>, values: &[Value]) {
    for value in values {
        encode_value(buf, value);
    }
}

#[allow(clippy::cast_sign_loss)]
fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(u8::from(*b));
        }
        Value::Integer(n) => {
            buf.push(TAG_INTEGER);
            buf.extend_from_slice(&((*n as u64) ^ SIGN_BIT).to_be_bytes());
        }
        Value::Unsigned(n) => {
            buf.push(TAG_UNSIGNED);
            buf.extend_from_slice(&n.to_be_bytes());
        }
        Value::Text(s) => {
            buf.push(TAG_TEXT);
            encode_escaped(buf, s.as_bytes());
        }
        Value::Bytes(b) => {
            buf.push(TAG_BYTES);
            encode_escaped(buf, b);
        }
    }
}

fn encode_escaped(buf: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        buf.push(byte);
        if byte == ESCAPE {
            buf.push(ESCAPED_ZERO);
        }
    }
    buf.push(ESCAPE);
    buf.push(TERMINATOR);
}

/// Decodes every value in `key`.
///
/// # Errors
///
/// Returns an error if the key is truncated, carries an unknown tag, or
/// contains invalid UTF-8 in a text value.
pub fn decode_key(key: &[u8]) -> CodecResult<Vec<Value>> {
    let mut decoder = KeyDecoder::new(key);
    let mut values = Vec::new();
    while let Some(value) = decoder.next_value()? {
        values.push(value);
    }
    Ok(values)
}

/// Incremental decoder over an encoded key.
#[derive(Debug, Clone)]
pub struct KeyDecoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> KeyDecoder<'a> {
    /// Creates a decoder positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the bytes not yet decoded.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Decodes the next value, or returns `None` at the end of input.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated input, an unknown tag or invalid UTF-8.
    pub fn next_value(&mut self) -> CodecResult<Option<Value>> {
        let Some(&tag) = self.input.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;

        let value = match tag {
            TAG_BOOL => match self.take(1)?[0] {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(CodecError::invalid_key(format!(
                        "invalid bool byte {other:#04x}"
                    )));
                }
            },
            TAG_INTEGER => {
                #[allow(clippy::cast_possible_wrap)]
                let n = (self.take_u64()? ^ SIGN_BIT) as i64;
                Value::Integer(n)
            }
            TAG_UNSIGNED => Value::Unsigned(self.take_u64()?),
            TAG_TEXT => {
                let bytes = self.take_escaped()?;
                Value::Text(String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?)
            }
            TAG_BYTES => Value::Bytes(self.take_escaped()?),
            other => {
                return Err(CodecError::invalid_key(format!(
                    "unknown value tag {other:#04x} at offset {}",
                    self.pos - 1
                )));
            }
        };
        Ok(Some(value))
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or(CodecError::UnexpectedEof)?;
        let slice = &self.input[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_u64(&mut self) -> CodecResult<u64> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(arr))
    }

    fn take_escaped(&mut self) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let byte = self.take(1)?[0];
            if byte != ESCAPE {
                out.push(byte);
                continue;
            }
            match self.take(1)?[0] {
                TERMINATOR => return Ok(out),
                ESCAPED_ZERO => out.push(0),
                other => {
                    return Err(CodecError::invalid_key(format!(
                        "invalid escape byte {other:#04x}"
                    )));
                }
            }
        }
    }
}
