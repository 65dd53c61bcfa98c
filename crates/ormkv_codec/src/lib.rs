//! # ormkv Codec
//!
//! Encodings used by ormkv.
//!
//! - **Keys**: a list of typed [`Value`]s is encoded so that bytewise
//!   comparison of the encodings matches comparison of the values. Index
//!   entries are stored under such keys, which makes point lookups, prefix
//!   scans and range scans plain byte-range operations on the backend.
//! - **Records**: whole record bodies are stored as CBOR via `serde`.
//!
//! ## Usage
//!
//! ```
//! use ormkv_codec::{decode_key, encode_key, Value};
//!
//! let key = encode_key(&[Value::from("smith"), Value::Unsigned(42)]);
//! let values = decode_key(&key).unwrap();
//! assert_eq!(values, vec![Value::from("smith"), Value::Unsigned(42)]);
//!
//! assert!(encode_key(&[Value::Integer(-5)]) < encode_key(&[Value::Integer(3)]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod key;
mod record;
mod value;

pub use error::{CodecError, CodecResult};
pub use key::{decode_key, encode_key, encode_key_into, KeyDecoder};
pub use record::{decode_record, encode_record};
pub use value::{Value, ValueKind};
