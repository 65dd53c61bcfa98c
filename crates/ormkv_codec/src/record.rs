//! CBOR encoding of record bodies.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a record body to CBOR.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn encode_record<T: Serialize + ?Sized>(record: &T) -> CodecResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(record, &mut bytes)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a record body from CBOR.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid encoding of `T`.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u64,
        title: String,
        tags: Vec<String>,
    }

    #[test]
    fn record_roundtrip() {
        let note = Note {
            id: 7,
            title: "groceries".to_string(),
            tags: vec!["home".to_string()],
        };
        let bytes = encode_record(&note).unwrap();
        let decoded: Note = decode_record(&bytes).unwrap();
        assert_eq!(decoded, note);
    }

    #[test]
    fn deterministic_encoding() {
        let note = Note {
            id: 1,
            title: "same".to_string(),
            tags: Vec::new(),
        };
        assert_eq!(encode_record(&note).unwrap(), encode_record(&note.clone()).unwrap());
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result: CodecResult<Note> = decode_record(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }
}
