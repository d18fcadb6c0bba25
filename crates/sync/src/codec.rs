//! Transport encoding of document bodies: UTF-8 text carried as base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::SyncError;

pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode a transport payload.  The contents API wraps base64 at 60
/// columns, so embedded whitespace is dropped before decoding.
pub fn decode_content(encoded: &str) -> Result<String, SyncError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|err| SyncError::Decode(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| SyncError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wrapped_payload() {
        let encoded = encode_content("{\"meta\":{\"weekdays\":[\"ŚR\"]}}");
        let (head, tail) = encoded.split_at(10);
        let wrapped = format!("{head}\n{tail}\n");
        assert_eq!(
            decode_content(&wrapped).unwrap(),
            "{\"meta\":{\"weekdays\":[\"ŚR\"]}}"
        );
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(decode_content("%%%"), Err(SyncError::Decode(_))));
    }

    #[test]
    fn rejects_non_utf8() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0x00]);
        assert!(matches!(decode_content(&encoded), Err(SyncError::Decode(_))));
    }
}
