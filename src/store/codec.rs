//! Riddle payload encoding.
//!
//! The riddle list is stored as UTF-8 JSON bytes in a single unindexed field.
//! Inside the entity body that blob travels base64-encoded.

use crate::types::RiddlesPayload;
use crate::{Error, ErrorContext, Result};

pub fn encode_payload(payload: &RiddlesPayload) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(payload)?)
}

/// Fails with [`Error::Decode`] when the bytes no longer match the payload schema.
pub fn decode_payload(bytes: &[u8]) -> Result<RiddlesPayload> {
    serde_json::from_slice(bytes).map_err(|e| {
        Error::decode_with_context(
            format!("riddles payload is incompatible: {}", e),
            ErrorContext::new()
                .with_field_path("riddles_payload")
                .with_source("payload_codec"),
        )
    })
}

pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Riddle;

    #[test]
    fn test_decode_rejects_incompatible_bytes() {
        let err = decode_payload(b"riddles { question: \"Q\" }").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().contains("riddles_payload"));
    }

    #[test]
    fn test_payload_survives_storage_encoding() {
        let payload = RiddlesPayload::new(vec![Riddle::new("Q", "A").with_explanation("because")]);
        let bytes = encode_payload(&payload).unwrap();
        assert_eq!(decode_payload(&bytes).unwrap(), payload);
    }
}
