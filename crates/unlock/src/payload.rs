//! Key payload carried inside user-key and vault-key tokens:
//! `{"key": "<standard base64>"}`.

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    serde_json::{Map, Value},
    zeroize::Zeroizing,
};

use crate::error::{Result, UnlockError};

const KEY_FIELD: &str = "key";

/// Serialize raw key bytes into a payload.
pub fn encode(key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let encoded = Zeroizing::new(STANDARD.encode(key));
    let mut object = Map::new();
    object.insert(KEY_FIELD.to_string(), Value::String(encoded.to_string()));
    let value = Value::Object(object);
    let json = serde_json::to_vec(&value)
        .map_err(|e| UnlockError::Encryption(format!("payload serialization: {e}")))?;
    zeroize_value(value);
    Ok(Zeroizing::new(json))
}

/// Extract raw key bytes from a decrypted payload.
pub fn decode(payload: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| UnlockError::payload(format!("not JSON: {e}")))?;
    let result = extract(&value);
    zeroize_value(value);
    result
}

fn extract(value: &Value) -> Result<Zeroizing<Vec<u8>>> {
    let object = value
        .as_object()
        .ok_or_else(|| UnlockError::payload("payload is not a JSON object"))?;
    let field = object
        .get(KEY_FIELD)
        .ok_or_else(|| UnlockError::payload(format!("missing \"{KEY_FIELD}\" field")))?;
    let encoded = field
        .as_str()
        .ok_or_else(|| UnlockError::payload(format!("\"{KEY_FIELD}\" is not a string")))?;
    STANDARD
        .decode(encoded)
        .map(Zeroizing::new)
        .map_err(|e| UnlockError::payload(format!("\"{KEY_FIELD}\" is not base64: {e}")))
}

fn zeroize_value(value: Value) {
    if let Value::Object(object) = value {
        for (_, v) in object {
            if let Value::String(s) = v {
                drop(Zeroizing::new(s));
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn round_trip() {
        let json = encode(&[0x55; 64]).unwrap();
        let key = decode(&json).unwrap();
        assert_eq!(key.as_slice(), &[0x55; 64]);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let json = br#"{"key":"AQID","kid":"vault-1"}"#;
        assert_eq!(decode(json).unwrap().as_slice(), &[1, 2, 3]);
    }

    #[rstest]
    #[case::not_json(b"\x00\x01".as_slice())]
    #[case::array(br#"["AQID"]"#.as_slice())]
    #[case::string(br#""AQID""#.as_slice())]
    #[case::missing_field(br#"{"k":"AQID"}"#.as_slice())]
    #[case::number_field(br#"{"key":42}"#.as_slice())]
    #[case::null_field(br#"{"key":null}"#.as_slice())]
    #[case::not_base64(br#"{"key":"**not base64**"}"#.as_slice())]
    fn invalid_payloads_are_malformed(#[case] payload: &[u8]) {
        let err = decode(payload).unwrap_err();
        assert!(matches!(err, UnlockError::MalformedPayload(_)), "{err:?}");
    }
}
