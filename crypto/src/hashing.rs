//! Canonical hashing of JSON responses using SHA-256

use seqquorum_core::{Fingerprint, PayloadDecoder, QuorumError, QuorumResult};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

const SCALAR_TAG: u8 = b's';
const ARRAY_TAG: u8 = b'a';
const OBJECT_TAG: u8 = b'o';

fn finalize(hasher: Sha256) -> Fingerprint {
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Fingerprint::from_bytes(bytes)
}

/// Canonical text of a number.
///
/// Integral values print without a fractional part, so `1`, `1.0` and `1e0` agree.
pub fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => format!("{}", f),
        None => n.to_string(),
    }
}

fn hash_scalar(text: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update([SCALAR_TAG]);
    hasher.update(text.as_bytes());
    finalize(hasher)
}

/// Fingerprint a decoded JSON tree.
///
/// Object keys are sorted byte-wise before hashing; array elements keep their order.
pub fn fingerprint_value(value: &Value) -> Fingerprint {
    match value {
        Value::Null => hash_scalar("null"),
        Value::Bool(true) => hash_scalar("true"),
        Value::Bool(false) => hash_scalar("false"),
        Value::Number(n) => hash_scalar(&canonical_number(n)),
        // Display of a string value is its quoted, escaped JSON form
        Value::String(_) => hash_scalar(&value.to_string()),
        Value::Array(items) => {
            let mut hasher = Sha256::new();
            hasher.update([ARRAY_TAG]);
            for item in items {
                hasher.update(fingerprint_value(item).as_bytes());
            }
            finalize(hasher)
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            let mut hasher = Sha256::new();
            hasher.update([OBJECT_TAG]);
            for (key, child) in entries {
                hasher.update((key.len() as u64).to_le_bytes());
                hasher.update(key.as_bytes());
                hasher.update(fingerprint_value(child).as_bytes());
            }
            finalize(hasher)
        }
    }
}

/// Decoder for plain JSON payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl PayloadDecoder for JsonDecoder {
    fn decode(&self, payload: &[u8]) -> QuorumResult<Value> {
        serde_json::from_slice(payload).map_err(|e| QuorumError::Canonicalization(e.to_string()))
    }
}

/// Decode with `decoder`, then fingerprint
pub fn fingerprint_with(decoder: &dyn PayloadDecoder, payload: &[u8]) -> QuorumResult<Fingerprint> {
    let value = decoder.decode(payload)?;
    Ok(fingerprint_value(&value))
}

/// Fingerprint a raw JSON payload
pub fn fingerprint_json(payload: &[u8]) -> QuorumResult<Fingerprint> {
    fingerprint_with(&JsonDecoder, payload)
}
