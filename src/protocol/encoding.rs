//! Shared serialization helpers: canonical JSON, multihash, base64url

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Multihash code for SHA2-256
const SHA256_MULTIHASH_CODE: u8 = 0x12;

/// Canonical JSON: object keys sorted by code point, no insignificant whitespace
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// SHA-256 multihash (`0x12 0x20 || digest`)
pub fn sha256_multihash(data: &[u8]) -> Vec<u8> {
    let digest = Sha256::digest(data);
    let mut multihash = Vec::with_capacity(2 + digest.len());
    multihash.push(SHA256_MULTIHASH_CODE);
    multihash.push(digest.len() as u8);
    multihash.extend_from_slice(&digest);
    multihash
}

/// Base64url multihash of the canonical form of `value`
pub fn canonicalize_then_hash_then_encode(value: &Value) -> String {
    encode_base64url(&sha256_multihash(canonicalize(value).as_bytes()))
}

pub fn encode_base64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn decode_base64url(input: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(input).ok()
}

/// A CAS URI must be non-empty, alphanumeric and at most `max_length` long
pub fn is_valid_cas_uri(uri: &str, max_length: usize) -> bool {
    !uri.is_empty() && uri.len() <= max_length && uri.bytes().all(|b| b.is_ascii_alphanumeric())
}
