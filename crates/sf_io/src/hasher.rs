//! crates/sf_io/src/hasher.rs
//!
//! Deterministic hashing and ID builders.
//!
//! - Canonical JSON hashing: sorted object keys, array order preserved.
//! - Hex digests are **lowercase**.
//! - `RUN:<hex16>` ids derive from canonical run bytes only; no wall clock, so
//!   the same inputs and seed always name the same run.
//!
//! Use `sha256_canonical(..)` for JSON values/structs and `sha256_hex(..)` for
//! raw bytes.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::canonical_json::{to_canonical_bytes, to_canonical_json_bytes};

/// Length of the digest prefix used in run ids.
pub const RUN_ID_HEX_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("canonicalization error: {0}")]
    Canonical(String),

    #[error("invalid hex (expected lowercase 64-hex): {0}")]
    InvalidHex(String),
}

/// True iff `s` is a lowercase 64-char hex digest.
#[inline]
pub fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f'))
}

/// Validate a lowercase 64-hex string and shorten it to `n` chars.
pub fn short_hex(hex64: &str, n: usize) -> Result<String, HashError> {
    if !is_lower_hex_64(hex64) {
        return Err(HashError::InvalidHex(hex64.to_string()));
    }
    Ok(hex64[..n.min(64)].to_string())
}

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
    let bytes = to_canonical_bytes(value).map_err(|e| HashError::Canonical(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

/// SHA-256 over an already-parsed JSON value, canonicalized.
pub fn sha256_canonical_value(v: &Value) -> Result<String, HashError> {
    let bytes = to_canonical_json_bytes(v).map_err(|e| HashError::Canonical(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

/// `RUN:<hex16>` from a serializable run payload.
pub fn run_id_from_canonical<T: Serialize + ?Sized>(run_value: &T) -> Result<String, HashError> {
    let full = sha256_canonical(run_value)?;
    Ok(format!("RUN:{}", short_hex(&full, RUN_ID_HEX_LEN)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert!(is_lower_hex_64(&h));
        assert_eq!(short_hex(&h, 8).unwrap(), "ba7816bf");
        assert!(short_hex("ABC", 8).is_err());
    }

    #[test]
    fn canonical_hashing_ignores_key_order() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Row {
            seller_id: u64,
            id: u64,
        }
        let h1 = sha256_canonical(&Row { seller_id: 3, id: 10 }).unwrap();
        let h2 = sha256_canonical_value(&json!({"id": 10, "sellerId": 3})).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn run_id_is_stable_and_prefixed() {
        let payload = json!({"seed": 7, "counts": {"parity": 2}});
        let a = run_id_from_canonical(&payload).unwrap();
        let b = run_id_from_canonical(&json!({"counts": {"parity": 2}, "seed": 7})).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("RUN:"));
        assert_eq!(a.len(), 4 + RUN_ID_HEX_LEN);
        assert_ne!(a, run_id_from_canonical(&json!({"seed": 8})).unwrap());
    }
}
