//! sf_io — local snapshot I/O for the storefront engine.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Canonical JSON (sorted keys, compact) and atomic writes.
//! - SHA-256 digests over canonical bytes; run ids.
//! - Manifest resolution (offline paths only) and typed snapshot loading.
//!
//! No network I/O anywhere in this crate.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod manifest;

/// Unified error for sf_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON errors with a JSON Pointer to the offending element.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Manifest shape, offline policy, or digest verification failure.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Well-formed JSON that breaks a snapshot invariant (e.g. duplicate ids).
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps no pointer; callers that know the element enrich it.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

impl From<hasher::HashError> for IoError {
    fn from(e: hasher::HashError) -> Self {
        IoError::Hash(e.to_string())
    }
}

impl From<manifest::ManifestError> for IoError {
    fn from(e: manifest::ManifestError) -> Self {
        IoError::Manifest(e.to_string())
    }
}

impl From<sf_core::CoreError> for IoError {
    fn from(e: sf_core::CoreError) -> Self {
        IoError::Invalid(e.to_string())
    }
}

/// Returns true if `s` looks like a URL (any `<scheme>://`, or an
/// `http:`/`https:`/`file:` prefix). Case-insensitive.
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    let t = s.trim().to_ascii_lowercase();
    t.contains("://") || t.starts_with("http:") || t.starts_with("https:") || t.starts_with("file:")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_bytes, write_canonical};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::loader::{load_all_from_manifest, load_all_from_paths, LoadedContext};
}
