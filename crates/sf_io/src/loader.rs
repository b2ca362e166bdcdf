//! Loader: read local JSON snapshots (manifest → sellers → products → params),
//! decode them into typed records, check id uniqueness, and return a
//! `LoadedContext` for the pipeline. No network I/O.
//!
//! Snapshot files are top-level JSON arrays of records. Element decode errors
//! carry a JSON Pointer to the failing record (e.g. `/3`).
//! Input digests are SHA-256 over the canonical form of each file.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sf_core::{EngineParams, Product, Seller};

use crate::hasher::sha256_canonical_value;
use crate::manifest;
use crate::IoError;

/// Upper bound on a single snapshot file.
pub const MAX_SNAPSHOT_BYTES: u64 = 256 * 1024 * 1024;

/// sha256 of canonical input bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDigests {
    pub sellers_sha256: String,
    pub products_sha256: String,
    pub params_sha256: Option<String>,
}

/// Where the inputs came from, for run records and log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub sellers: PathBuf,
    pub products: PathBuf,
    pub params: Option<PathBuf>,
}

/// Loaded and validated snapshots for one run.
#[derive(Debug, Clone)]
pub struct LoadedContext {
    pub sellers: Vec<Seller>,
    pub products: Vec<Product>,
    pub params: EngineParams,
    pub digests: InputDigests,
    pub paths: InputPaths,
}

/* ------------------------------ Orchestration ------------------------------ */

/// Load everything from a manifest file: resolve, verify digests, then load.
pub fn load_all_from_manifest(path: &Path) -> Result<LoadedContext, IoError> {
    let resolved = manifest::load_verify_manifest(path)?;
    load_all_from_paths(
        &resolved.sellers_path,
        &resolved.products_path,
        resolved.params_path.as_deref(),
    )
}

/// Load from explicit paths. Absent params means `EngineParams::default()`.
pub fn load_all_from_paths(
    sellers_path: &Path,
    products_path: &Path,
    params_path: Option<&Path>,
) -> Result<LoadedContext, IoError> {
    let (sellers, sellers_sha256) = load_sellers_with_digest(sellers_path)?;
    let (products, products_sha256) = load_products_with_digest(products_path)?;
    let (params, params_sha256) = match params_path {
        Some(p) => {
            let (params, digest) = load_params_with_digest(p)?;
            (params, Some(digest))
        }
        None => (EngineParams::default(), None),
    };

    Ok(LoadedContext {
        sellers,
        products,
        params,
        digests: InputDigests { sellers_sha256, products_sha256, params_sha256 },
        paths: InputPaths {
            sellers: sellers_path.to_path_buf(),
            products: products_path.to_path_buf(),
            params: params_path.map(Path::to_path_buf),
        },
    })
}

/* ----------------------------- Targeted loaders ----------------------------- */

pub fn load_sellers(path: &Path) -> Result<Vec<Seller>, IoError> {
    load_sellers_with_digest(path).map(|(xs, _)| xs)
}

pub fn load_products(path: &Path) -> Result<Vec<Product>, IoError> {
    load_products_with_digest(path).map(|(xs, _)| xs)
}

/// Products plus the raw JSON records they decode from, index-aligned.
/// Fields the engine does not model survive only in the raw records.
pub fn load_product_records(path: &Path) -> Result<(Vec<Product>, Vec<Value>), IoError> {
    let records = match read_json_value_with_limits(path)? {
        Value::Array(items) => items,
        _ => return Err(not_an_array("products")),
    };
    let products: Vec<Product> = decode_items(&records, "products")?;
    check_unique("product", products.iter().map(|p| p.id.get()))?;
    Ok((products, records))
}

pub fn load_params(path: &Path) -> Result<EngineParams, IoError> {
    load_params_with_digest(path).map(|(p, _)| p)
}

fn load_sellers_with_digest(path: &Path) -> Result<(Vec<Seller>, String), IoError> {
    let v = read_json_value_with_limits(path)?;
    let digest = sha256_canonical_value(&v)?;
    let sellers: Vec<Seller> = decode_array(v, "sellers")?;
    check_unique("seller", sellers.iter().map(|s| s.id.get()))?;
    Ok((sellers, digest))
}

fn load_products_with_digest(path: &Path) -> Result<(Vec<Product>, String), IoError> {
    let v = read_json_value_with_limits(path)?;
    let digest = sha256_canonical_value(&v)?;
    let products: Vec<Product> = decode_array(v, "products")?;
    check_unique("product", products.iter().map(|p| p.id.get()))?;
    Ok((products, digest))
}

fn load_params_with_digest(path: &Path) -> Result<(EngineParams, String), IoError> {
    let v = read_json_value_with_limits(path)?;
    let digest = sha256_canonical_value(&v)?;
    let params: EngineParams = serde_json::from_value(v).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("params: {e}"),
    })?;
    params.validate_domains()?;
    Ok((params, digest))
}

/* --------------------------------- Helpers --------------------------------- */

/// Read and parse a JSON file, refusing anything above `MAX_SNAPSHOT_BYTES`.
pub fn read_json_value_with_limits(path: &Path) -> Result<Value, IoError> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let mut buf = Vec::new();
    f.take(MAX_SNAPSHOT_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    if buf.len() as u64 > MAX_SNAPSHOT_BYTES {
        return Err(IoError::Invalid(format!(
            "{} exceeds {MAX_SNAPSHOT_BYTES} bytes",
            path.display()
        )));
    }
    serde_json::from_slice(&buf).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", path.display()),
    })
}

/// Decode a top-level array element by element so errors point at the record.
fn decode_array<T: DeserializeOwned>(v: Value, what: &str) -> Result<Vec<T>, IoError> {
    match v {
        Value::Array(items) => decode_items(&items, what),
        _ => Err(not_an_array(what)),
    }
}

fn decode_items<T: DeserializeOwned>(items: &[Value], what: &str) -> Result<Vec<T>, IoError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            T::deserialize(item).map_err(|e| IoError::Json {
                pointer: format!("/{i}"),
                msg: format!("{what}: {e}"),
            })
        })
        .collect()
}

fn not_an_array(what: &str) -> IoError {
    IoError::Json {
        pointer: "/".into(),
        msg: format!("{what}: expected a JSON array"),
    }
}

fn check_unique(kind: &str, ids: impl Iterator<Item = u64>) -> Result<(), IoError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(IoError::Invalid(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}
