// crates/sf_io/src/manifest.rs
//
// Run manifest: where the snapshots live and, optionally, what they must hash to.
//
// • Inputs are paths only: sellers, products, optional params.
// • Offline-only: reject any path with a scheme ("://", "http:", "https:").
// • Relative paths resolve against the manifest's own directory.
// • Digests (if provided) must be 64-lower-hex, only for present inputs, and are
//   verified over canonical JSON bytes of the file.
// • Required inputs must exist and be files (not dirs).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canonical_json::to_canonical_json_bytes;
use crate::hasher::{is_lower_hex_64, sha256_hex};
use crate::looks_like_url_strict;

const MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

/// External manifest accepted by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    pub sellers_path: String,
    pub products_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_sha256: Option<InputDigests>,
}

/// Expected sha256 (canonical JSON) per input, keyed like the path fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InputDigests {
    #[serde(default)]
    pub sellers_path: Option<String>,
    #[serde(default)]
    pub products_path: Option<String>,
    #[serde(default)]
    pub params_path: Option<String>,
}

/// Paths resolved against the manifest's directory.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub sellers_path: PathBuf,
    pub products_path: PathBuf,
    pub params_path: Option<PathBuf>,
    pub digests: Option<InputDigests>,
}

#[derive(Debug)]
pub enum ManifestError {
    Empty(&'static str),
    UrlPath(&'static str, String),
    Io(&'static str, String),
    NotAFile(&'static str, String),
    /// Bad hex format (not a mismatch).
    DigestShape(&'static str, String),
    DigestMismatch(&'static str, String),
    /// Digest provided for an input that is not present in the manifest.
    DigestForMissing(&'static str),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ManifestError::*;
        match self {
            Empty(k) => write!(f, "field must not be empty: {k}"),
            UrlPath(k, v) => write!(f, "path must be offline (no scheme) for {k}: {v}"),
            Io(k, v) => write!(f, "cannot access {k}: {v}"),
            NotAFile(k, v) => write!(f, "path is not a file for {k}: {v}"),
            DigestShape(k, v) => write!(f, "invalid sha256 format for {k}: {v}"),
            DigestMismatch(k, v) => write!(f, "sha256 mismatch for {k}: {v}"),
            DigestForMissing(k) => write!(f, "digest supplied for missing input: {k}"),
        }
    }
}
impl std::error::Error for ManifestError {}

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn check_path_field(label: &'static str, value: &str) -> Result<(), ManifestError> {
    if value.trim().is_empty() {
        return Err(ManifestError::Empty(label));
    }
    if looks_like_url_strict(value) {
        return Err(ManifestError::UrlPath(label, value.to_string()));
    }
    Ok(())
}

fn check_digest_shape(label: &'static str, hex: &Option<String>) -> Result<(), ManifestError> {
    match hex {
        Some(h) if !is_lower_hex_64(h) => Err(ManifestError::DigestShape(label, h.clone())),
        _ => Ok(()),
    }
}

/// Validate manifest shape and offline path policy. No I/O.
pub fn validate_manifest(man: &Manifest) -> Result<(), ManifestError> {
    check_path_field("sellersPath", &man.sellers_path)?;
    check_path_field("productsPath", &man.products_path)?;
    if let Some(p) = &man.params_path {
        check_path_field("paramsPath", p)?;
    }

    if let Some(d) = &man.inputs_sha256 {
        check_digest_shape("sellersPath", &d.sellers_path)?;
        check_digest_shape("productsPath", &d.products_path)?;
        if d.params_path.is_some() && man.params_path.is_none() {
            return Err(ManifestError::DigestForMissing("paramsPath"));
        }
        check_digest_shape("paramsPath", &d.params_path)?;
    }
    Ok(())
}

/// Resolve manifest paths under `base_dir` and existence-check them.
pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, ManifestError> {
    let sellers = join_under(base_dir, man.sellers_path.trim());
    let products = join_under(base_dir, man.products_path.trim());
    let params = man.params_path.as_deref().map(|s| join_under(base_dir, s.trim()));

    must_exist_file("sellersPath", &sellers)?;
    must_exist_file("productsPath", &products)?;
    if let Some(p) = &params {
        must_exist_file("paramsPath", p)?;
    }

    Ok(ResolvedManifest {
        sellers_path: sellers,
        products_path: products,
        params_path: params,
        digests: man.inputs_sha256.clone(),
    })
}

fn must_exist_file(label: &'static str, p: &Path) -> Result<(), ManifestError> {
    let md = fs::metadata(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(ManifestError::NotAFile(label, p.display().to_string()));
    }
    Ok(())
}

/// SHA-256 of the canonical JSON form of the file at `p`.
pub fn canonical_file_digest(label: &'static str, p: &Path) -> Result<String, ManifestError> {
    let buf = fs::read(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    let v: serde_json::Value = serde_json::from_slice(&buf)
        .map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    let canon = to_canonical_json_bytes(&v).map_err(|e| ManifestError::Io(label, e.to_string()))?;
    Ok(sha256_hex(&canon))
}

/// Verify provided digests. `Ok(())` when none were provided.
pub fn verify_digests(resolved: &ResolvedManifest) -> Result<(), ManifestError> {
    let Some(d) = &resolved.digests else {
        return Ok(());
    };

    fn check_one(label: &'static str, path: &Path, expect_hex: &str) -> Result<(), ManifestError> {
        let got = canonical_file_digest(label, path)?;
        if got != expect_hex {
            return Err(ManifestError::DigestMismatch(label, format!("expected={expect_hex} got={got}")));
        }
        Ok(())
    }

    if let Some(hex) = &d.sellers_path {
        check_one("sellersPath", &resolved.sellers_path, hex)?;
    }
    if let Some(hex) = &d.products_path {
        check_one("productsPath", &resolved.products_path, hex)?;
    }
    match (&resolved.params_path, &d.params_path) {
        (Some(p), Some(hex)) => check_one("paramsPath", p, hex)?,
        (None, Some(_)) => return Err(ManifestError::DigestForMissing("paramsPath")),
        _ => {}
    }
    Ok(())
}

/// Load a manifest from `manifest_path`, validate it and resolve it under its
/// directory. Digests are not verified here.
pub fn load_and_resolve_manifest(manifest_path: &Path) -> Result<ResolvedManifest, ManifestError> {
    let f = fs::File::open(manifest_path)
        .map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", manifest_path.display())))?;
    let mut buf = Vec::new();
    f.take(MAX_MANIFEST_BYTES)
        .read_to_end(&mut buf)
        .map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", manifest_path.display())))?;

    let man: Manifest = serde_json::from_slice(&buf)
        .map_err(|e| ManifestError::Io("manifest", format!("{} ({e})", manifest_path.display())))?;
    validate_manifest(&man)?;

    let base = manifest_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    resolve_paths(&base, &man)
}

/// Load, validate, resolve, then verify digests.
pub fn load_verify_manifest(manifest_path: &Path) -> Result<ResolvedManifest, ManifestError> {
    let resolved = load_and_resolve_manifest(manifest_path)?;
    verify_digests(&resolved)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(sellers: &str, products: &str) -> Manifest {
        Manifest {
            sellers_path: sellers.into(),
            products_path: products.into(),
            params_path: None,
            inputs_sha256: None,
        }
    }

    #[test]
    fn rejects_urls_and_empty_paths() {
        assert!(matches!(
            validate_manifest(&manifest("https://x/s.json", "p.json")),
            Err(ManifestError::UrlPath("sellersPath", _))
        ));
        assert!(matches!(
            validate_manifest(&manifest("s.json", "  ")),
            Err(ManifestError::Empty("productsPath"))
        ));
        assert!(validate_manifest(&manifest("s.json", "p.json")).is_ok());
    }

    #[test]
    fn digest_rules() {
        let mut m = manifest("s.json", "p.json");
        m.inputs_sha256 = Some(InputDigests { sellers_path: Some("ABC".into()), ..Default::default() });
        assert!(matches!(validate_manifest(&m), Err(ManifestError::DigestShape(..))));

        m.inputs_sha256 = Some(InputDigests { params_path: Some("a".repeat(64)), ..Default::default() });
        assert!(matches!(validate_manifest(&m), Err(ManifestError::DigestForMissing("paramsPath"))));
    }

    #[test]
    fn unknown_fields_rejected() {
        let raw = r#"{"sellersPath":"s.json","productsPath":"p.json","ordersPath":"o.json"}"#;
        assert!(serde_json::from_str::<Manifest>(raw).is_err());
    }

    #[test]
    fn resolves_relative_to_manifest_and_verifies_digests() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("sellers.json"), "[ ]").unwrap();
        fs::write(data.join("products.json"), r#"[{"id":1, "category":"a"}]"#).unwrap();

        let want = sha256_hex(br#"[{"category":"a","id":1}]"#);
        let man = format!(
            r#"{{"sellersPath":"data/sellers.json","productsPath":"data/products.json",
                "inputsSha256":{{"productsPath":"{want}"}}}}"#
        );
        let mpath = dir.path().join("manifest.json");
        fs::write(&mpath, man).unwrap();

        let r = load_verify_manifest(&mpath).unwrap();
        assert_eq!(r.sellers_path, dir.path().join("data/sellers.json"));
        assert!(r.params_path.is_none());

        fs::write(data.join("products.json"), r#"[{"id":2,"category":"a"}]"#).unwrap();
        assert!(matches!(load_verify_manifest(&mpath), Err(ManifestError::DigestMismatch(..))));
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolve_paths(dir.path(), &manifest("nope.json", "p.json"));
        assert!(matches!(r, Err(ManifestError::Io("sellersPath", _))));
    }
}
