//! sf_pipeline — orchestration surface for the storefront engine.
//!
//! Stages:
//! - [`storefront`]: dedupe → rank → top-K / brand filter view
//! - [`catalog`]: allocate products → diff → run record
//! - [`stores`]: collaborator traits (list sellers/products, update seller id)
//!   plus in-memory and JSON-snapshot implementations
//!
//! Algorithms stay in `sf_algo`; JSON, manifests and hashing stay in `sf_io`.
//! This crate adds logging, error mapping and the run record.

#![forbid(unsafe_code)]

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod run_record;
pub mod storefront;
pub mod stores;

pub use catalog::{run_catalog_allocation, run_store_allocation, CatalogRun};
pub use run_record::RunRecord;
pub use storefront::{storefront_view, StorefrontView};
pub use stores::{
    apply_changes, ApplyReport, JsonSnapshotStore, MemoryStore, ProductFilter, ProductStore,
    ProductUpdater, SellerStore, StoreError,
};

use sf_io::loader::{self, LoadedContext};

/// Engine identity recorded in every run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
}

impl EngineMeta {
    /// Identity of this build; `SF_ENGINE_*` at compile time override the defaults.
    pub fn current() -> Self {
        EngineMeta {
            vendor: option_env!("SF_ENGINE_VENDOR").unwrap_or("storefront").to_string(),
            name: option_env!("SF_ENGINE_NAME").unwrap_or("sf_engine").to_string(),
            version: option_env!("SF_ENGINE_VERSION")
                .unwrap_or(env!("CARGO_PKG_VERSION"))
                .to_string(),
        }
    }
}

impl Default for EngineMeta {
    fn default() -> Self {
        Self::current()
    }
}

/// Loaded inputs plus engine identity.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub loaded: LoadedContext,
    pub engine_meta: EngineMeta,
}

impl PipelineCtx {
    pub fn from_manifest(path: &Path) -> Result<Self, PipelineError> {
        let loaded = loader::load_all_from_manifest(path)?;
        Ok(Self { loaded, engine_meta: EngineMeta::current() })
    }

    pub fn from_paths(
        sellers: &Path,
        products: &Path,
        params: Option<&Path>,
    ) -> Result<Self, PipelineError> {
        let loaded = loader::load_all_from_paths(sellers, products, params)?;
        Ok(Self { loaded, engine_meta: EngineMeta::current() })
    }
}

/// Single error surface for orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Filesystem, JSON syntax, hashing.
    #[error("io: {0}")]
    Io(String),
    /// Inputs that parsed but are unusable (domains, duplicates, manifest policy).
    #[error("validate: {0}")]
    Validate(String),
    #[error("allocate: {0}")]
    Allocate(#[from] sf_algo::AllocError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl From<sf_io::IoError> for PipelineError {
    fn from(e: sf_io::IoError) -> Self {
        use sf_io::IoError as E;
        match e {
            E::Path(m) => PipelineError::Io(format!("path: {m}")),
            E::Hash(m) => PipelineError::Io(format!("hash: {m}")),
            E::Json { pointer, msg } => PipelineError::Validate(format!("json {pointer}: {msg}")),
            E::Manifest(m) => PipelineError::Validate(format!("manifest: {m}")),
            E::Invalid(m) => PipelineError::Validate(m),
        }
    }
}

impl From<sf_core::CoreError> for PipelineError {
    fn from(e: sf_core::CoreError) -> Self {
        PipelineError::Validate(e.to_string())
    }
}

impl From<sf_io::hasher::HashError> for PipelineError {
    fn from(e: sf_io::hasher::HashError) -> Self {
        PipelineError::Io(format!("hash: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_stable_buckets() {
        let e: PipelineError = sf_io::IoError::Invalid("duplicate product id 1".into()).into();
        assert!(matches!(e, PipelineError::Validate(_)));
        let e: PipelineError = sf_io::IoError::Path("gone".into()).into();
        assert!(matches!(e, PipelineError::Io(_)));
        let e: PipelineError = sf_algo::AllocError::ZeroPartitions.into();
        assert_eq!(e.to_string(), "allocate: partition count must be at least 1");
    }

    #[test]
    fn engine_meta_carries_crate_version() {
        let m = EngineMeta::current();
        assert!(!m.version.is_empty());
        assert_eq!(m, EngineMeta::default());
    }
}
