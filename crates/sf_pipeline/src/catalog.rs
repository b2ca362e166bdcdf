//! Catalog allocation pass: snapshot → allocate → diff → run record.
//!
//! Contract:
//! - Params are domain-checked before anything runs.
//! - `partitions == 1` draws from `SeededRng::from_seed_u64(seed)`; more
//!   partitions go through `allocate_partitioned` (one sub-stream per chunk).
//! - Inputs are never mutated; the caller decides whether to push `changes`
//!   to a store (see [`run_store_allocation`]).

use serde::Serialize;
use sf_algo::allocation::{allocate, allocate_partitioned, changes, AllocationOutcome, SellerChange};
use sf_core::{EngineParams, OwnerId, Product, ProductId, SeededRng, Seller};

use crate::run_record::{build_run_record, RunFacts, RunInputs, RunRecord};
use crate::stores::{apply_changes, ApplyReport, ProductStore, ProductUpdater, SellerStore};
use crate::{EngineMeta, PipelineCtx, PipelineError};

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRun {
    pub outcome: AllocationOutcome,
    pub changes: Vec<SellerChange>,
    pub run_record: RunRecord,
}

/// Wire shape of one change (`changes.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRow {
    pub product_id: ProductId,
    pub seller_id: OwnerId,
}

impl From<&SellerChange> for ChangeRow {
    fn from(c: &SellerChange) -> Self {
        ChangeRow { product_id: c.product_id, seller_id: c.seller_id }
    }
}

impl CatalogRun {
    pub fn change_rows(&self) -> Vec<ChangeRow> {
        self.changes.iter().map(ChangeRow::from).collect()
    }
}

/// Allocate the loaded catalog.
pub fn run_catalog_allocation(ctx: &PipelineCtx) -> Result<CatalogRun, PipelineError> {
    let loaded = &ctx.loaded;
    tracing::debug!(
        sellers = %loaded.paths.sellers.display(),
        products = %loaded.paths.products.display(),
        "catalog inputs"
    );
    allocate_snapshot(
        &loaded.sellers,
        &loaded.products,
        &loaded.params,
        RunInputs::of_snapshot(&loaded.sellers, &loaded.products, loaded.digests.params_sha256.clone())?,
        &ctx.engine_meta,
    )
}

/// Read both snapshots from `store`, allocate, and push every change back
/// through `update_seller_id`. Failed updates are reported, not fatal.
pub fn run_store_allocation<S>(
    store: &mut S,
    params: &EngineParams,
    engine: &EngineMeta,
) -> Result<(CatalogRun, ApplyReport), PipelineError>
where
    S: SellerStore + ProductStore + ProductUpdater + ?Sized,
{
    let sellers = store.list_sellers()?;
    let products = store.list_products(None)?;
    let inputs = RunInputs::of_snapshot(&sellers, &products, None)?;

    let run = allocate_snapshot(&sellers, &products, params, inputs, engine)?;
    let report = apply_changes(store, &run.changes);
    if !report.is_complete() {
        tracing::warn!(
            failed = report.failed.len(),
            applied = report.applied.len(),
            "some seller updates were not applied"
        );
    }
    Ok((run, report))
}

fn allocate_snapshot(
    sellers: &[Seller],
    products: &[Product],
    params: &EngineParams,
    inputs: RunInputs,
    engine: &EngineMeta,
) -> Result<CatalogRun, PipelineError> {
    params.validate_domains()?;

    let seed = params.seed_or_default();
    tracing::info!(
        products = products.len(),
        sellers = sellers.len(),
        seed,
        partitions = params.partitions,
        "catalog allocation start"
    );
    if !sellers.iter().any(|s| s.owner_id == params.default_owner_id) {
        tracing::warn!(
            default_owner_id = %params.default_owner_id,
            "default owner is not in the seller snapshot"
        );
    }

    let (outcome, words_consumed) = if params.partitions == 1 {
        let mut rng = SeededRng::from_seed_u64(seed);
        let out = allocate(products, sellers, params.default_owner_id, params.reserved_sellers, &mut rng)?;
        (out, rng.words_consumed())
    } else {
        let part = allocate_partitioned(
            products,
            sellers,
            params.default_owner_id,
            params.reserved_sellers,
            seed,
            params.partitions,
        )?;
        (part.outcome, part.words_consumed)
    };

    let changed = changes(products, &outcome.products);
    let rows: Vec<ChangeRow> = changed.iter().map(ChangeRow::from).collect();

    let run_record = build_run_record(
        RunFacts { engine, params, seed, words_consumed, inputs },
        &outcome,
        &rows,
        changed.len(),
    )?;

    tracing::debug!(
        parity = run_record.counts.parity,
        affinity = run_record.counts.affinity,
        fallback = run_record.counts.fallback,
        words = run_record.rng_words_consumed,
        "allocation rules applied"
    );
    tracing::info!(run_id = %run_record.id, changed = changed.len(), "catalog allocation done");

    Ok(CatalogRun { outcome, changes: changed, run_record })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use sf_core::{Category, ReservedSellers, SellerId, ShopType};

    fn seller(id: u64, category: Option<&str>) -> Seller {
        let s = Seller::new(SellerId::new(id).unwrap(), OwnerId::new(id).unwrap(), format!("s{id}"), ShopType::Brand);
        match category {
            Some(c) => s.with_main_category(Category::new(c).unwrap()),
            None => s,
        }
    }

    fn product(id: u64, category: &str) -> Product {
        Product::new(ProductId::new(id).unwrap(), Category::new(category).ok())
    }

    fn reference_store() -> MemoryStore {
        MemoryStore::new(
            vec![seller(1, None), seller(2, None), seller(3, Some("ao-thun"))],
            vec![
                product(10, "ao-thun").with_seller(OwnerId::new(2).unwrap()),
                product(11, "quan-jean"),
                product(12, "ao-thun").with_seller(OwnerId::new(1).unwrap()),
            ],
        )
    }

    #[test]
    fn store_allocation_applies_changes() {
        let mut store = reference_store();
        let (run, report) =
            run_store_allocation(&mut store, &EngineParams::default(), &EngineMeta::current()).unwrap();

        let owners: Vec<u64> = run.outcome.products.iter().map(|p| p.seller_id.unwrap().get()).collect();
        assert_eq!(owners, vec![1, 3, 1]);
        // Product 12 already belonged to owner 1.
        let changed: Vec<u64> = run.changes.iter().map(|c| c.product_id.get()).collect();
        assert_eq!(changed, vec![10, 11]);
        assert!(report.is_complete());
        assert_eq!(run.run_record.counts.changed, 2);

        let stored: Vec<u64> = store.products().iter().map(|p| p.seller_id.unwrap().get()).collect();
        assert_eq!(stored, vec![1, 3, 1]);
    }

    #[test]
    fn invalid_params_stop_before_allocation() {
        let mut store = reference_store();
        let params = EngineParams { partitions: 0, ..EngineParams::default() };
        let err = run_store_allocation(&mut store, &params, &EngineMeta::current()).unwrap_err();
        assert!(matches!(err, PipelineError::Validate(_)));
        assert_eq!(store.products()[1].seller_id, None);
    }

    #[test]
    fn insufficient_sellers_surface_as_allocate_error() {
        let mut store = MemoryStore::new(
            vec![seller(1, None), seller(2, None)],
            vec![product(10, "a"), product(11, "a")],
        );
        let err = run_store_allocation(&mut store, &EngineParams::default(), &EngineMeta::current()).unwrap_err();
        assert!(matches!(err, PipelineError::Allocate(sf_algo::AllocError::InsufficientSellers { .. })));
    }

    #[test]
    fn partitioned_params_take_the_partitioned_path() {
        let sellers: Vec<Seller> = (1..=6).map(|i| seller(i, None)).collect();
        let products: Vec<Product> = (1..=20).map(|i| product(i, "a")).collect();
        let mut store = MemoryStore::new(sellers, products);
        let params = EngineParams {
            partitions: 4,
            seed: Some(11),
            reserved_sellers: ReservedSellers::Leading { count: 2 },
            ..EngineParams::default()
        };
        let (a, _) = run_store_allocation(&mut store.clone(), &params, &EngineMeta::current()).unwrap();
        let (b, _) = run_store_allocation(&mut store, &params, &EngineMeta::current()).unwrap();
        assert_eq!(a.run_record.id, b.run_record.id);
        assert_eq!(a.run_record.partitions, 4);
        assert_eq!(a.run_record.counts.parity, 10);
        assert_eq!(a.run_record.counts.fallback, 10);
    }
}
