//! Storefront pass: raw sellers → dedupe → rank → display view.

use serde::Serialize;
use sf_algo::{dedupe_with_report, rank_view};
use sf_core::{EngineParams, Seller, SellerId};

use crate::stores::{SellerStore, StoreError};

/// Everything the storefront renders from one seller snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontView {
    /// Ranked top-K (fallback table when the snapshot is empty).
    pub top_sellers: Vec<Seller>,
    /// Deduplicated sellers whose shop type is in `brandShopTypes`, incoming order.
    pub brand_sellers: Vec<Seller>,
    /// All deduplicated sellers, incoming order.
    pub survivors: Vec<Seller>,
    /// Ids of records dropped as duplicates.
    pub collapsed: Vec<SellerId>,
    pub used_fallback: bool,
}

pub fn storefront_view(sellers: &[Seller], params: &EngineParams) -> StorefrontView {
    tracing::info!(sellers = sellers.len(), top_k = params.top_k, "storefront pass start");

    let report = dedupe_with_report(sellers);
    if !report.is_clean() {
        tracing::debug!(collapsed = report.collapsed.len(), "duplicate shop names collapsed");
    }

    let ranked = rank_view(&report.survivors, params.top_k);
    if ranked.used_fallback {
        tracing::warn!("no sellers in snapshot; serving fallback display set");
    }

    let brand_sellers: Vec<Seller> = report
        .survivors
        .iter()
        .filter(|s| params.brand_shop_types.contains(&s.shop_type))
        .cloned()
        .collect();

    tracing::info!(
        survivors = report.survivors.len(),
        top = ranked.sellers.len(),
        brands = brand_sellers.len(),
        "storefront pass done"
    );

    StorefrontView {
        top_sellers: ranked.sellers,
        brand_sellers,
        survivors: report.survivors,
        collapsed: report.collapsed,
        used_fallback: ranked.used_fallback,
    }
}

/// Same as [`storefront_view`], reading the snapshot from a store.
pub fn storefront_from_store<S: SellerStore + ?Sized>(
    store: &S,
    params: &EngineParams,
) -> Result<StorefrontView, StoreError> {
    let sellers = store.list_sellers()?;
    Ok(storefront_view(&sellers, params))
}
