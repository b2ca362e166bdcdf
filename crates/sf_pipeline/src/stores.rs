//! Store collaborators.
//!
//! The engine never owns persistence. It reads snapshots through
//! [`SellerStore`] / [`ProductStore`] and pushes allocator changes through
//! [`ProductUpdater`], one call per changed product. Two implementations ship
//! here: [`MemoryStore`] for embedding and tests, and [`JsonSnapshotStore`]
//! which reads snapshot files and can write the updated catalog back. Write-back
//! patches `sellerId` into the raw records; every other field is kept as read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sf_algo::SellerChange;
use sf_core::{Category, OwnerId, Product, ProductId, Seller};
use sf_io::canonical_json::write_canonical;
use sf_io::loader;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Optional narrowing for `list_products`. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub seller_id: Option<OwnerId>,
}

impl ProductFilter {
    pub fn by_category(category: Category) -> Self {
        Self { category: Some(category), seller_id: None }
    }

    pub fn by_seller(seller_id: OwnerId) -> Self {
        Self { category: None, seller_id: Some(seller_id) }
    }

    pub fn matches(&self, p: &Product) -> bool {
        let category_ok = match &self.category {
            Some(want) => p.category.as_ref() == Some(want),
            None => true,
        };
        let seller_ok = match self.seller_id {
            Some(want) => p.seller_id == Some(want),
            None => true,
        };
        category_ok && seller_ok
    }
}

pub trait SellerStore {
    fn list_sellers(&self) -> Result<Vec<Seller>, StoreError>;
}

pub trait ProductStore {
    fn list_products(&self, filter: Option<&ProductFilter>) -> Result<Vec<Product>, StoreError>;
}

pub trait ProductUpdater {
    fn update_seller_id(&mut self, product_id: ProductId, seller_id: OwnerId) -> Result<(), StoreError>;
}

/// Outcome of pushing a change list to a [`ProductUpdater`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<ProductId>,
    pub failed: Vec<(ProductId, StoreError)>,
}

impl ApplyReport {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Invoke `update_seller_id` once per change, in order. Failures are recorded
/// and do not stop the remaining updates; retrying them is the caller's call.
pub fn apply_changes<U: ProductUpdater + ?Sized>(updater: &mut U, changes: &[SellerChange]) -> ApplyReport {
    let mut report = ApplyReport::default();
    for change in changes {
        match updater.update_seller_id(change.product_id, change.seller_id) {
            Ok(()) => report.applied.push(change.product_id),
            Err(e) => {
                tracing::warn!(product_id = %change.product_id, seller_id = %change.seller_id, error = %e, "seller update failed");
                report.failed.push((change.product_id, e));
            }
        }
    }
    tracing::debug!(applied = report.applied.len(), failed = report.failed.len(), "changes applied");
    report
}

/* ------------------------------- MemoryStore ------------------------------- */

/// In-process store over owned snapshots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sellers: Vec<Seller>,
    products: Vec<Product>,
    slot: HashMap<ProductId, usize>,
}

impl MemoryStore {
    pub fn new(sellers: Vec<Seller>, products: Vec<Product>) -> Self {
        let slot = products.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        Self { sellers, products, slot }
    }

    pub fn sellers(&self) -> &[Seller] {
        &self.sellers
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.slot.get(&id).map(|&i| &self.products[i])
    }
}

impl SellerStore for MemoryStore {
    fn list_sellers(&self) -> Result<Vec<Seller>, StoreError> {
        Ok(self.sellers.clone())
    }
}

impl ProductStore for MemoryStore {
    fn list_products(&self, filter: Option<&ProductFilter>) -> Result<Vec<Product>, StoreError> {
        Ok(match filter {
            Some(f) => self.products.iter().filter(|p| f.matches(p)).cloned().collect(),
            None => self.products.clone(),
        })
    }
}

impl ProductUpdater for MemoryStore {
    fn update_seller_id(&mut self, product_id: ProductId, seller_id: OwnerId) -> Result<(), StoreError> {
        let i = *self
            .slot
            .get(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;
        self.products[i].seller_id = Some(seller_id);
        Ok(())
    }
}

/* ---------------------------- JsonSnapshotStore ---------------------------- */

/// Snapshot files on disk; updates are held in memory until [`Self::flush`].
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    products_path: PathBuf,
    inner: MemoryStore,
    /// Raw product records, index-aligned with `inner.products()`.
    records: Vec<Value>,
    dirty: bool,
}

impl JsonSnapshotStore {
    pub fn open(sellers_path: &Path, products_path: &Path) -> Result<Self, StoreError> {
        let sellers = loader::load_sellers(sellers_path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let (products, records) =
            loader::load_product_records(products_path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            products_path: products_path.to_path_buf(),
            inner: MemoryStore::new(sellers, products),
            records,
            dirty: false,
        })
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The source records with current seller ids patched in.
    pub fn patched_records(&self) -> Vec<Value> {
        self.records
            .iter()
            .zip(self.inner.products())
            .map(|(record, product)| {
                let mut record = record.clone();
                if let (Value::Object(fields), Some(owner)) = (&mut record, product.seller_id) {
                    fields.insert("sellerId".to_string(), Value::from(owner.get()));
                }
                record
            })
            .collect()
    }

    /// Write the current catalog as canonical JSON to `path`.
    pub fn write_products(&self, path: &Path) -> Result<(), StoreError> {
        write_canonical(path, &self.patched_records()).map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Write pending updates back over the products snapshot it was opened from.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.dirty {
            self.write_products(&self.products_path)?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl SellerStore for JsonSnapshotStore {
    fn list_sellers(&self) -> Result<Vec<Seller>, StoreError> {
        self.inner.list_sellers()
    }
}

impl ProductStore for JsonSnapshotStore {
    fn list_products(&self, filter: Option<&ProductFilter>) -> Result<Vec<Product>, StoreError> {
        self.inner.list_products(filter)
    }
}

impl ProductUpdater for JsonSnapshotStore {
    fn update_seller_id(&mut self, product_id: ProductId, seller_id: OwnerId) -> Result<(), StoreError> {
        self.inner.update_seller_id(product_id, seller_id)?;
        self.dirty = true;
        Ok(())
    }
}
