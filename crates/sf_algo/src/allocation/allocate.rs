//! Product → seller allocation (parity split, category affinity, random fallback).
//!
//! Contract, per product at position `index` of the input slice:
//! 1. even `index` → `default_owner` (the legacy seller keeps half the catalog).
//! 2. odd `index` → draw from the *eligible pool*: every seller not reserved by
//!    the `ReservedSellers` policy (by default the first two of the snapshot).
//!    - sellers in the pool whose main category equals the product's category
//!      are preferred; one match is taken as-is, several are picked uniformly
//!      via the injected `RandomSource`;
//!    - no match → uniform pick over the whole pool.
//! 3. an empty pool fails with `InsufficientSellers`, but only when some
//!    product actually needs it (an all-even catalog does not).
//!
//! Position, not product id, drives the parity rule; callers must hand in the
//! catalog in a stable order. Inputs are never mutated.
//!
//! Determinism: the output depends only on the inputs and the random stream.
//! Draws happen in catalog order, one per odd-index product with 2+ candidates.

use core::num::NonZeroUsize;

use sf_core::{OwnerId, Product, ProductId, RandomSource, ReservedSellers, Seller};
use thiserror::Error;

use crate::affinity::CategoryAffinityIndex;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AllocError {
    /// No seller is left once the reserved ones are set aside.
    #[error("insufficient sellers: {total} supplied, {reserved} reserved, none eligible")]
    InsufficientSellers { total: usize, reserved: usize },
    #[error("partition count must be at least 1")]
    ZeroPartitions,
}

/// Which rule produced an assignment.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AllocationRule {
    Parity,
    Affinity,
    Fallback,
}

impl AllocationRule {
    pub fn as_token(self) -> &'static str {
        match self {
            AllocationRule::Parity => "parity",
            AllocationRule::Affinity => "affinity",
            AllocationRule::Fallback => "fallback",
        }
    }
}

/// One assignment, in catalog order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationDecision {
    pub index: usize,
    pub product_id: ProductId,
    pub owner: OwnerId,
    pub rule: AllocationRule,
    /// Size of the set the owner was chosen from (1 for parity).
    pub candidates: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllocationOutcome {
    /// Input products with `seller_id` rewritten, same order.
    pub products: Vec<Product>,
    pub decisions: Vec<AllocationDecision>,
}

impl AllocationOutcome {
    pub fn count(&self, rule: AllocationRule) -> usize {
        self.decisions.iter().filter(|d| d.rule == rule).count()
    }

    pub(crate) fn extend(&mut self, other: AllocationOutcome) {
        self.products.extend(other.products);
        self.decisions.extend(other.decisions);
    }
}

/// A product whose `seller_id` differs from the input snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SellerChange {
    pub product_id: ProductId,
    pub seller_id: OwnerId,
}

/// Sellers that may receive redistributed stock, with their affinity index.
#[derive(Clone, Debug)]
pub struct EligiblePool<'a> {
    sellers: Vec<&'a Seller>,
    affinity: CategoryAffinityIndex<'a>,
    total: usize,
}

impl<'a> EligiblePool<'a> {
    pub fn build(sellers: &'a [Seller], reserved: ReservedSellers) -> Self {
        let eligible: Vec<&'a Seller> = sellers
            .iter()
            .enumerate()
            .filter(|(pos, s)| !reserved.is_reserved(*pos, s))
            .map(|(_, s)| s)
            .collect();
        // Index the pool only: an affinity hit must never land on a reserved seller.
        let affinity = CategoryAffinityIndex::build(eligible.iter().copied());
        Self { sellers: eligible, affinity, total: sellers.len() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sellers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sellers.is_empty()
    }

    #[inline]
    pub fn sellers(&self) -> &[&'a Seller] {
        &self.sellers
    }

    fn insufficient(&self) -> AllocError {
        AllocError::InsufficientSellers {
            total: self.total,
            reserved: self.total - self.sellers.len(),
        }
    }
}

/// Allocate every product of `products` to exactly one owner.
pub fn allocate<R: RandomSource + ?Sized>(
    products: &[Product],
    sellers: &[Seller],
    default_owner: OwnerId,
    reserved: ReservedSellers,
    rng: &mut R,
) -> Result<AllocationOutcome, AllocError> {
    let pool = EligiblePool::build(sellers, reserved);
    allocate_range(products, 0, &pool, default_owner, rng)
}

/// Allocate a contiguous slice of the catalog whose first element sits at
/// global position `base_index`.
pub(crate) fn allocate_range<R: RandomSource + ?Sized>(
    products: &[Product],
    base_index: usize,
    pool: &EligiblePool<'_>,
    default_owner: OwnerId,
    rng: &mut R,
) -> Result<AllocationOutcome, AllocError> {
    if pool.is_empty() && has_odd_position(base_index, products.len()) {
        return Err(pool.insufficient());
    }

    let mut out = AllocationOutcome {
        products: Vec::with_capacity(products.len()),
        decisions: Vec::with_capacity(products.len()),
    };

    for (offset, product) in products.iter().enumerate() {
        let index = base_index + offset;
        let (owner, rule, candidates) = if index % 2 == 0 {
            (default_owner, AllocationRule::Parity, 1)
        } else {
            let matches = product
                .category
                .as_ref()
                .map(|c| pool.affinity.lookup(c.as_str()))
                .unwrap_or(&[]);
            let (set, rule) = if matches.is_empty() {
                (pool.sellers(), AllocationRule::Fallback)
            } else {
                (matches, AllocationRule::Affinity)
            };
            let chosen = pick(set, rng).ok_or_else(|| pool.insufficient())?;
            (chosen.owner_id, rule, set.len())
        };

        let mut assigned = product.clone();
        assigned.seller_id = Some(owner);
        out.products.push(assigned);
        out.decisions.push(AllocationDecision {
            index,
            product_id: product.id,
            owner,
            rule,
            candidates,
        });
    }

    Ok(out)
}

/// Uniform pick; a single candidate is taken without drawing.
fn pick<'a, R: RandomSource + ?Sized>(set: &[&'a Seller], rng: &mut R) -> Option<&'a Seller> {
    let n = NonZeroUsize::new(set.len())?;
    if n.get() == 1 {
        return set.first().copied();
    }
    // Reduce defensively: a misbehaving source must not index out of bounds.
    set.get(rng.pick_index(n) % n.get()).copied()
}

#[inline]
fn has_odd_position(base_index: usize, len: usize) -> bool {
    match len {
        0 => false,
        1 => base_index % 2 == 1,
        _ => true,
    }
}

/// Products whose `seller_id` changed between `before` and `after`, paired by
/// position. Both slices are expected to describe the same catalog order.
pub fn changes(before: &[Product], after: &[Product]) -> Vec<SellerChange> {
    before
        .iter()
        .zip(after)
        .filter_map(|(old, new)| match new.seller_id {
            Some(seller_id) if old.seller_id != Some(seller_id) => Some(SellerChange {
                product_id: new.id,
                seller_id,
            }),
            _ => None,
        })
        .collect()
}
