//! Determinism utilities: the storefront display order.
//!
//! This module is **I/O-free**. It provides:
//! - The total display order over sellers (rating desc, review count desc)
//! - A stable in-place sort helper that never reorders equal keys
//! - A check that a slice is already in display order

use core::cmp::Ordering;

use crate::entities::Seller;

/// Display order: higher `rating` first, then higher `review_count`.
/// Sellers equal on both keys compare `Equal`; callers rely on a stable
/// sort to keep their incoming order.
#[inline]
pub fn cmp_display_rank(a: &Seller, b: &Seller) -> Ordering {
    b.rating
        .cmp(&a.rating)
        .then_with(|| b.review_count.cmp(&a.review_count))
}

/// Stable in-place sort into display order.
#[inline]
pub fn sort_display_rank(xs: &mut [Seller]) {
    // `sort_by` is stable; `sort_unstable_by` would break the tie contract.
    xs.sort_by(cmp_display_rank);
}

/// True iff every adjacent pair is in display order.
pub fn is_display_ordered(xs: &[Seller]) -> bool {
    xs.windows(2)
        .all(|w| cmp_display_rank(&w[0], &w[1]) != Ordering::Greater)
}
