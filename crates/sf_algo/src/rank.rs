//! Display ranking for the storefront "top sellers" strip.
//!
//! Contract:
//! - Order by `rating` desc, then `review_count` desc (see
//!   `sf_core::determinism::cmp_display_rank`). Equal keys keep the incoming
//!   (deduplicated) order: the sort is stable.
//! - Truncate to `limit`. `limit == 0` yields nothing; a `limit` above the
//!   available count yields everything.
//! - Empty input yields the [`FALLBACK_SELLERS`] table (also truncated to
//!   `limit`), so the storefront never renders an empty section.

use core::num::NonZeroU64;

use sf_core::determinism::sort_display_rank;
use sf_core::{Category, OwnerId, Rating, Seller, SellerId, ShopType};

use crate::dedupe::dedupe;

/// One row of the fallback display table.
#[derive(Clone, Copy, Debug)]
pub struct FallbackSeller {
    pub id: NonZeroU64,
    pub shop_name: &'static str,
    pub shop_type: ShopType,
    pub main_category: &'static str,
    pub rating: f64,
    pub review_count: u32,
    pub product_count: u32,
}

const fn nz(v: u64) -> NonZeroU64 {
    match NonZeroU64::new(v) {
        Some(n) => n,
        None => panic!("fallback ids must be non-zero"),
    }
}

/// Shown when there are no sellers to rank. Already in display order.
pub const FALLBACK_SELLERS: [FallbackSeller; 3] = [
    FallbackSeller {
        id: nz(9001),
        shop_name: "Official Style Store",
        shop_type: ShopType::Official,
        main_category: "ao-thun",
        rating: 4.9,
        review_count: 1280,
        product_count: 320,
    },
    FallbackSeller {
        id: nz(9002),
        shop_name: "Denim Brand House",
        shop_type: ShopType::Brand,
        main_category: "quan-jean",
        rating: 4.8,
        review_count: 860,
        product_count: 210,
    },
    FallbackSeller {
        id: nz(9003),
        shop_name: "Handmade Corner",
        shop_type: ShopType::SmallBusiness,
        main_category: "phu-kien",
        rating: 4.7,
        review_count: 540,
        product_count: 95,
    },
];

impl FallbackSeller {
    pub fn to_seller(&self) -> Seller {
        let mut seller = Seller::new(
            SellerId::from_nonzero(self.id),
            OwnerId::from_nonzero(self.id),
            self.shop_name,
            self.shop_type,
        )
        .with_rating(Rating::new(self.rating).unwrap_or(Rating::ZERO))
        .with_review_count(self.review_count)
        .with_product_count(self.product_count);
        seller.main_category = Category::new(self.main_category).ok();
        seller
    }
}

/// The fallback table as owned sellers.
pub fn fallback_sellers() -> Vec<Seller> {
    FALLBACK_SELLERS.iter().map(FallbackSeller::to_seller).collect()
}

/// Ranked output plus whether the fallback table was used.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedView {
    pub sellers: Vec<Seller>,
    pub used_fallback: bool,
}

/// Rank already-deduplicated sellers and keep the first `limit`.
pub fn rank(sellers: &[Seller], limit: usize) -> Vec<Seller> {
    rank_view(sellers, limit).sellers
}

/// Same as [`rank`], reporting whether the fallback table was substituted.
pub fn rank_view(sellers: &[Seller], limit: usize) -> RankedView {
    if sellers.is_empty() {
        let mut fallback = fallback_sellers();
        fallback.truncate(limit);
        return RankedView { sellers: fallback, used_fallback: true };
    }

    let mut ranked = sellers.to_vec();
    sort_display_rank(&mut ranked);
    ranked.truncate(limit);
    RankedView { sellers: ranked, used_fallback: false }
}

/// Raw snapshot → dedupe → rank.
pub fn top_sellers(raw: &[Seller], limit: usize) -> RankedView {
    rank_view(&dedupe(raw), limit)
}
