//! Category affinity index: `mainCategory -> sellers declaring it`.
//!
//! - Buckets keep the sellers' incoming order.
//! - Sellers without a main category are not indexed.
//! - Looking up an unknown category yields an empty slice.

use std::collections::HashMap;

use sf_core::Seller;

#[derive(Clone, Debug, Default)]
pub struct CategoryAffinityIndex<'a> {
    buckets: HashMap<&'a str, Vec<&'a Seller>>,
}

impl<'a> CategoryAffinityIndex<'a> {
    pub fn build<I>(sellers: I) -> Self
    where
        I: IntoIterator<Item = &'a Seller>,
    {
        let mut buckets: HashMap<&'a str, Vec<&'a Seller>> = HashMap::new();
        for seller in sellers {
            if let Some(category) = &seller.main_category {
                buckets.entry(category.as_str()).or_default().push(seller);
            }
        }
        Self { buckets }
    }

    /// Sellers whose main category equals `category` (after trimming).
    #[inline]
    pub fn lookup(&self, category: &str) -> &[&'a Seller] {
        self.buckets
            .get(category.trim())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct indexed categories.
    #[inline]
    pub fn categories(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::{Category, OwnerId, SellerId, ShopType};

    fn seller(id: u64, category: Option<&str>) -> Seller {
        let s = Seller::new(
            SellerId::new(id).unwrap(),
            OwnerId::new(100 + id).unwrap(),
            format!("shop-{id}"),
            ShopType::Individual,
        );
        match category {
            Some(c) => s.with_main_category(Category::new(c).unwrap()),
            None => s,
        }
    }

    #[test]
    fn buckets_preserve_seller_order() {
        let xs = vec![
            seller(1, Some("ao-thun")),
            seller(2, Some("quan-jean")),
            seller(3, Some("ao-thun")),
            seller(4, None),
        ];
        let idx = CategoryAffinityIndex::build(&xs);
        let hits: Vec<u64> = idx.lookup("ao-thun").iter().map(|s| s.id.get()).collect();
        assert_eq!(hits, vec![1, 3]);
        assert_eq!(idx.lookup("quan-jean").len(), 1);
        assert_eq!(idx.categories(), 2);
    }

    #[test]
    fn unknown_category_is_empty_not_error() {
        let xs = vec![seller(1, None)];
        let idx = CategoryAffinityIndex::build(&xs);
        assert!(idx.is_empty());
        assert!(idx.lookup("giay-dep").is_empty());
    }

    #[test]
    fn lookup_trims_query() {
        let xs = vec![seller(1, Some("ao-thun"))];
        let idx = CategoryAffinityIndex::build(&xs);
        assert_eq!(idx.lookup(" ao-thun ").len(), 1);
        assert!(idx.lookup("Ao-Thun").is_empty());
    }
}
