//! Seller deduplication by display name.
//!
//! Contract:
//! - Key is `shop_name`, compared exactly (no case folding, no trimming).
//! - A later record replaces the stored survivor only on a **strictly** higher
//!   rating (absent ratings are already `0` on the typed record); ties keep the
//!   first-seen record.
//! - Output order is the order in which each name was first seen. A replacement
//!   takes over its predecessor's slot.
//!
//! Single forward pass, O(N) with one hash lookup per record.

use std::collections::HashMap;

use sf_core::{Seller, SellerId};

/// Survivors plus the ids of records that lost to a same-named survivor,
/// in the order they were dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DedupReport {
    pub survivors: Vec<Seller>,
    pub collapsed: Vec<SellerId>,
}

impl DedupReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.collapsed.is_empty()
    }
}

/// Collapse same-named sellers, keeping the highest-rated survivor.
pub fn dedupe(sellers: &[Seller]) -> Vec<Seller> {
    dedupe_with_report(sellers).survivors
}

/// Same as [`dedupe`], also reporting which records were collapsed.
pub fn dedupe_with_report(sellers: &[Seller]) -> DedupReport {
    let mut slot_by_name: HashMap<&str, usize> = HashMap::with_capacity(sellers.len());
    let mut survivors: Vec<&Seller> = Vec::with_capacity(sellers.len());
    let mut collapsed: Vec<SellerId> = Vec::new();

    for seller in sellers {
        match slot_by_name.get(seller.shop_name.as_str()) {
            None => {
                slot_by_name.insert(seller.shop_name.as_str(), survivors.len());
                survivors.push(seller);
            }
            Some(&slot) => {
                let current = survivors[slot];
                if seller.rating > current.rating {
                    collapsed.push(current.id);
                    survivors[slot] = seller;
                } else {
                    collapsed.push(seller.id);
                }
            }
        }
    }

    DedupReport {
        survivors: survivors.into_iter().cloned().collect(),
        collapsed,
    }
}
