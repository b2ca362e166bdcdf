//! Engine parameters with safe defaults, plus domain validation.
//!
//! Every field has a default so an empty `{}` params file is a valid
//! configuration reproducing the storefront's historical behaviour:
//! top 5 sellers, owner `1` keeps the even half of the catalog, and the first
//! two sellers in the snapshot are reserved from redistribution.

use core::num::NonZeroU64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entities::{Seller, ShopType};
use crate::errors::CoreError;
use crate::ids::OwnerId;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_RESERVED_COUNT: usize = 2;
pub const MAX_TOP_K: usize = 1_000;
pub const MAX_PARTITIONS: usize = 256;

/// Which sellers are held back from redistributed stock.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "policy", rename_all = "snake_case"))]
pub enum ReservedSellers {
    /// The first `count` sellers of the snapshot, by position.
    Leading { count: usize },
    /// Sellers carrying `isDefaultSeller = true`, wherever they appear.
    Flagged,
}

impl Default for ReservedSellers {
    fn default() -> Self {
        ReservedSellers::Leading { count: DEFAULT_RESERVED_COUNT }
    }
}

impl ReservedSellers {
    /// True iff the seller at `position` in the snapshot is reserved.
    #[inline]
    pub fn is_reserved(&self, position: usize, seller: &Seller) -> bool {
        match *self {
            ReservedSellers::Leading { count } => position < count,
            ReservedSellers::Flagged => seller.is_default_seller,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default, deny_unknown_fields))]
pub struct EngineParams {
    /// Size of the storefront "top sellers" strip.
    pub top_k: usize,
    /// Owner that keeps products at even catalog positions.
    pub default_owner_id: OwnerId,
    pub reserved_sellers: ReservedSellers,
    /// Seed for the allocation stream. `None` means seed `0`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub seed: Option<u64>,
    /// Shop types listed in the storefront brand filter.
    pub brand_shop_types: Vec<ShopType>,
    /// Number of independently seeded catalog partitions (1 = single stream).
    pub partitions: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            top_k: DEFAULT_TOP_K,
            default_owner_id: OwnerId::from_nonzero(NonZeroU64::MIN),
            reserved_sellers: ReservedSellers::default(),
            seed: None,
            brand_shop_types: vec![ShopType::Official, ShopType::Brand],
            partitions: 1,
        }
    }
}

impl EngineParams {
    #[inline]
    pub fn seed_or_default(&self) -> u64 {
        self.seed.unwrap_or(0)
    }

    /// Validate numeric domains.
    pub fn validate_domains(&self) -> Result<(), CoreError> {
        if self.top_k > MAX_TOP_K {
            return Err(CoreError::DomainOutOfRange(format!(
                "topK must be <= {MAX_TOP_K}, got {}",
                self.top_k
            )));
        }
        if self.partitions == 0 || self.partitions > MAX_PARTITIONS {
            return Err(CoreError::DomainOutOfRange(format!(
                "partitions must be in 1..={MAX_PARTITIONS}, got {}",
                self.partitions
            )));
        }
        if let ReservedSellers::Leading { count } = self.reserved_sellers {
            if count > MAX_TOP_K {
                return Err(CoreError::DomainOutOfRange(format!(
                    "reservedSellers.count too large: {count}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let p = EngineParams::default();
        assert!(p.validate_domains().is_ok());
        assert_eq!(p.top_k, 5);
        assert_eq!(p.default_owner_id.get(), 1);
        assert_eq!(p.reserved_sellers, ReservedSellers::Leading { count: 2 });
        assert_eq!(p.seed_or_default(), 0);
    }

    #[test]
    fn zero_partitions_rejected() {
        let p = EngineParams { partitions: 0, ..EngineParams::default() };
        assert!(matches!(p.validate_domains(), Err(CoreError::DomainOutOfRange(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn empty_object_is_default_and_policy_is_tagged() {
        let p: EngineParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p, EngineParams::default());

        let p: EngineParams =
            serde_json::from_str(r#"{"reservedSellers":{"policy":"flagged"},"seed":7}"#).unwrap();
        assert_eq!(p.reserved_sellers, ReservedSellers::Flagged);
        assert_eq!(p.seed, Some(7));

        assert!(serde_json::from_str::<EngineParams>(r#"{"topk":3}"#).is_err());
    }
}
