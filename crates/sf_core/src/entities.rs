//! Seller and product snapshot records.
//!
//! Wire shape is camelCase JSON as served by the marketplace REST layer.
//! Sparse records are normal upstream: `rating`, `reviewCount` and
//! `productCount` decode to `0` when absent or `null`, and an empty or
//! whitespace-only category decodes to "no category".

use core::cmp::Ordering;
use core::fmt;

use smol_str::SmolStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CoreError;
use crate::ids::{OwnerId, ProductId, SellerId};

/* -------------------------------------------------------------------------- */
/*                                   Rating                                   */
/* -------------------------------------------------------------------------- */

/// Finite, non-negative rating with a total order.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct Rating(f64);

impl Rating {
    pub const ZERO: Rating = Rating(0.0);

    pub fn new(v: f64) -> Result<Self, CoreError> {
        if !v.is_finite() || v < 0.0 {
            return Err(CoreError::InvalidRating(v.to_string()));
        }
        // Fold -0.0 into +0.0 so the total order sees one zero.
        Ok(Rating(if v == 0.0 { 0.0 } else { v }))
    }

    #[inline]
    pub fn value(self) -> f64 { self.0 }
}

impl PartialEq for Rating {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Rating {}

impl PartialOrd for Rating {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Rating {
    fn cmp(&self, other: &Self) -> Ordering { self.0.total_cmp(&other.0) }
}

impl TryFrom<f64> for Rating {
    type Error = CoreError;
    fn try_from(v: f64) -> Result<Self, Self::Error> { Rating::new(v) }
}

impl From<Rating> for f64 {
    fn from(r: Rating) -> f64 { r.0 }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/* -------------------------------------------------------------------------- */
/*                                  Category                                  */
/* -------------------------------------------------------------------------- */

/// Category slug (e.g. `ao-thun`). Trimmed, non-empty, compared exactly.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Category(SmolStr);

impl Category {
    pub fn new(s: &str) -> Result<Self, CoreError> {
        let t = s.trim();
        if t.is_empty() {
            return Err(CoreError::InvalidCategory(s.to_string()));
        }
        Ok(Category(SmolStr::new(t)))
    }

    #[inline]
    pub fn as_str(&self) -> &str { self.0.as_str() }
}

impl TryFrom<String> for Category {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> { Category::new(&s) }
}

impl From<Category> for String {
    fn from(c: Category) -> String { c.0.to_string() }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/* -------------------------------------------------------------------------- */
/*                                  ShopType                                  */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShopType {
    Official,
    Brand,
    #[cfg_attr(feature = "serde", serde(alias = "small-business"))]
    SmallBusiness,
    Individual,
}

impl ShopType {
    pub fn as_token(self) -> &'static str {
        match self {
            ShopType::Official => "official",
            ShopType::Brand => "brand",
            ShopType::SmallBusiness => "small_business",
            ShopType::Individual => "individual",
        }
    }
}

impl core::str::FromStr for ShopType {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "official" => Ok(ShopType::Official),
            "brand" => Ok(ShopType::Brand),
            "small_business" | "small-business" => Ok(ShopType::SmallBusiness),
            "individual" => Ok(ShopType::Individual),
            other => Err(CoreError::UnknownShopType(other.to_string())),
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Seller                                   */
/* -------------------------------------------------------------------------- */

/// Merchant storefront snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Seller {
    pub id: SellerId,
    pub owner_id: OwnerId,
    pub shop_name: String,
    pub shop_type: ShopType,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "blank_category_as_none", skip_serializing_if = "Option::is_none")
    )]
    pub main_category: Option<Category>,
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "null_as_default"))]
    pub rating: Rating,
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "null_as_default"))]
    pub review_count: u32,
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "null_as_default"))]
    pub product_count: u32,
    /// Pre-existing account that keeps its stock during redistribution
    /// (only consulted under `ReservedSellers::Flagged`).
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_default_seller: bool,
}

impl Seller {
    /// Bare seller with every optional field at its default.
    pub fn new(id: SellerId, owner_id: OwnerId, shop_name: impl Into<String>, shop_type: ShopType) -> Self {
        Seller {
            id,
            owner_id,
            shop_name: shop_name.into(),
            shop_type,
            main_category: None,
            rating: Rating::ZERO,
            review_count: 0,
            product_count: 0,
            is_default_seller: false,
        }
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_review_count(mut self, n: u32) -> Self {
        self.review_count = n;
        self
    }

    pub fn with_product_count(mut self, n: u32) -> Self {
        self.product_count = n;
        self
    }

    pub fn with_main_category(mut self, category: Category) -> Self {
        self.main_category = Some(category);
        self
    }

    pub fn marked_default(mut self) -> Self {
        self.is_default_seller = true;
        self
    }
}

/* -------------------------------------------------------------------------- */
/*                                  Product                                   */
/* -------------------------------------------------------------------------- */

/// Catalog entry. `seller_id` points at `Seller::owner_id` and is what the
/// allocator rewrites.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Product {
    pub id: ProductId,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "blank_category_as_none", skip_serializing_if = "Option::is_none")
    )]
    pub category: Option<Category>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub seller_id: Option<OwnerId>,
}

impl Product {
    pub fn new(id: ProductId, category: Option<Category>) -> Self {
        Product { id, category, seller_id: None }
    }

    pub fn with_seller(mut self, owner: OwnerId) -> Self {
        self.seller_id = Some(owner);
        self
    }
}

/* -------------------------------------------------------------------------- */
/*                              serde helpers                                 */
/* -------------------------------------------------------------------------- */

#[cfg(feature = "serde")]
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[cfg(feature = "serde")]
fn blank_category_as_none<'de, D>(d: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.and_then(|s| Category::new(&s).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_rejects_nan_and_negative() {
        assert!(Rating::new(f64::NAN).is_err());
        assert!(Rating::new(-0.5).is_err());
        assert!(Rating::new(f64::INFINITY).is_err());
        assert_eq!(Rating::new(-0.0).unwrap(), Rating::ZERO);
        assert!(Rating::new(4.5).unwrap() > Rating::new(4.0).unwrap());
    }

    #[test]
    fn category_is_trimmed_and_non_empty() {
        assert_eq!(Category::new("  ao-thun ").unwrap().as_str(), "ao-thun");
        assert!(Category::new("   ").is_err());
    }

    #[test]
    fn shop_type_tokens() {
        assert_eq!("small-business".parse::<ShopType>().unwrap(), ShopType::SmallBusiness);
        assert_eq!(ShopType::Official.as_token(), "official");
        assert!("mall".parse::<ShopType>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn sparse_seller_decodes_with_zero_defaults() {
        let s: Seller = serde_json::from_str(
            r#"{"id":3,"ownerId":9,"shopName":"Shop","shopType":"brand","rating":null,"mainCategory":"  "}"#,
        )
        .unwrap();
        assert_eq!(s.rating, Rating::ZERO);
        assert_eq!(s.review_count, 0);
        assert_eq!(s.product_count, 0);
        assert!(s.main_category.is_none());
        assert!(!s.is_default_seller);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn product_round_trips_camel_case() {
        let p = Product::new(ProductId::new(10).unwrap(), Category::new("ao-thun").ok())
            .with_seller(OwnerId::new(3).unwrap());
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"id":10,"category":"ao-thun","sellerId":3}"#);
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn product_with_zero_seller_is_rejected() {
        assert!(serde_json::from_str::<Product>(r#"{"id":1,"sellerId":0}"#).is_err());
    }
}
