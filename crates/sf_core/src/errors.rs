//! Minimal error set for core-domain validation & parsing.

use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CoreError {
    /// Ids are non-zero; `0` is how the upstream store spells "unassigned".
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("invalid rating: {0}")]
    InvalidRating(String),
    #[error("invalid category: {0:?}")]
    InvalidCategory(String),
    #[error("unknown shop type: {0}")]
    UnknownShopType(String),
    #[error("domain out of range: {0}")]
    DomainOutOfRange(String),
}
