//! sf_core — Core types, engine params, ordering helpers, and seeded RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! engine (`sf_io`, `sf_algo`, `sf_pipeline`, `sf_cli`).
//!
//! - Ids: `SellerId`, `OwnerId`, `ProductId` (non-zero)
//! - Entities: `Seller`, `Product`, `ShopType`, `Rating`, `Category`
//! - Params: `EngineParams`, `ReservedSellers`
//! - Display ordering helpers (rating desc, review count desc)
//! - Seedable RNG (ChaCha20) behind the `RandomSource` seam
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod determinism;
pub mod entities;
pub mod errors;
pub mod ids;
pub mod params;
pub mod rng;

pub use entities::{Category, Product, Rating, Seller, ShopType};
pub use errors::CoreError;
pub use ids::{OwnerId, ProductId, SellerId};
pub use params::{EngineParams, ReservedSellers};
pub use rng::{RandomSource, SeededRng};
