//! Partitioned allocation for large catalogs.
//!
//! The catalog is cut into `partitions` contiguous chunks of
//! `ceil(len / partitions)` products. Chunk `k` draws from
//! `SeededRng::substream(seed, k)` and keeps its global positions, so the
//! parity rule is unaffected by the cut. Chunks run on the rayon pool when the
//! `parallel` feature is on and sequentially otherwise; both paths produce the
//! same result for the same `(seed, partitions)`.
//!
//! With `partitions == 1` the result equals `allocate` driven by
//! `SeededRng::from_seed_u64(seed)`.

use sf_core::{OwnerId, Product, ReservedSellers, SeededRng, Seller};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::allocate::{allocate_range, AllocError, AllocationOutcome, EligiblePool};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartitionedOutcome {
    pub outcome: AllocationOutcome,
    /// Sum of words drawn across all sub-streams.
    pub words_consumed: u128,
}

/// Allocate `products` in `partitions` independently seeded chunks.
pub fn allocate_partitioned(
    products: &[Product],
    sellers: &[Seller],
    default_owner: OwnerId,
    reserved: ReservedSellers,
    seed: u64,
    partitions: usize,
) -> Result<PartitionedOutcome, AllocError> {
    if partitions == 0 {
        return Err(AllocError::ZeroPartitions);
    }

    let pool = EligiblePool::build(sellers, reserved);
    let chunk_size = products.len().div_ceil(partitions).max(1);

    let run_chunk = |(k, chunk): (usize, &[Product])| -> Result<(AllocationOutcome, u128), AllocError> {
        let mut rng = SeededRng::substream(seed, k as u64);
        let out = allocate_range(chunk, k * chunk_size, &pool, default_owner, &mut rng)?;
        Ok((out, rng.words_consumed()))
    };

    #[cfg(feature = "parallel")]
    let chunks: Vec<Result<(AllocationOutcome, u128), AllocError>> =
        products.par_chunks(chunk_size).enumerate().map(run_chunk).collect();

    #[cfg(not(feature = "parallel"))]
    let chunks: Vec<Result<(AllocationOutcome, u128), AllocError>> =
        products.chunks(chunk_size).enumerate().map(run_chunk).collect();

    let mut merged = PartitionedOutcome {
        outcome: AllocationOutcome {
            products: Vec::with_capacity(products.len()),
            decisions: Vec::with_capacity(products.len()),
        },
        words_consumed: 0,
    };
    // Chunks come back in index order; the first failing chunk wins.
    for chunk in chunks {
        let (out, words) = chunk?;
        merged.outcome.extend(out);
        merged.words_consumed = merged.words_consumed.saturating_add(words);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate::{allocate, AllocationRule};
    use sf_core::{Category, ProductId, SellerId, ShopType};

    fn sellers(n: u64) -> Vec<Seller> {
        (1..=n)
            .map(|i| {
                let s = Seller::new(
                    SellerId::new(i).unwrap(),
                    OwnerId::new(i).unwrap(),
                    format!("shop-{i}"),
                    ShopType::Individual,
                );
                if i % 3 == 0 {
                    s.with_main_category(Category::new("ao-thun").unwrap())
                } else {
                    s
                }
            })
            .collect()
    }

    fn catalog(n: u64) -> Vec<Product> {
        (1..=n)
            .map(|i| {
                let c = if i % 2 == 0 { "ao-thun" } else { "giay" };
                Product::new(ProductId::new(i).unwrap(), Category::new(c).ok())
            })
            .collect()
    }

    fn owner1() -> OwnerId {
        OwnerId::new(1).unwrap()
    }

    #[test]
    fn zero_partitions_rejected() {
        let err = allocate_partitioned(&catalog(4), &sellers(5), owner1(), ReservedSellers::default(), 1, 0)
            .unwrap_err();
        assert_eq!(err, AllocError::ZeroPartitions);
    }

    #[test]
    fn single_partition_matches_plain_allocate() {
        let products = catalog(40);
        let xs = sellers(9);
        let mut rng = SeededRng::from_seed_u64(77);
        let plain = allocate(&products, &xs, owner1(), ReservedSellers::default(), &mut rng).unwrap();
        let part = allocate_partitioned(&products, &xs, owner1(), ReservedSellers::default(), 77, 1).unwrap();
        assert_eq!(part.outcome, plain);
        assert_eq!(part.words_consumed, rng.words_consumed());
    }

    #[test]
    fn parity_uses_global_positions() {
        // 7 products over 3 partitions: chunks of 3, 3, 1 starting at 0, 3, 6.
        let products = catalog(7);
        let part = allocate_partitioned(&products, &sellers(6), owner1(), ReservedSellers::default(), 5, 3).unwrap();
        for d in &part.outcome.decisions {
            assert_eq!(d.rule == AllocationRule::Parity, d.index % 2 == 0, "index {}", d.index);
        }
        let idx: Vec<usize> = part.outcome.decisions.iter().map(|d| d.index).collect();
        assert_eq!(idx, (0..7).collect::<Vec<_>>());
        assert_eq!(part.outcome.count(AllocationRule::Parity), 4);
    }

    #[test]
    fn reproducible_for_same_seed_and_partitions() {
        let products = catalog(101);
        let xs = sellers(12);
        let a = allocate_partitioned(&products, &xs, owner1(), ReservedSellers::default(), 9, 4).unwrap();
        let b = allocate_partitioned(&products, &xs, owner1(), ReservedSellers::default(), 9, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn more_partitions_than_products() {
        let products = catalog(3);
        let part = allocate_partitioned(&products, &sellers(4), owner1(), ReservedSellers::default(), 0, 16).unwrap();
        assert_eq!(part.outcome.products.len(), 3);
        let empty = allocate_partitioned(&[], &[], owner1(), ReservedSellers::default(), 0, 16).unwrap();
        assert!(empty.outcome.products.is_empty());
    }

    #[test]
    fn insufficient_sellers_surfaces_from_any_chunk() {
        let err = allocate_partitioned(&catalog(10), &sellers(2), owner1(), ReservedSellers::default(), 0, 4)
            .unwrap_err();
        assert_eq!(err, AllocError::InsufficientSellers { total: 2, reserved: 2 });
    }
}
