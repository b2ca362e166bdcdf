// crates/sf_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Algorithm layer for the storefront engine.
//!
//! Leaf-first:
//! - [`dedupe`]: collapse same-named sellers, highest rating survives
//! - [`rank`]: display order + top-K, with the never-empty fallback table
//! - [`affinity`]: `mainCategory -> sellers` lookup
//! - [`allocation`]: parity split + affinity match + random fallback
//!
//! Everything here is pure and synchronous over borrowed snapshots. The only
//! non-deterministic input is the caller-supplied `RandomSource`.

pub mod affinity;
pub mod dedupe;
pub mod rank;

// ----------------------------- Allocation (public surface) ---------------------------

pub mod allocation {
    pub mod allocate;
    pub mod partitioned;

    pub use allocate::{
        allocate, changes, AllocError, AllocationDecision, AllocationOutcome, AllocationRule,
        EligiblePool, SellerChange,
    };
    pub use partitioned::{allocate_partitioned, PartitionedOutcome};
}

// Convenience re-exports (pipeline imports these from crate root)
pub use affinity::CategoryAffinityIndex;
pub use allocation::{allocate, allocate_partitioned, AllocError, AllocationOutcome, SellerChange};
pub use dedupe::{dedupe, dedupe_with_report, DedupReport};
pub use rank::{fallback_sellers, rank, rank_view, top_sellers, RankedView};
