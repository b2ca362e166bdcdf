// crates/sf_pipeline/src/run_record.rs
//
// Run record for one catalog allocation pass.
//
// - `id` = "RUN:" + first 16 hex of SHA-256 over the canonical record with an
//   empty `id`. No timestamps: identical inputs, params and seed reproduce the
//   same id.
// - Input digests are SHA-256 over the canonical typed snapshots the pass ran
//   on, so a file run and a store run over the same catalog agree. They differ
//   from manifest `inputsSha256`, which covers the raw files. The output digest
//   is over the canonical allocated product list.
// - The seed is echoed in full; `rngWordsConsumed` lets an auditor replay it.

use serde::{Deserialize, Serialize};
use sf_algo::allocation::{AllocationOutcome, AllocationRule};
use sf_core::{EngineParams, Product, Seller};
use sf_io::hasher::{self, HashError};

use crate::EngineMeta;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub engine: EngineMeta,
    /// Effective params, after any command-line overrides.
    pub params: EngineParams,
    pub seed: u64,
    pub partitions: usize,
    pub rng_words_consumed: u64,
    pub inputs: RunInputs,
    pub outputs: RunOutputs,
    pub counts: RuleCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInputs {
    pub sellers_sha256: String,
    pub products_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params_sha256: Option<String>,
}

impl RunInputs {
    /// Digest the snapshots as the engine sees them.
    pub fn of_snapshot(
        sellers: &[Seller],
        products: &[Product],
        params_sha256: Option<String>,
    ) -> Result<Self, HashError> {
        Ok(RunInputs {
            sellers_sha256: hasher::sha256_canonical(sellers)?,
            products_sha256: hasher::sha256_canonical(products)?,
            params_sha256,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutputs {
    pub products_sha256: String,
    pub changes_sha256: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCounts {
    pub products: usize,
    pub parity: usize,
    pub affinity: usize,
    pub fallback: usize,
    pub changed: usize,
}

impl RuleCounts {
    pub fn tally(outcome: &AllocationOutcome, changed: usize) -> Self {
        RuleCounts {
            products: outcome.products.len(),
            parity: outcome.count(AllocationRule::Parity),
            affinity: outcome.count(AllocationRule::Affinity),
            fallback: outcome.count(AllocationRule::Fallback),
            changed,
        }
    }
}

/// Inputs for [`build_run_record`] that are not part of the outcome itself.
pub struct RunFacts<'a> {
    pub engine: &'a EngineMeta,
    pub params: &'a EngineParams,
    pub seed: u64,
    pub words_consumed: u128,
    pub inputs: RunInputs,
}

/// Assemble the record and derive its id.
pub fn build_run_record<C: Serialize + ?Sized>(
    facts: RunFacts<'_>,
    outcome: &AllocationOutcome,
    changes_wire: &C,
    changed: usize,
) -> Result<RunRecord, HashError> {
    let mut record = RunRecord {
        id: String::new(),
        engine: facts.engine.clone(),
        params: facts.params.clone(),
        seed: facts.seed,
        partitions: facts.params.partitions,
        rng_words_consumed: u64::try_from(facts.words_consumed).unwrap_or(u64::MAX),
        inputs: facts.inputs,
        outputs: RunOutputs {
            products_sha256: hasher::sha256_canonical(&outcome.products)?,
            changes_sha256: hasher::sha256_canonical(changes_wire)?,
        },
        counts: RuleCounts::tally(outcome, changed),
    };
    record.id = hasher::run_id_from_canonical(&record)?;
    Ok(record)
}
