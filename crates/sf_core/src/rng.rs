// crates/sf_core/src/rng.rs
//
// Randomness for catalog redistribution.
//
// • `RandomSource` is the only seam through which the allocator draws; callers
//   inject it, tests swap it.
// • `SeededRng` is the production source: ChaCha20 with an explicit seed mapping
//   and a word counter, so a run can be replayed and audited.
// • Sub-streams (`SeededRng::substream`) give each worker of a partitioned pass
//   its own independent stream of the same seed.
// • Integer-only: unbiased ranges via rejection sampling, no floating point.

use core::num::NonZeroUsize;

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Source of uniform picks for the allocator.
///
/// The `NonZeroUsize` bound makes an empty choice unrepresentable, so a
/// conforming source can always answer. Implementations must return a value
/// in `[0, n)`.
pub trait RandomSource {
    fn pick_index(&mut self, n: NonZeroUsize) -> usize;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    #[inline]
    fn pick_index(&mut self, n: NonZeroUsize) -> usize {
        (**self).pick_index(n)
    }
}

/// Deterministic RNG for allocation draws.
///
/// The 64-bit seed maps to the ChaCha20 32-byte seed as `seed.to_le_bytes()` in
/// the first 8 bytes, the remaining 24 bytes zero. This keeps the stream stable
/// across platforms (crate versions are pinned at the workspace level).
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: ChaCha20Rng,
    words_consumed: u128,
}

impl SeededRng {
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            words_consumed: 0,
        }
    }

    /// Independent stream `stream` of `seed`. Stream `0` is the same stream
    /// as `from_seed_u64(seed)`.
    #[inline]
    pub fn substream(seed: u64, stream: u64) -> Self {
        let mut s = Self::from_seed_u64(seed);
        s.rng.set_stream(stream);
        s
    }

    /// Total number of 64-bit words drawn so far (saturating).
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    /// The only place the counter is advanced.
    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.words_consumed = self.words_consumed.saturating_add(1);
        self.rng.next_u64()
    }

    /// Unbiased integer in `[0, n)`; `None` if `n == 0`.
    ///
    /// Let `threshold = 2^64 mod n` (computed as `wrapping_neg() % n`).
    /// Accept `x` if `x >= threshold`; then `x % n` is uniform.
    #[inline]
    pub fn gen_range(&mut self, n: u64) -> Option<u64> {
        if n == 0 {
            return None;
        }
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.next_u64();
            if x >= threshold {
                return Some(x % n);
            }
        }
    }
}

impl RandomSource for SeededRng {
    #[inline]
    fn pick_index(&mut self, n: NonZeroUsize) -> usize {
        // n >= 1 so the draw always lands.
        self.gen_range(n.get() as u64).map_or(0, |v| v as usize)
    }
}

/// Replays a fixed list of picks, cycling when exhausted. Each scripted value
/// is reduced modulo the requested range. Intended for tests that need to
/// assert exact assignments.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    picks: Vec<usize>,
    cursor: usize,
    calls: usize,
}

impl ScriptedRng {
    pub fn new(picks: impl Into<Vec<usize>>) -> Self {
        Self { picks: picks.into(), cursor: 0, calls: 0 }
    }

    /// Number of picks requested so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl RandomSource for ScriptedRng {
    fn pick_index(&mut self, n: NonZeroUsize) -> usize {
        self.calls += 1;
        if self.picks.is_empty() {
            return 0;
        }
        let v = self.picks[self.cursor % self.picks.len()];
        self.cursor += 1;
        v % n.get()
    }
}
