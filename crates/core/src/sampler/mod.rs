//! Set-sampled history caches.
//!
//! Only a deterministic subset of physical cache sets is tracked: a set is
//! sampled iff its low `k` index bits equal the next `k` bits above, where
//! `2^k` is the sampled-set count. Each sampled set owns a small LRU microcache
//! of bit-packed (address tag, PC signature, timestamp) entries and an
//! independent wrapping timestamp counter.
//!
//! Two flavors exist, differing in geometry and eviction reporting:
//! - [`HistorySampler`]: 8-way, 16-bit tags — trains the Hawkeye classifier.
//! - [`SampledCache`]: 5-way, 10-bit tags — trains the reuse-distance
//!   predictor and reports displaced entries for detraining.

/// Hawkeye-flavor history sampler.
pub mod history;

/// Mockingjay-flavor sampled cache.
pub mod sampled;

pub use history::HistorySampler;
pub use sampled::SampledCache;

/// Outcome of offering one reference to a sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The address was present: its previous signature and timestamp are
    /// returned for interval training, and the entry has been refreshed.
    Hit {
        /// PC signature recorded at the previous reference.
        last_pc: u16,
        /// Timestamp recorded at the previous reference.
        last_ts: u8,
        /// Timestamp assigned to the current reference.
        curr_ts: u8,
    },
    /// The address was absent and has been inserted.
    Miss {
        /// Timestamp assigned to the current reference.
        curr_ts: u8,
        /// Signature and timestamp of a valid entry displaced by the insert,
        /// if one was; the displaced signature is detrained as a scan.
        evicted: Option<(u16, u8)>,
    },
}

/// Forward distance from `last` to `curr` on a timeline wrapping at `modulus`.
///
/// Reconstructs at most one wrap; the result is always in `[0, modulus)`.
#[inline]
pub fn elapsed(curr: u64, last: u64, modulus: u64) -> u64 {
    if curr >= last {
        curr - last
    } else {
        curr + modulus - last
    }
}

/// True when `set` belongs to the sampled subset for `2^log2_sampled_sets`
/// sampled sets: its low index bits repeat in the bits directly above.
#[inline]
pub fn is_sampled_set(set: usize, log2_sampled_sets: u32) -> bool {
    let mask = (1usize << log2_sampled_sets) - 1;
    set & mask == (set >> log2_sampled_sets) & mask
}
