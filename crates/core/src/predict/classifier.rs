//! PC-indexed binary classifier: cache-friendly versus cache-averse.
//!
//! An array of saturating counters indexed by a hashed PC signature. Training
//! moves a counter up on a cache-friendly OPT verdict and down on an averse
//! one; prediction reads the counter's high-order bit.
//!
//! Training receives the signature already hashed and truncated by the history
//! sampler; prediction hashes the raw PC itself. Both land in the same index
//! space because the sampler's signature width matches the table size.

use tracing::trace;

use crate::common::{crc64, SatCounter};

/// Saturating-counter vote table keyed by PC signature.
pub struct PcClassifier {
    counters: Vec<SatCounter>,
}

impl PcClassifier {
    /// Creates a zeroed classifier with `num_entries` counters of
    /// `bits_per_entry` bits. All-zero counters predict cache-averse.
    pub fn new(num_entries: usize, bits_per_entry: u32) -> Self {
        assert!(
            num_entries.is_power_of_two(),
            "classifier entry count must be a power of two"
        );
        Self {
            counters: vec![SatCounter::new(bits_per_entry); num_entries],
        }
    }

    /// Trains the entry for an already-hashed signature with an OPT verdict.
    pub fn train(&mut self, signature: u64, opt_decision: bool) {
        let index = (signature as usize) % self.counters.len();
        if opt_decision {
            self.counters[index].increment();
        } else {
            self.counters[index].decrement();
        }
    }

    /// Predicts whether references from `pc` are cache-friendly.
    pub fn predict(&self, pc: u64) -> bool {
        let signature = (crc64(pc) as usize) % self.counters.len();
        let friendly = self.counters[signature].high_bit();
        trace!(signature, friendly, "classifier predict");
        friendly
    }

    /// Base-2 logarithm of the table size.
    pub fn log2_entries(&self) -> u32 {
        self.counters.len().trailing_zeros()
    }
}
