//! Reuse-distance predictor: per-signature temporal-difference estimator.
//!
//! Each signature owns a signed counter. `-1` marks an untrained entry; trained
//! values live in `[0, max_value]`, measured in sampler timestamp units.
//! Values in the top `MAXRD_THRESHOLD`-sized band are treated as infinite
//! reuse distance (a scan). Predictions are returned in aging-clock granules
//! so they compare directly against per-line ETR values.

use tracing::trace;

/// Counter band at the top of the range treated as infinite reuse distance.
const MAXRD_THRESHOLD: i64 = 22;

/// Divisor of the temporal-difference step: the estimate moves by
/// `max(1, |sample - estimate| / 16)` per training event.
const TD_STEP_DIVISOR: i64 = 16;

/// Table of signed reuse-distance counters with a `-1` untrained sentinel.
pub struct ReuseDistPredictor {
    counters: Vec<i64>,
    max_value: i64,
    max_rd: i64,
    granularity: i64,
    num_cpus: usize,
}

impl ReuseDistPredictor {
    /// Creates an untrained predictor.
    ///
    /// `bits_per_entry` bounds the counters at `2^bits - 1`; `num_clock_bits`
    /// sets the aging-clock period used as the prediction granularity.
    pub fn new(
        num_entries: usize,
        bits_per_entry: u32,
        num_clock_bits: u32,
        num_cpus: usize,
    ) -> Self {
        assert!(
            num_entries.is_power_of_two(),
            "predictor entry count must be a power of two"
        );
        let max_value = (1i64 << bits_per_entry) - 1;
        assert!(
            max_value > MAXRD_THRESHOLD,
            "counter range too small for the infinite-distance band"
        );
        Self {
            counters: vec![-1; num_entries],
            max_value,
            max_rd: max_value - MAXRD_THRESHOLD,
            granularity: 1i64 << num_clock_bits,
            num_cpus,
        }
    }

    #[inline]
    fn index(&self, signature: u64) -> usize {
        (signature as usize) % self.counters.len()
    }

    /// Smallest counter value treated as an infinite reuse distance.
    #[inline]
    pub fn infinite_threshold(&self) -> i64 {
        self.max_rd
    }

    /// Trains the entry for `signature` with an observed reuse distance.
    ///
    /// The first observation is stored directly; later observations move the
    /// estimate by a temporal-difference step of at least one toward the
    /// sample. Estimates stay inside `[0, max_value]`.
    pub fn train(&mut self, signature: u64, sample_rd: i64) {
        let index = self.index(signature);
        let entry = &mut self.counters[index];
        let sample = sample_rd.clamp(0, self.max_value);
        if *entry < 0 {
            *entry = sample;
            trace!(index, sample, "reuse predictor first-train");
            return;
        }
        let diff = sample - *entry;
        if diff > 0 {
            *entry = (*entry + (diff / TD_STEP_DIVISOR).max(1)).min(self.max_value);
        } else if diff < 0 {
            *entry = (*entry + (diff / TD_STEP_DIVISOR).min(-1)).max(0);
        }
        trace!(index, value = *entry, "reuse predictor train");
    }

    /// Detrains a signature displaced from the sampler without being reused:
    /// its estimate moves toward the infinite-distance band.
    pub fn train_scan(&mut self, signature: u64) {
        self.train(signature, self.max_value);
    }

    /// Predicts the ETR for `signature`, in aging-clock granules.
    ///
    /// Untrained entries assume an immediate re-reference on a single-core
    /// cache and a scan (`etr_inf`) on a shared cache. Entries inside the
    /// infinite band also return `etr_inf`.
    pub fn predict(&self, signature: u64, etr_inf: i64) -> i64 {
        let counter = self.counters[self.index(signature)];
        if counter < 0 {
            if self.num_cpus == 1 {
                0
            } else {
                etr_inf
            }
        } else if counter > self.max_rd {
            etr_inf
        } else {
            counter / self.granularity
        }
    }

    /// Decides whether an insertion for `signature` should be skipped.
    ///
    /// True iff the signature is trained, predicts a nonzero ETR, and that ETR
    /// strictly exceeds the largest |ETR| among the candidate lines — the new
    /// block would outlive every resident line's predicted reuse, so caching
    /// it cannot pay off.
    pub fn bypass(&self, signature: u64, max_abs_etr: i64, etr_inf: i64) -> bool {
        let counter = self.counters[self.index(signature)];
        if counter < 0 {
            return false;
        }
        let predicted = if counter > self.max_rd {
            etr_inf
        } else {
            counter / self.granularity
        };
        predicted > 0 && predicted > max_abs_etr
    }

    /// Raw counter value for a signature; test and diagnostics hook.
    pub fn counter(&self, signature: u64) -> i64 {
        self.counters[self.index(signature)]
    }
}
