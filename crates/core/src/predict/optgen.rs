//! Occupancy vector: approximate Belady (OPT) decisions on a circular timeline.
//!
//! The vector holds one occupancy counter per timeline slot. A reuse interval
//! `[last, curr)` can be cached by the optimal policy iff no slot inside the
//! interval is already occupied by `cache_size` other live intervals; caching
//! the interval raises the occupancy of every slot it covers. A slot value of
//! `cache_size` therefore proves OPT would have evicted the block.
//!
//! `cache_size` is mutable so a partition controller can resize the modeled
//! cache share without discarding history.

/// Liveness histogram over a wrap-around timeline of fixed length.
#[derive(Clone, Debug)]
pub struct OccupancyVector {
    liveness: Vec<u32>,
    cache_size: u64,
    num_cache: u64,
    num_dont_cache: u64,
    accesses: u64,
}

impl OccupancyVector {
    /// Creates a vector of `capacity` slots modeling `cache_size` ways.
    pub fn new(cache_size: u64, capacity: usize) -> Self {
        assert!(capacity > 0, "occupancy vector capacity must be non-zero");
        Self {
            liveness: vec![0; capacity],
            cache_size,
            num_cache: 0,
            num_dont_cache: 0,
            accesses: 0,
        }
    }

    /// Number of timeline slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.liveness.len()
    }

    /// True when the vector has no slots (never happens post-construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.liveness.is_empty()
    }

    /// Currently modeled cache share, in ways.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    /// Resizes the modeled cache share without touching history.
    #[inline]
    pub fn set_cache_size(&mut self, ways: u64) {
        self.cache_size = ways;
    }

    /// Marks a demand access boundary: slot `quanta` starts a fresh interval.
    pub fn add_access(&mut self, quanta: usize) {
        self.accesses += 1;
        self.liveness[quanta] = 0;
    }

    /// Marks a prefetch boundary; resets the slot without counting an access.
    pub fn add_prefetch(&mut self, quanta: usize) {
        self.liveness[quanta] = 0;
    }

    /// Decides whether OPT would cache a block whose reuse interval is
    /// `[last, curr)`, wrapping at the vector length.
    ///
    /// On a positive decision the interval's slots are incremented; a negative
    /// decision leaves the vector unchanged. Either way the decision counters
    /// are updated.
    pub fn should_cache(&mut self, curr: usize, last: usize) -> bool {
        debug_assert!(curr < self.liveness.len() && last < self.liveness.len());

        let mut cache = true;
        let mut i = last;
        while i != curr {
            if u64::from(self.liveness[i]) >= self.cache_size {
                cache = false;
                break;
            }
            i = (i + 1) % self.liveness.len();
        }

        if cache {
            let mut i = last;
            while i != curr {
                self.liveness[i] += 1;
                i = (i + 1) % self.liveness.len();
            }
            self.num_cache += 1;
        } else {
            self.num_dont_cache += 1;
        }

        cache
    }

    /// Number of intervals OPT decided to cache.
    #[inline]
    pub fn opt_hits(&self) -> u64 {
        self.num_cache
    }

    /// Number of intervals OPT decided not to cache.
    #[inline]
    pub fn opt_misses(&self) -> u64 {
        self.num_dont_cache
    }

    /// Number of demand access boundaries recorded.
    #[inline]
    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    /// Occupancy of one timeline slot; test and diagnostics hook.
    #[inline]
    pub fn occupancy(&self, slot: usize) -> u32 {
        self.liveness[slot]
    }
}
