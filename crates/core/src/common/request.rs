//! Access request and telemetry sideband.
//!
//! The cache controller hands the engine one [`Request`] per reference. Besides
//! the block address, a request may carry the program counter, the owning core,
//! instruction and cycle counts for CPI, and statistics sampled from the upper
//! cache levels and the DRAM controller. All sideband fields are optional; the
//! engine degrades gracefully when they are absent (training is skipped,
//! periodic repartitioning aborts).

/// One cache level's statistics sample, forwarded down the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheLevelSample {
    /// Hierarchy level the sample describes (0 = L1I, 1 = L1D, 2 = L2, ...).
    pub level: usize,
    /// Cumulative demand-miss count at that level for the requesting core.
    pub miss_count: u64,
    /// Mean access latency of that level, in cycles.
    pub avg_latency: f64,
}

/// DRAM controller statistics sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DramSample {
    /// Cumulative DRAM access count.
    pub access_count: u64,
    /// Cumulative row-buffer hit count.
    pub row_hit_count: u64,
    /// Mean DRAM access latency, in cycles.
    pub avg_latency: f64,
}

/// A single reference presented to the replacement engine.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// Physical block address.
    pub addr: u64,
    /// Program counter of the instruction that issued the reference.
    pub pc: Option<u64>,
    /// Hardware context (core) the reference belongs to.
    pub context_id: Option<u32>,
    /// Whether the reference was generated by a prefetcher.
    pub is_prefetch: bool,
    /// Committed instruction count of the owning core, if exposed.
    pub inst_count: Option<u64>,
    /// Elapsed cycle count of the owning core, if exposed.
    pub num_cycles: Option<u64>,
    /// Upper-level cache statistics riding along with the request.
    pub cache_stats: Vec<CacheLevelSample>,
    /// DRAM statistics riding along with the request.
    pub dram_stats: Option<DramSample>,
}

impl Request {
    /// A demand reference with full identification, no telemetry.
    pub fn demand(addr: u64, pc: u64, context_id: u32) -> Self {
        Self {
            addr,
            pc: Some(pc),
            context_id: Some(context_id),
            ..Self::default()
        }
    }

    /// A reference carrying only an address (no PC, no core). The engines
    /// count it but cannot train on it.
    pub fn anonymous(addr: u64) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }

    /// Owning core, defaulting to core 0 when the request does not say.
    #[inline]
    pub fn core(&self) -> u32 {
        self.context_id.unwrap_or(0)
    }

    /// True when the request carries everything training needs.
    #[inline]
    pub fn trainable(&self) -> bool {
        self.pc.is_some() && self.context_id.is_some()
    }
}
