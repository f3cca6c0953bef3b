//! Hierarchy statistics aggregation and reporting.
//!
//! This module tracks the telemetry the partition controller feeds on. It
//! provides:
//! 1. **Per-(level, core) counters:** miss and instruction counts plus mean
//!    access latency, ingested from request sideband.
//! 2. **Own-level counters:** this cache's access and miss counts per core.
//! 3. **CPI and DRAM:** cycles-per-instruction per core, DRAM access/row-hit
//!    counts and latency.
//! 4. **Reporting:** an aligned text report with selectable sections.
//!
//! Ingest is monotonic: a sample is accepted only if both its miss count and
//! its instruction count are at least the last observed values for that
//! (level, core). Out-of-order or rolled-back telemetry is dropped silently.

use crate::common::Request;

/// One cache level's accumulated statistics for one core.
#[derive(Clone, Copy, Debug, Default)]
pub struct LevelStat {
    /// Cumulative demand misses.
    pub misses: u64,
    /// Cumulative instruction count at the sample point. For this cache's own
    /// level the field counts accesses instead: the local miss ratio is
    /// misses over accesses.
    pub insts: u64,
    /// Mean access latency in cycles.
    pub latency: f64,
}

/// DRAM controller statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct DramStat {
    /// Cumulative access count.
    pub accesses: u64,
    /// Cumulative row-buffer hits.
    pub row_hits: u64,
    /// Mean access latency in cycles.
    pub latency: f64,
}

impl DramStat {
    /// Fraction of DRAM accesses that missed the row buffer.
    pub fn row_miss_fraction(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            (self.accesses - self.row_hits) as f64 / self.accesses as f64
        }
    }
}

/// Per-core, per-level statistics consumed by the partition controller.
pub struct HierarchyStats {
    cache_level: usize,
    num_cpus: usize,
    /// Indexed `[level][core]`; `None` until first ingested.
    per_level: Vec<Vec<Option<LevelStat>>>,
    cpi: Vec<Option<f64>>,
    dram: Option<DramStat>,
}

impl HierarchyStats {
    /// Creates an aggregator for a cache at `cache_level` shared by
    /// `num_cpus` cores. The own-level counters start present at zero.
    pub fn new(cache_level: usize, num_cpus: usize) -> Self {
        let mut per_level = vec![vec![None; num_cpus]; cache_level + 1];
        for core in 0..num_cpus {
            per_level[cache_level][core] = Some(LevelStat::default());
        }
        Self {
            cache_level,
            num_cpus,
            per_level,
            cpi: vec![None; num_cpus],
            dram: None,
        }
    }

    /// Number of cores tracked.
    #[inline]
    pub fn num_cpus(&self) -> usize {
        self.num_cpus
    }

    /// Absorbs the telemetry riding on a request.
    ///
    /// Upper-level samples need the request's core and instruction count;
    /// each is accepted only when monotonically non-decreasing against the
    /// stored value. DRAM samples are accepted under the same rule. CPI is
    /// recomputed whenever the request exposes cycle and instruction counts.
    pub fn ingest(&mut self, req: &Request) {
        if let (Some(core), Some(inst_count)) = (req.context_id, req.inst_count) {
            let core = core as usize;
            if core < self.num_cpus {
                for sample in &req.cache_stats {
                    if sample.level >= self.cache_level {
                        continue;
                    }
                    let slot = &mut self.per_level[sample.level][core];
                    let accept = match slot {
                        Some(prev) => {
                            sample.miss_count >= prev.misses && inst_count >= prev.insts
                        }
                        None => true,
                    };
                    if accept {
                        *slot = Some(LevelStat {
                            misses: sample.miss_count,
                            insts: inst_count,
                            latency: sample.avg_latency,
                        });
                    }
                }
            }
        }

        if let Some(sample) = req.dram_stats {
            let accept = match self.dram {
                Some(prev) => {
                    sample.access_count >= prev.accesses && sample.row_hit_count >= prev.row_hits
                }
                None => true,
            };
            if accept {
                self.dram = Some(DramStat {
                    accesses: sample.access_count,
                    row_hits: sample.row_hit_count,
                    latency: sample.avg_latency,
                });
            }
        }

        if let (Some(core), Some(insts), Some(cycles)) =
            (req.context_id, req.inst_count, req.num_cycles)
        {
            let core = core as usize;
            if core < self.num_cpus && insts > 0 {
                self.cpi[core] = Some(cycles as f64 / insts as f64);
            }
        }
    }

    /// Counts one access to this cache for `core`, and its miss if any.
    pub fn record_access(&mut self, core: u32, hit: bool) {
        let core = core as usize;
        if core >= self.num_cpus {
            return;
        }
        let stat = self.per_level[self.cache_level][core]
            .as_mut()
            .expect("own-level stats are always present");
        stat.insts += 1;
        if !hit {
            stat.misses += 1;
        }
    }

    /// Records this cache's mean access latency for FCP computation.
    pub fn record_own_latency(&mut self, core: u32, latency: f64) {
        let core = core as usize;
        if core < self.num_cpus {
            if let Some(stat) = self.per_level[self.cache_level][core].as_mut() {
                stat.latency = latency;
            }
        }
    }

    /// Statistics for one (level, core), if ever observed.
    pub fn level(&self, level: usize, core: usize) -> Option<&LevelStat> {
        self.per_level.get(level)?.get(core)?.as_ref()
    }

    /// Misses per instruction at one (level, core).
    pub fn miss_rate(&self, level: usize, core: usize) -> Option<f64> {
        let stat = self.level(level, core)?;
        if stat.insts == 0 {
            return None;
        }
        Some(stat.misses as f64 / stat.insts as f64)
    }

    /// This cache's access count for `core`.
    pub fn accesses(&self, core: usize) -> u64 {
        self.level(self.cache_level, core).map_or(0, |s| s.insts)
    }

    /// Cycles per instruction for `core`, if ever observed.
    pub fn cpi(&self, core: usize) -> Option<f64> {
        *self.cpi.get(core)?
    }

    /// DRAM statistics, if the controller has reported yet.
    pub fn dram(&self) -> Option<&DramStat> {
        self.dram.as_ref()
    }

    /// Hierarchy level of the owning cache.
    #[inline]
    pub fn cache_level(&self) -> usize {
        self.cache_level
    }
}

/// Section names accepted by [`HierarchyStats::print_sections`].
///
/// Pass an empty slice to print every section.
pub const STATS_SECTIONS: &[&str] = &["summary", "levels", "dram"];

impl HierarchyStats {
    /// Prints only the requested report sections to stdout.
    ///
    /// Each element of `sections` should be one of `"summary"`, `"levels"`,
    /// or `"dram"`; an empty slice prints all of them.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        if want("summary") {
            println!("\n==========================================================");
            println!("LLC REPLACEMENT STATISTICS (level {})", self.cache_level);
            println!("==========================================================");
            for core in 0..self.num_cpus {
                let stat = self.level(self.cache_level, core).copied().unwrap_or_default();
                let accesses = if stat.insts == 0 { 1 } else { stat.insts };
                println!(
                    "  core{:<2} accesses: {:<10} | misses: {:<10} | miss_rate: {:.2}%",
                    core,
                    stat.insts,
                    stat.misses,
                    (stat.misses as f64 / accesses as f64) * 100.0
                );
                if let Some(cpi) = self.cpi(core) {
                    println!("  core{:<2} cpi      {:.4}", core, cpi);
                }
            }
            println!("----------------------------------------------------------");
        }
        if want("levels") {
            println!("UPPER LEVELS");
            for level in 0..self.cache_level {
                for core in 0..self.num_cpus {
                    if let Some(stat) = self.level(level, core) {
                        println!(
                            "  L{} core{:<2} misses: {:<10} | insts: {:<12} | latency: {:.1}",
                            level, core, stat.misses, stat.insts, stat.latency
                        );
                    }
                }
            }
            println!("----------------------------------------------------------");
        }
        if want("dram") {
            println!("DRAM");
            match self.dram() {
                Some(d) => {
                    println!(
                        "  accesses: {:<10} | row_hits: {:<10} | row_miss: {:.2}% | latency: {:.1}",
                        d.accesses,
                        d.row_hits,
                        d.row_miss_fraction() * 100.0,
                        d.latency
                    );
                }
                None => println!("  (no controller report yet)"),
            }
        }
        println!("==========================================================");
    }

    /// Prints the full report.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
