//! Hawkeye replacement engine with per-core Flock partitioning.
//!
//! Each line carries an RRPV counter, a cache-friendly flag, and its owning
//! core. Insertion consults the PC classifier: friendly blocks enter at their
//! bounded maximum and are refreshed to zero on every hit, averse blocks enter
//! at zero and are pushed to the true maximum when touched. Ratio-paced aging
//! walks all friendly-bounded lines upward so stale friendly blocks
//! eventually become victims; the victim is the first invalid line or the
//! highest RRPV.
//!
//! Training is sampler-driven: a history-sampler hit yields a reuse interval,
//! the per-core occupancy vector renders the approximate-Belady verdict, and
//! the classifier learns the verdict under the PC that opened the interval.
//! The same interval is offered to the core's projection vector grid so the
//! partition controller can read OPT miss counts at every hypothetical
//! budget.

use tracing::{debug, trace};

use super::partition::{self, FlockController, REAGING_PERIOD, REPARTITION_PERIOD};
use super::ReplacementPolicy;
use crate::common::{Request, SatCounter};
use crate::config::{CacheParams, HawkeyeParams};
use crate::predict::{OccupancyVector, PcClassifier};
use crate::sampler::{HistorySampler, SampleOutcome};
use crate::stats::HierarchyStats;

/// Per-line Hawkeye metadata.
#[derive(Clone, Debug)]
pub struct HawkeyeLine {
    /// Re-reference prediction value; the victim scan picks the maximum.
    pub rrpv: SatCounter,
    /// Classifier verdict recorded at fill time.
    pub is_cache_friendly: bool,
    /// Whether the slot holds a block.
    pub valid: bool,
    /// Core that last touched the block.
    pub context_id: u32,
}

/// Hawkeye engine: per-core samplers, occupancy vectors, classifiers, and the
/// Flock partition controller.
pub struct HawkeyeEngine {
    samplers: Vec<HistorySampler>,
    opt_vectors: Vec<OccupancyVector>,
    proj_grids: Vec<Vec<OccupancyVector>>,
    classifiers: Vec<PcClassifier>,
    flock: FlockController,
    stats: HierarchyStats,
    num_rrpv_bits: u32,
    /// `2^W - 2`: the ceiling for friendly lines and for aging.
    friendly_bound: u8,
    log2_block_size: u32,
    set_mask: usize,
    num_cpus: usize,
    partition_on: bool,
    access_count: u64,
}

impl HawkeyeEngine {
    /// Builds an engine for the given cache geometry.
    pub fn new(cache: &CacheParams, params: &HawkeyeParams) -> Self {
        let num_cpus = cache.num_cpus;
        let flock = FlockController::new(num_cpus, cache.num_ways);

        let samplers = (0..num_cpus)
            .map(|_| {
                HistorySampler::new(
                    params.num_sampled_sets,
                    cache.block_size,
                    params.timestamp_bits,
                )
            })
            .collect();
        let opt_vectors: Vec<_> = (0..num_cpus)
            .map(|core| {
                OccupancyVector::new(flock.budget(core) as u64, params.optgen_vector_size)
            })
            .collect();
        let proj_grids = (0..num_cpus)
            .map(|_| {
                (0..=cache.num_ways)
                    .map(|budget| {
                        OccupancyVector::new(budget as u64, params.optgen_vector_size)
                    })
                    .collect()
            })
            .collect();
        let classifiers = (0..num_cpus)
            .map(|_| PcClassifier::new(params.num_pred_entries, params.num_pred_bits))
            .collect();

        Self {
            samplers,
            opt_vectors,
            proj_grids,
            classifiers,
            flock,
            stats: HierarchyStats::new(cache.cache_level, num_cpus),
            num_rrpv_bits: params.num_rrpv_bits,
            friendly_bound: ((1u16 << params.num_rrpv_bits) - 2) as u8,
            log2_block_size: cache.log2_block_size(),
            set_mask: cache.num_sets - 1,
            num_cpus,
            partition_on: params.cache_partition_on,
            access_count: 0,
        }
    }

    /// Current per-core way budgets.
    pub fn partition(&self) -> &[usize] {
        self.flock.partition()
    }

    /// Aging ratio ceiling for a core; diagnostics hook.
    pub fn aging_ratio(&self, core: usize) -> u64 {
        self.flock.ratio_max(core)
    }

    /// OPT decision counts `(cache, dont_cache)` for a core's vector.
    pub fn opt_decisions(&self, core: usize) -> (u64, u64) {
        (
            self.opt_vectors[core].opt_hits(),
            self.opt_vectors[core].opt_misses(),
        )
    }

    #[inline]
    fn set_of(&self, addr: u64) -> usize {
        ((addr >> self.log2_block_size) as usize) & self.set_mask
    }

    /// Offers one reference to the core's sampler; a sampler hit trains the
    /// classifier with the occupancy vector's verdict for the closed interval
    /// and replays the interval into the projection grid.
    fn train_on_sample(&mut self, core: usize, addr: u64, pc: u64, set: usize) {
        let Some(SampleOutcome::Hit {
            last_pc,
            last_ts,
            curr_ts,
        }) = self.samplers[core].sample(addr, pc, set)
        else {
            return;
        };

        let len = self.opt_vectors[core].len();
        let curr = curr_ts as usize % len;
        let last = last_ts as usize % len;

        let verdict = self.opt_vectors[core].should_cache(curr, last);
        trace!(core, last_pc, last, curr, verdict, "interval closed");
        self.classifiers[core].train(u64::from(last_pc), verdict);
        self.opt_vectors[core].add_access(curr);

        for vector in &mut self.proj_grids[core] {
            vector.should_cache(curr, last);
            vector.add_access(curr);
        }
    }

    fn repartition(&mut self) {
        let mut current_costs = Vec::with_capacity(self.num_cpus);
        for core in 0..self.num_cpus {
            match partition::curr_fcp(&self.stats, core) {
                Some(cost) => current_costs.push(cost),
                None => {
                    debug!(core, "repartition skipped: telemetry incomplete");
                    return;
                }
            }
        }

        let stats = &self.stats;
        let grids = &self.proj_grids;
        let opt_vectors = &self.opt_vectors;
        let fcp = |core: usize, budget: usize| -> Option<f64> {
            if budget == 0 {
                Some(current_costs[core])
            } else {
                let vector = grids[core].get(budget)?;
                partition::proj_fcp(stats, core, vector, &opt_vectors[core])
            }
        };
        let cpi = |core: usize| stats.cpi(core);

        let Some(budgets) =
            partition::allocate_budgets(self.flock.num_ways(), self.num_cpus, fcp, cpi)
        else {
            debug!("repartition skipped: no core eligible for allocation");
            return;
        };

        for (core, &budget) in budgets.iter().enumerate() {
            self.opt_vectors[core].set_cache_size(budget as u64);
        }
        self.flock.install(budgets);
    }

    fn recompute_ratios(&mut self) {
        let accesses: Vec<u64> = (0..self.num_cpus)
            .map(|core| self.stats.accesses(core))
            .collect();
        self.flock.recompute_ratios(&accesses);
    }
}

impl ReplacementPolicy for HawkeyeEngine {
    type Line = HawkeyeLine;

    fn instantiate_entry(&self) -> HawkeyeLine {
        HawkeyeLine {
            rrpv: SatCounter::new(self.num_rrpv_bits),
            is_cache_friendly: false,
            valid: false,
            context_id: 0,
        }
    }

    fn invalidate(&mut self, line: &mut HawkeyeLine) {
        line.valid = false;
        line.is_cache_friendly = false;
    }

    fn on_access(&mut self, req: &Request, hit: bool, candidates: &mut [HawkeyeLine]) {
        self.stats.ingest(req);
        self.stats.record_access(req.core(), hit);

        for core in 0..self.num_cpus {
            if !self.flock.tick_aging(core) {
                continue;
            }
            for line in candidates.iter_mut() {
                if line.valid
                    && line.context_id == core as u32
                    && line.rrpv.value() < self.friendly_bound
                {
                    line.rrpv.increment();
                }
                debug_assert!(
                    !(line.is_cache_friendly && line.rrpv.value() > self.friendly_bound),
                    "friendly line aged past its RRPV bound"
                );
            }
        }

        self.access_count += 1;
        if self.partition_on && self.access_count % REPARTITION_PERIOD == 0 {
            self.repartition();
        }
        if self.access_count % REAGING_PERIOD == 0 {
            self.recompute_ratios();
        }
    }

    fn on_hit(&mut self, req: &Request, way: usize, candidates: &mut [HawkeyeLine]) {
        let (Some(pc), Some(context_id)) = (req.pc, req.context_id) else {
            trace!(addr = req.addr, "hit without PC/context; metadata untouched");
            return;
        };
        let core = context_id as usize;
        if core >= self.num_cpus {
            trace!(context_id, "hit from unknown core; metadata untouched");
            return;
        }

        let line = &mut candidates[way];
        if line.is_cache_friendly {
            line.rrpv.reset();
        } else {
            line.rrpv.saturate();
        }
        line.context_id = context_id;

        let set = self.set_of(req.addr);
        self.train_on_sample(core, req.addr, pc, set);
    }

    fn on_miss_insert(&mut self, req: &Request, way: usize, candidates: &mut [HawkeyeLine]) {
        let (Some(pc), Some(context_id)) = (req.pc, req.context_id) else {
            trace!(addr = req.addr, "fill without PC/context; metadata untouched");
            return;
        };
        let core = context_id as usize;
        if core >= self.num_cpus {
            trace!(context_id, "fill from unknown core; metadata untouched");
            return;
        }

        let friendly = self.classifiers[core].predict(pc);
        let line = &mut candidates[way];
        line.is_cache_friendly = friendly;
        if friendly {
            line.rrpv.set(self.friendly_bound);
        } else {
            line.rrpv.reset();
        }
        line.valid = true;
        line.context_id = context_id;
        trace!(addr = req.addr, friendly, rrpv = line.rrpv.value(), "fill");

        let set = self.set_of(req.addr);
        self.train_on_sample(core, req.addr, pc, set);
    }

    fn choose_victim(&self, candidates: &[HawkeyeLine]) -> usize {
        assert!(!candidates.is_empty(), "empty candidate set");

        let mut victim = 0;
        let mut victim_rrpv = candidates[0].rrpv.value();
        for (way, line) in candidates.iter().enumerate() {
            if !line.valid {
                return way;
            }
            if line.rrpv.value() > victim_rrpv {
                victim = way;
                victim_rrpv = line.rrpv.value();
            }
        }
        victim
    }

    fn stats(&self) -> &HierarchyStats {
        &self.stats
    }
}
