//! Mockingjay replacement engine.
//!
//! Each line carries a signed estimated-time-until-re-reference (ETR). A
//! per-set aging clock decrements every resident line's ETR once per clock
//! wrap, so a line's ETR crossing zero means its predicted reuse has come and
//! gone. The victim is the first invalid line or the line with the largest
//! |ETR|, preferring the already-overdue (negative) one on ties. Fills whose
//! predicted reuse lies beyond every resident line's ETR are bypassed
//! entirely.
//!
//! Training is sampler-driven: a sampled-cache hit closes a reuse interval
//! and moves the signature's reuse-distance estimate toward it; a sampled
//! eviction detrains the displaced signature as a scan.

use tracing::trace;

use super::ReplacementPolicy;
use crate::common::{pc_signature, Request};
use crate::config::{CacheParams, MockingjayParams};
use crate::predict::ReuseDistPredictor;
use crate::sampler::sampled::PC_BITS;
use crate::sampler::{elapsed, SampleOutcome, SampledCache};
use crate::stats::HierarchyStats;

/// Per-line Mockingjay metadata.
#[derive(Clone, Debug)]
pub struct MockingjayLine {
    /// Estimated time until re-reference, in aging-clock granules. Negative
    /// values mark a line that outlived its predicted reuse.
    pub etr: i8,
    /// Whether the slot holds a block.
    pub valid: bool,
    /// Core that last touched the block.
    pub context_id: u32,
}

/// Mockingjay engine: sampled cache, reuse-distance predictor, and per-set
/// aging clocks.
pub struct MockingjayEngine {
    sampler: SampledCache,
    predictor: ReuseDistPredictor,
    age_clock: Vec<u16>,
    clock_period: u16,
    /// `2^(W-1) - 1`: the ETR magnitude bound and the "scan" value.
    etr_inf: i8,
    log2_block_size: u32,
    set_mask: usize,
    num_cpus: usize,
    stats: HierarchyStats,
}

impl MockingjayEngine {
    /// Builds an engine for the given cache geometry.
    pub fn new(cache: &CacheParams, params: &MockingjayParams) -> Self {
        let predictor = ReuseDistPredictor::new(
            params.num_pred_entries,
            params.num_pred_bits,
            params.num_clock_bits,
            cache.num_cpus,
        );
        let sampler = SampledCache::new(
            params.num_sampled_sets,
            cache.block_size,
            params.timestamp_bits,
            cache.num_cpus,
            predictor.infinite_threshold() as u64,
        );
        Self {
            sampler,
            predictor,
            age_clock: vec![0; cache.num_sets],
            clock_period: 1 << params.num_clock_bits,
            etr_inf: ((1u16 << (params.num_etr_bits - 1)) - 1) as i8,
            log2_block_size: cache.log2_block_size(),
            set_mask: cache.num_sets - 1,
            num_cpus: cache.num_cpus,
            stats: HierarchyStats::new(cache.cache_level, cache.num_cpus),
        }
    }

    /// ETR magnitude bound (`2^(W-1) - 1`).
    #[inline]
    pub fn etr_inf(&self) -> i8 {
        self.etr_inf
    }

    #[inline]
    fn set_of(&self, addr: u64) -> usize {
        ((addr >> self.log2_block_size) as usize) & self.set_mask
    }

    fn signature(&self, pc: u64, hit: bool, prefetch: bool, core: u32) -> u64 {
        pc_signature(pc, hit, prefetch, core, self.num_cpus as u32, PC_BITS)
    }

    /// Feeds a sampler outcome into the reuse-distance predictor.
    fn train_from_outcome(&mut self, outcome: SampleOutcome) {
        match outcome {
            SampleOutcome::Hit {
                last_pc,
                last_ts,
                curr_ts,
            } => {
                let distance = elapsed(
                    u64::from(curr_ts),
                    u64::from(last_ts),
                    self.sampler.timer_size(),
                );
                self.predictor.train(u64::from(last_pc), distance as i64);
            }
            SampleOutcome::Miss {
                evicted: Some((pc, _ts)),
                ..
            } => {
                // Displaced without reuse: the signature behaves like a scan.
                self.predictor.train_scan(u64::from(pc));
            }
            SampleOutcome::Miss { evicted: None, .. } => {}
        }
    }

    /// Predicted ETR for a signature, clamped to the line's representable
    /// magnitude.
    fn predicted_etr(&self, signature: u64) -> i8 {
        self.predictor
            .predict(signature, i64::from(self.etr_inf))
            .min(i64::from(self.etr_inf)) as i8
    }

    fn largest_abs_etr(candidates: &[MockingjayLine]) -> i64 {
        candidates
            .iter()
            .filter(|line| line.valid)
            .map(|line| i64::from(line.etr).abs())
            .max()
            .unwrap_or(0)
    }
}

impl ReplacementPolicy for MockingjayEngine {
    type Line = MockingjayLine;

    fn instantiate_entry(&self) -> MockingjayLine {
        MockingjayLine {
            etr: 0,
            valid: false,
            context_id: 0,
        }
    }

    fn invalidate(&mut self, line: &mut MockingjayLine) {
        line.valid = false;
        line.etr = 0;
    }

    fn on_access(&mut self, req: &Request, hit: bool, candidates: &mut [MockingjayLine]) {
        self.stats.ingest(req);
        self.stats.record_access(req.core(), hit);

        let set = self.set_of(req.addr);
        self.age_clock[set] += 1;
        if self.age_clock[set] >= self.clock_period {
            self.age_clock[set] = 0;
            for line in candidates.iter_mut() {
                if line.valid && line.etr.unsigned_abs() < self.etr_inf as u8 {
                    line.etr -= 1;
                }
            }
            trace!(set, "aging clock wrapped");
        }
    }

    fn on_hit(&mut self, req: &Request, way: usize, candidates: &mut [MockingjayLine]) {
        let (Some(pc), Some(context_id)) = (req.pc, req.context_id) else {
            trace!(addr = req.addr, "hit without PC/context; metadata untouched");
            return;
        };

        let set = self.set_of(req.addr);
        if let Some(outcome) =
            self.sampler
                .sample(req.addr, pc, set, true, req.is_prefetch, context_id)
        {
            self.train_from_outcome(outcome);
        }

        let signature = self.signature(pc, true, req.is_prefetch, context_id);
        let line = &mut candidates[way];
        line.etr = self.predicted_etr(signature);
        line.context_id = context_id;
        trace!(addr = req.addr, etr = line.etr, "hit refresh");
    }

    fn on_miss_insert(&mut self, req: &Request, way: usize, candidates: &mut [MockingjayLine]) {
        let (Some(pc), Some(context_id)) = (req.pc, req.context_id) else {
            trace!(addr = req.addr, "fill without PC/context; metadata untouched");
            return;
        };

        let set = self.set_of(req.addr);
        if let Some(outcome) =
            self.sampler
                .sample(req.addr, pc, set, false, req.is_prefetch, context_id)
        {
            self.train_from_outcome(outcome);
        }

        let signature = self.signature(pc, false, req.is_prefetch, context_id);
        let line = &mut candidates[way];
        line.etr = self.predicted_etr(signature);
        line.valid = true;
        line.context_id = context_id;
        trace!(addr = req.addr, etr = line.etr, "fill");
    }

    fn should_bypass(&mut self, req: &Request, candidates: &[MockingjayLine]) -> bool {
        let (Some(pc), Some(context_id)) = (req.pc, req.context_id) else {
            return false;
        };
        let signature = self.signature(pc, false, req.is_prefetch, context_id);
        let bypass = self.predictor.bypass(
            signature,
            Self::largest_abs_etr(candidates),
            i64::from(self.etr_inf),
        );
        if bypass {
            trace!(addr = req.addr, "fill bypassed");
        }
        bypass
    }

    fn choose_victim(&self, candidates: &[MockingjayLine]) -> usize {
        assert!(!candidates.is_empty(), "empty candidate set");

        let mut victim = 0;
        let mut victim_abs = -1i64;
        let mut victim_negative = false;
        for (way, line) in candidates.iter().enumerate() {
            if !line.valid {
                return way;
            }
            let abs = i64::from(line.etr).abs();
            let negative = line.etr < 0;
            if abs > victim_abs || (abs == victim_abs && negative && !victim_negative) {
                victim = way;
                victim_abs = abs;
                victim_negative = negative;
            }
        }
        victim
    }

    fn stats(&self) -> &HierarchyStats {
        &self.stats
    }
}
