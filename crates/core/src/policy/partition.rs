//! Flock partition controller: fetch-cost projection and way budgeting.
//!
//! Every `REPARTITION_PERIOD` accesses the Hawkeye engine asks this module to
//! redistribute the cache's ways among cores. The currency is FCP (fetch cost
//! projection), an estimate of per-core memory cost per instruction:
//!
//! ```text
//! FCP = (mr1 - mr2) * T2 + (mr2 - mr3) * T3 + mr3 * T_dram
//! ```
//!
//! where `mr_k` is the miss rate observed at hierarchy level `k` and `T_k` the
//! measured mean latency below it. The projected variant substitutes the miss
//! rate this cache would see under a hypothetical way budget, read from the
//! per-core projection occupancy-vector grid, and rescales the DRAM latency by
//! the projected miss volume and the row-buffer miss fraction.
//!
//! Budgets are assigned greedily: starting from zero, a credit pool of all
//! ways is handed out in increments of one tenth of the associativity to the
//! core with the highest per-CPI FCP gain. The controller also owns the
//! per-core aging ratio counters that skew RRPV aging toward busier cores.
//!
//! Missing telemetry (an upper level never reported, DRAM silent) makes the
//! FCP functions return `None` and the caller skips the repartition without
//! mutating any state.

use tracing::{debug, trace};

use crate::predict::OccupancyVector;
use crate::stats::HierarchyStats;

/// Accesses between two way-budget recomputations.
pub const REPARTITION_PERIOD: u64 = 10_000;

/// Accesses between two aging-ratio recomputations.
pub const REAGING_PERIOD: u64 = 10_000;

/// Per-core aging pacing state.
///
/// A core's lines age one RRPV step every `ratio_max + 1` accesses; busier
/// cores get larger ratios so their lines decay faster.
#[derive(Clone, Copy, Debug, Default)]
pub struct RatioCounter {
    counter: u64,
    ratio_max: u64,
}

impl RatioCounter {
    /// Advances the counter; true means an aging sweep is due now.
    pub fn tick(&mut self) -> bool {
        if self.counter >= self.ratio_max {
            self.counter = 0;
            true
        } else {
            self.counter += 1;
            false
        }
    }

    /// Current pacing ceiling.
    #[inline]
    pub fn ratio_max(&self) -> u64 {
        self.ratio_max
    }
}

/// Way budgets and aging ratios for the cores sharing one cache.
pub struct FlockController {
    partition: Vec<usize>,
    ratio: Vec<RatioCounter>,
    num_ways: usize,
}

impl FlockController {
    /// Creates a controller with the ways split evenly across cores
    /// (remainder to the lowest-numbered cores) and aging ratios at zero.
    pub fn new(num_cpus: usize, num_ways: usize) -> Self {
        assert!(num_cpus > 0 && num_ways > 0);
        let base = num_ways / num_cpus;
        let remainder = num_ways % num_cpus;
        let partition = (0..num_cpus)
            .map(|c| base + usize::from(c < remainder))
            .collect();
        Self {
            partition,
            ratio: vec![RatioCounter::default(); num_cpus],
            num_ways,
        }
    }

    /// Current per-core way budgets; they always sum to the associativity.
    #[inline]
    pub fn partition(&self) -> &[usize] {
        &self.partition
    }

    /// One core's current budget.
    #[inline]
    pub fn budget(&self, core: usize) -> usize {
        self.partition[core]
    }

    /// Total ways under management.
    #[inline]
    pub fn num_ways(&self) -> usize {
        self.num_ways
    }

    /// Advances one core's aging counter; true means its lines age now.
    #[inline]
    pub fn tick_aging(&mut self, core: usize) -> bool {
        self.ratio[core].tick()
    }

    /// Aging ratio ceiling for a core; diagnostics hook.
    #[inline]
    pub fn ratio_max(&self, core: usize) -> u64 {
        self.ratio[core].ratio_max()
    }

    /// Installs freshly allocated budgets.
    ///
    /// # Panics
    ///
    /// Panics if the budgets do not sum to the managed way count.
    pub fn install(&mut self, budgets: Vec<usize>) {
        assert_eq!(
            budgets.iter().sum::<usize>(),
            self.num_ways,
            "partition budgets must sum to the cache associativity"
        );
        debug!(?budgets, "partition installed");
        self.partition = budgets;
    }

    /// Recomputes aging ratios from per-core access counts.
    ///
    /// The least-active core (non-zero accesses) is the baseline; every other
    /// active core `c` gets `ratio_max = accesses[c] / baseline - 1`, so a
    /// core with twice the traffic ages its lines twice as often. Cores with
    /// no accesses keep their previous ratio.
    pub fn recompute_ratios(&mut self, accesses: &[u64]) {
        assert_eq!(accesses.len(), self.ratio.len());
        let Some(baseline) = accesses.iter().copied().filter(|&a| a > 0).min() else {
            return;
        };
        for (core, &count) in accesses.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let ratio_max = count / baseline - 1;
            trace!(core, ratio_max, "aging ratio");
            self.ratio[core].ratio_max = ratio_max;
        }
    }
}

/// Hierarchy levels feeding the miss-rate chain.
const LEVEL_L1I: usize = 0;
const LEVEL_L1D: usize = 1;
const LEVEL_L2: usize = 2;

/// Miss rates and latencies shared by the current and projected FCP.
struct FcpInputs {
    mr1: f64,
    mr2: f64,
    mr3: f64,
    t2: f64,
    t3: f64,
    inst_l3: u64,
    misses_l3: u64,
}

fn fcp_inputs(stats: &HierarchyStats, core: usize) -> Option<FcpInputs> {
    let l1i = stats.level(LEVEL_L1I, core)?;
    let l1d = stats.level(LEVEL_L1D, core)?;
    let inst_l1 = l1i.insts.max(l1d.insts);
    if inst_l1 == 0 {
        return None;
    }
    let mr1 = (l1i.misses + l1d.misses) as f64 / inst_l1 as f64;

    let l2 = stats.level(LEVEL_L2, core)?;
    if l2.insts == 0 {
        return None;
    }
    let mr2 = l2.misses as f64 / l2.insts as f64;

    let l3 = stats.level(stats.cache_level(), core)?;
    if l3.insts == 0 {
        return None;
    }
    let mr3 = l3.misses as f64 / l3.insts as f64;

    assert!(mr1 >= mr2, "miss-rate differential mr1 - mr2 is negative");
    assert!(mr2 >= mr3, "miss-rate differential mr2 - mr3 is negative");

    Some(FcpInputs {
        mr1,
        mr2,
        mr3,
        t2: l2.latency,
        t3: l3.latency,
        inst_l3: l3.insts,
        misses_l3: l3.misses,
    })
}

/// Current fetch cost for `core`, or `None` while telemetry is incomplete.
pub fn curr_fcp(stats: &HierarchyStats, core: usize) -> Option<f64> {
    let inputs = fcp_inputs(stats, core)?;
    let dram = stats.dram()?;
    Some(
        (inputs.mr1 - inputs.mr2) * inputs.t2
            + (inputs.mr2 - inputs.mr3) * inputs.t3
            + inputs.mr3 * dram.latency,
    )
}

/// Projected fetch cost for `core` under the way budget modeled by
/// `proj_vec`, scaling this level's miss rate by the ratio of projected to
/// observed OPT misses and the DRAM latency by the projected miss volume and
/// row-buffer miss fraction.
pub fn proj_fcp(
    stats: &HierarchyStats,
    core: usize,
    proj_vec: &OccupancyVector,
    curr_vec: &OccupancyVector,
) -> Option<f64> {
    let inputs = fcp_inputs(stats, core)?;
    let dram = stats.dram()?;
    if curr_vec.opt_misses() == 0 || inputs.misses_l3 == 0 {
        return None;
    }

    let frac = proj_vec.opt_misses() as f64 / curr_vec.opt_misses() as f64;
    let mr3_proj = frac * inputs.mr3;
    let est_misses_proj = mr3_proj * inputs.inst_l3 as f64;
    let dram_latency_proj =
        dram.row_miss_fraction() * (est_misses_proj / inputs.misses_l3 as f64) * dram.latency;

    Some(
        (inputs.mr1 - inputs.mr2) * inputs.t2
            + (inputs.mr2 - mr3_proj) * inputs.t3
            + mr3_proj * dram_latency_proj,
    )
}

/// Greedy way allocation.
///
/// `fcp(core, budget)` is the fetch cost of `core` holding `budget` ways —
/// the current cost at budget zero, the projected cost otherwise. Starting
/// from zero budgets and a credit pool of `total_ways`, each round gives one
/// increment (a tenth of the ways, at least one, capped by the remaining
/// pool) to the core maximizing `(fcp(b + step) - fcp(b)) / cpi`. Cores whose
/// cost or CPI is unknown sit out the round; if no core is eligible the
/// allocation fails and the caller keeps the previous budgets.
///
/// On success the budgets sum exactly to `total_ways`.
pub fn allocate_budgets<F, C>(
    total_ways: usize,
    num_cores: usize,
    fcp: F,
    cpi: C,
) -> Option<Vec<usize>>
where
    F: Fn(usize, usize) -> Option<f64>,
    C: Fn(usize) -> Option<f64>,
{
    let delta = (total_ways / 10).max(1);
    let mut budgets = vec![0usize; num_cores];
    let mut pool = total_ways;

    while pool > 0 {
        let step = delta.min(pool);
        let mut best: Option<(usize, f64)> = None;
        for core in 0..num_cores {
            let Some(cpi_c) = cpi(core) else { continue };
            if cpi_c <= 0.0 {
                continue;
            }
            let Some(cost_now) = fcp(core, budgets[core]) else { continue };
            let Some(cost_next) = fcp(core, budgets[core] + step) else { continue };
            let gain = (cost_next - cost_now) / cpi_c;
            trace!(core, budget = budgets[core], gain, "allocation gain");
            if best.map_or(true, |(_, g)| gain > g) {
                best = Some((core, gain));
            }
        }
        let (core, _) = best?;
        budgets[core] += step;
        pool -= step;
    }

    Some(budgets)
}
