//! Statistics Aggregation Tests.
//!
//! Verifies monotonic telemetry ingest, miss-rate derivation, CPI capture,
//! and the fetch-cost computations over hand-built hierarchies.

use llc_core::common::{CacheLevelSample, DramSample, Request};
use llc_core::policy::partition::{curr_fcp, proj_fcp};
use llc_core::predict::OccupancyVector;
use llc_core::stats::HierarchyStats;

/// A request from `core` carrying one upper-level sample.
fn stat_req(core: u32, level: usize, misses: u64, insts: u64, latency: f64) -> Request {
    Request {
        addr: 0,
        pc: Some(0x400),
        context_id: Some(core),
        inst_count: Some(insts),
        cache_stats: vec![CacheLevelSample {
            level,
            miss_count: misses,
            avg_latency: latency,
        }],
        ..Request::default()
    }
}

/// Builds a consistent one-core hierarchy:
/// mr1 = 0.06, mr2 = 0.04, mr3 = 0.02, T2 = 10, T3 = 30, T_dram = 100.
fn full_hierarchy() -> HierarchyStats {
    let mut stats = HierarchyStats::new(3, 1);
    stats.ingest(&stat_req(0, 0, 30, 1000, 2.0));
    stats.ingest(&stat_req(0, 1, 30, 1000, 2.0));
    stats.ingest(&stat_req(0, 2, 40, 1000, 10.0));
    stats.ingest(&Request {
        dram_stats: Some(DramSample {
            access_count: 1000,
            row_hit_count: 600,
            avg_latency: 100.0,
        }),
        ..Request::default()
    });
    // 100 own accesses, 2 of them misses.
    for i in 0..100 {
        stats.record_access(0, i >= 2);
    }
    stats.record_own_latency(0, 30.0);
    stats
}

// ══════════════════════════════════════════════════════════
// 1. Monotonic ingest
// ══════════════════════════════════════════════════════════

/// A rolled-back sample (lower miss or instruction count) is dropped.
#[test]
fn ingest_rejects_rollbacks() {
    let mut stats = HierarchyStats::new(3, 1);
    stats.ingest(&stat_req(0, 1, 50, 1000, 2.0));
    assert_eq!(stats.level(1, 0).unwrap().misses, 50);

    stats.ingest(&stat_req(0, 1, 40, 1100, 2.0));
    assert_eq!(stats.level(1, 0).unwrap().misses, 50, "miss count went back");

    stats.ingest(&stat_req(0, 1, 60, 900, 2.0));
    assert_eq!(stats.level(1, 0).unwrap().insts, 1000, "inst count went back");

    stats.ingest(&stat_req(0, 1, 60, 1100, 3.0));
    assert_eq!(stats.level(1, 0).unwrap().misses, 60);
    assert_eq!(stats.level(1, 0).unwrap().insts, 1100);
}

/// DRAM samples follow the same monotonic rule.
#[test]
fn ingest_dram_monotonic() {
    let mut stats = HierarchyStats::new(3, 1);
    let dram = |accesses, row_hits| Request {
        dram_stats: Some(DramSample {
            access_count: accesses,
            row_hit_count: row_hits,
            avg_latency: 90.0,
        }),
        ..Request::default()
    };

    assert!(stats.dram().is_none(), "no report before the first sample");
    stats.ingest(&dram(100, 60));
    stats.ingest(&dram(90, 70));
    assert_eq!(stats.dram().unwrap().accesses, 100, "rollback dropped");
    stats.ingest(&dram(200, 120));
    assert_eq!(stats.dram().unwrap().accesses, 200);
    assert!((stats.dram().unwrap().row_miss_fraction() - 0.4).abs() < 1e-12);
}

/// Samples at or above this cache's own level are ignored; a sample without
/// core or instruction identification is ignored.
#[test]
fn ingest_ignores_foreign_levels() {
    let mut stats = HierarchyStats::new(3, 1);
    stats.ingest(&stat_req(0, 3, 50, 1000, 2.0));
    assert_eq!(stats.level(3, 0).unwrap().misses, 0, "own level untouched");

    let mut no_core = stat_req(0, 1, 50, 1000, 2.0);
    no_core.context_id = None;
    stats.ingest(&no_core);
    assert!(stats.level(1, 0).is_none());
}

/// CPI is recomputed from cycle and instruction counts.
#[test]
fn ingest_cpi() {
    let mut stats = HierarchyStats::new(3, 2);
    assert!(stats.cpi(1).is_none());
    stats.ingest(&Request {
        context_id: Some(1),
        inst_count: Some(1000),
        num_cycles: Some(1500),
        ..Request::default()
    });
    assert!((stats.cpi(1).unwrap() - 1.5).abs() < 1e-12);
}

/// Own-level counters accumulate accesses and misses per core.
#[test]
fn own_level_counters() {
    let mut stats = HierarchyStats::new(3, 2);
    stats.record_access(0, true);
    stats.record_access(0, false);
    stats.record_access(1, false);
    assert_eq!(stats.accesses(0), 2);
    assert_eq!(stats.level(3, 0).unwrap().misses, 1);
    assert_eq!(stats.accesses(1), 1);
    assert!((stats.miss_rate(3, 1).unwrap() - 1.0).abs() < 1e-12);
}

// ══════════════════════════════════════════════════════════
// 2. Fetch-cost computation
// ══════════════════════════════════════════════════════════

/// The current fetch cost combines the miss-rate chain with the measured
/// latencies: (0.06-0.04)*10 + (0.04-0.02)*30 + 0.02*100 = 2.8.
#[test]
fn curr_fcp_value() {
    let stats = full_hierarchy();
    let fcp = curr_fcp(&stats, 0).unwrap();
    assert!((fcp - 2.8).abs() < 1e-9, "fcp = {}", fcp);
}

/// Missing DRAM or upper-level telemetry makes the cost unavailable instead
/// of wrong.
#[test]
fn curr_fcp_requires_telemetry() {
    let mut stats = HierarchyStats::new(3, 1);
    assert!(curr_fcp(&stats, 0).is_none(), "nothing reported yet");

    stats.ingest(&stat_req(0, 0, 30, 1000, 2.0));
    stats.ingest(&stat_req(0, 1, 30, 1000, 2.0));
    stats.ingest(&stat_req(0, 2, 40, 1000, 10.0));
    stats.record_access(0, false);
    assert!(curr_fcp(&stats, 0).is_none(), "DRAM still silent");
}

/// An inverted miss-rate chain is a contract violation.
#[test]
#[should_panic(expected = "miss-rate differential")]
fn curr_fcp_asserts_ordering() {
    let mut stats = HierarchyStats::new(3, 1);
    // L2 misses more often per instruction than L1 in aggregate.
    stats.ingest(&stat_req(0, 0, 10, 1000, 2.0));
    stats.ingest(&stat_req(0, 1, 10, 1000, 2.0));
    stats.ingest(&stat_req(0, 2, 400, 1000, 10.0));
    stats.ingest(&Request {
        dram_stats: Some(DramSample {
            access_count: 100,
            row_hit_count: 50,
            avg_latency: 100.0,
        }),
        ..Request::default()
    });
    stats.record_access(0, false);
    curr_fcp(&stats, 0);
}

/// The projected cost scales this level's miss rate by the projected OPT miss
/// ratio and rescales the DRAM latency accordingly.
#[test]
fn proj_fcp_scales_miss_rate() {
    let stats = full_hierarchy();

    // Current vector saw 4 OPT misses; the projected budget would only see 2.
    let mut curr_vec = OccupancyVector::new(1, 4);
    let mut proj_vec = OccupancyVector::new(2, 4);
    for _ in 0..4 {
        curr_vec.should_cache(1, 0); // slot 0 occupied after the first
        proj_vec.should_cache(1, 0);
    }
    assert_eq!(curr_vec.opt_misses(), 3);
    assert_eq!(proj_vec.opt_misses(), 2);

    let projected = proj_fcp(&stats, 0, &proj_vec, &curr_vec).unwrap();
    // frac = 2/3, mr3_proj = 0.0133..; est_misses = 1.333; row_miss = 0.4.
    let mr3_proj = (2.0 / 3.0) * 0.02;
    let dram_proj = 0.4 * (mr3_proj * 100.0 / 2.0) * 100.0;
    let expected = (0.06 - 0.04) * 10.0 + (0.04 - mr3_proj) * 30.0 + mr3_proj * dram_proj;
    assert!(
        (projected - expected).abs() < 1e-9,
        "projected = {}, expected = {}",
        projected,
        expected
    );
}

/// A projection with no observed OPT misses yet is unavailable.
#[test]
fn proj_fcp_requires_history() {
    let stats = full_hierarchy();
    let curr_vec = OccupancyVector::new(1, 4);
    let proj_vec = OccupancyVector::new(2, 4);
    assert!(proj_fcp(&stats, 0, &proj_vec, &curr_vec).is_none());
}
