//! Predictor Tests.
//!
//! Verifies the occupancy vector's approximate-Belady walk, the PC
//! classifier's vote behavior, and the reuse-distance predictor's
//! temporal-difference training and bypass rule.

use llc_core::predict::{OccupancyVector, PcClassifier, ReuseDistPredictor};

// ══════════════════════════════════════════════════════════
// 1. Occupancy vector
// ══════════════════════════════════════════════════════════

/// Overlapping intervals on an 8-slot timeline with a 2-way share: the walk
/// admits intervals until a slot reaches the share, then refuses without
/// mutating the vector.
#[test]
fn optgen_overlapping_intervals() {
    let mut vector = OccupancyVector::new(2, 8);

    // [0, 4): all slots empty.
    assert!(vector.should_cache(4, 0));
    for slot in 0..4 {
        assert_eq!(vector.occupancy(slot), 1);
    }

    // [1, 5): slots 1..=3 at one, still under the share.
    assert!(vector.should_cache(5, 1));
    assert_eq!(vector.occupancy(0), 1);
    for slot in 1..4 {
        assert_eq!(vector.occupancy(slot), 2);
    }
    assert_eq!(vector.occupancy(4), 1);

    // [0, 5): slots 1..=3 already hold two live intervals.
    assert!(!vector.should_cache(5, 0));
    // The refused interval must leave the vector untouched.
    assert_eq!(vector.occupancy(0), 1);
    assert_eq!(vector.occupancy(2), 2);

    // [2, 6): slot 2 is at the share as well.
    assert!(!vector.should_cache(6, 2));
    assert_eq!(vector.occupancy(2), 2);

    assert_eq!(vector.opt_hits(), 2);
    assert_eq!(vector.opt_misses(), 2);
}

/// The walk wraps past the end of the timeline.
#[test]
fn optgen_wraps_around() {
    let mut vector = OccupancyVector::new(1, 8);
    // [6, 2) covers slots 6, 7, 0, 1.
    assert!(vector.should_cache(2, 6));
    assert_eq!(vector.occupancy(6), 1);
    assert_eq!(vector.occupancy(7), 1);
    assert_eq!(vector.occupancy(0), 1);
    assert_eq!(vector.occupancy(1), 1);
    assert_eq!(vector.occupancy(2), 0);

    // A second pass over slot 7 exceeds the single-way share.
    assert!(!vector.should_cache(0, 7));
}

/// An empty interval (`last == curr`) is always cacheable and touches nothing.
#[test]
fn optgen_empty_interval() {
    let mut vector = OccupancyVector::new(1, 4);
    assert!(vector.should_cache(3, 3));
    for slot in 0..4 {
        assert_eq!(vector.occupancy(slot), 0);
    }
}

/// Enlarging the share can only turn refusals into admissions, never the
/// other way around.
#[test]
fn optgen_monotonic_in_cache_size() {
    // Build identical histories under increasing shares and compare the
    // decision sequence pointwise.
    let intervals = [(4, 0), (5, 1), (5, 0), (6, 2), (7, 3), (3, 6), (2, 7)];
    let mut decisions: Vec<Vec<bool>> = Vec::new();
    for share in 1..=4u64 {
        let mut vector = OccupancyVector::new(share, 8);
        decisions.push(
            intervals
                .iter()
                .map(|&(curr, last)| vector.should_cache(curr, last))
                .collect(),
        );
    }
    for smaller in 0..decisions.len() - 1 {
        for (i, (&small, &large)) in decisions[smaller]
            .iter()
            .zip(&decisions[smaller + 1])
            .enumerate()
        {
            assert!(
                !small || large,
                "interval {} cached under share {} but not under {}",
                i,
                smaller + 1,
                smaller + 2
            );
        }
    }
}

/// `add_access` opens a fresh interval at the slot and counts the access;
/// `add_prefetch` resets without counting.
#[test]
fn optgen_access_boundaries() {
    let mut vector = OccupancyVector::new(2, 8);
    assert!(vector.should_cache(4, 0));
    vector.add_access(2);
    assert_eq!(vector.occupancy(2), 0);
    assert_eq!(vector.accesses(), 1);

    vector.add_prefetch(3);
    assert_eq!(vector.occupancy(3), 0);
    assert_eq!(vector.accesses(), 1, "prefetches do not count as accesses");
}

/// Resizing the share applies to subsequent decisions only.
#[test]
fn optgen_resize_share() {
    let mut vector = OccupancyVector::new(1, 8);
    assert!(vector.should_cache(4, 0));
    assert!(!vector.should_cache(4, 0), "slot 0 full under one way");
    vector.set_cache_size(2);
    assert!(vector.should_cache(4, 0), "two ways admit a second interval");
}

// ══════════════════════════════════════════════════════════
// 2. PC classifier
// ══════════════════════════════════════════════════════════

/// Training toward friendly flips the prediction once the counter crosses
/// half range; equal opposite training returns the starting verdict.
#[test]
fn classifier_round_trip() {
    let mut classifier = PcClassifier::new(64, 3);
    let pc = 0x40_2000;
    // Training is keyed by the hashed signature the sampler stores.
    let signature = llc_core::common::crc64(pc) % 64;

    assert!(!classifier.predict(pc), "zeroed counters predict averse");

    for _ in 0..8 {
        classifier.train(signature, true);
    }
    assert!(classifier.predict(pc), "saturated counter predicts friendly");

    for _ in 0..8 {
        classifier.train(signature, false);
    }
    assert!(
        !classifier.predict(pc),
        "equal averse training returns the starting verdict"
    );
}

/// The verdict flips exactly when the high bit does.
#[test]
fn classifier_threshold() {
    let mut classifier = PcClassifier::new(64, 3);
    let pc = 0x40_3000;
    let signature = llc_core::common::crc64(pc) % 64;

    for _ in 0..3 {
        classifier.train(signature, true);
    }
    assert!(!classifier.predict(pc), "counter 3 of 7 is still averse");
    classifier.train(signature, true);
    assert!(classifier.predict(pc), "counter 4 of 7 is friendly");
}

// ══════════════════════════════════════════════════════════
// 3. Reuse-distance predictor
// ══════════════════════════════════════════════════════════

/// The first observation is stored verbatim; later ones move the estimate by
/// a bounded temporal-difference step of at least one.
#[test]
fn reuse_temporal_difference() {
    let mut rdp = ReuseDistPredictor::new(64, 8, 2, 1);
    let sig = 7;

    assert_eq!(rdp.counter(sig), -1, "entries start untrained");
    rdp.train(sig, 100);
    assert_eq!(rdp.counter(sig), 100);

    // Sample far above: step is |164 - 100| / 16 = 4.
    rdp.train(sig, 164);
    assert_eq!(rdp.counter(sig), 104);

    // Sample just below: step clamps to 1.
    rdp.train(sig, 103);
    assert_eq!(rdp.counter(sig), 103);

    // Sample equal: no movement.
    rdp.train(sig, 103);
    assert_eq!(rdp.counter(sig), 103);
}

/// Scan detraining pushes the estimate toward the top of the range, and the
/// top band predicts an infinite reuse distance.
#[test]
fn reuse_scan_detraining() {
    let mut rdp = ReuseDistPredictor::new(64, 8, 2, 1);
    let sig = 3;
    rdp.train_scan(sig);
    assert_eq!(rdp.counter(sig), 255, "first-time scan stores the maximum");
    assert!(rdp.counter(sig) > rdp.infinite_threshold());
    assert_eq!(rdp.predict(sig, 7), 7, "scan entries predict the ETR bound");
}

/// Untrained entries assume immediate reuse on one core and a scan on many.
#[test]
fn reuse_untrained_defaults() {
    let single = ReuseDistPredictor::new(64, 8, 2, 1);
    assert_eq!(single.predict(5, 7), 0);

    let shared = ReuseDistPredictor::new(64, 8, 2, 4);
    assert_eq!(shared.predict(5, 7), 7);
}

/// Predictions come back in aging-clock granules.
#[test]
fn reuse_prediction_granularity() {
    let mut rdp = ReuseDistPredictor::new(64, 8, 2, 1);
    rdp.train(9, 20);
    assert_eq!(rdp.predict(9, 7), 5, "20 timestamps over a 4-access clock");
}

/// Bypass fires only for a trained, nonzero prediction strictly above the
/// set's largest |ETR|.
#[test]
fn reuse_bypass_rule() {
    let mut rdp = ReuseDistPredictor::new(64, 8, 2, 1);
    let sig = 11;

    assert!(!rdp.bypass(sig, 3, 7), "untrained signatures never bypass");

    rdp.train(sig, 20); // predicts 5
    assert!(rdp.bypass(sig, 3, 7), "5 outlives every line at |etr| <= 3");
    assert!(!rdp.bypass(sig, 5, 7), "5 does not strictly exceed 5");
    assert!(!rdp.bypass(sig, 7, 7));

    let mut short = ReuseDistPredictor::new(64, 8, 2, 1);
    short.train(sig, 2); // predicts 0
    assert!(!short.bypass(sig, 0, 7), "a zero prediction never bypasses");
}
