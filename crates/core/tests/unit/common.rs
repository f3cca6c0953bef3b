//! Common Building Block Tests.
//!
//! Verifies the saturating counter bounds, the CRC mixers, and the request
//! sideband helpers in isolation.

use llc_core::common::{crc64, crc_short, pc_signature, Request, SatCounter};

// ══════════════════════════════════════════════════════════
// 1. Saturating counter
// ══════════════════════════════════════════════════════════

/// A 3-bit counter moves through its full range and holds at both ends.
#[test]
fn counter_saturates_both_ends() {
    let mut counter = SatCounter::new(3);
    assert_eq!(counter.value(), 0);
    assert_eq!(counter.max(), 7);

    counter.decrement();
    assert_eq!(counter.value(), 0, "decrement at zero is a no-op");

    for expected in 1..=7 {
        counter.increment();
        assert_eq!(counter.value(), expected);
    }
    counter.increment();
    assert_eq!(counter.value(), 7, "increment at max is a no-op");
}

/// Reset and saturate jump to the range ends regardless of current value.
#[test]
fn counter_reset_and_saturate() {
    let mut counter = SatCounter::new(4);
    counter.saturate();
    assert_eq!(counter.value(), 15);
    counter.reset();
    assert_eq!(counter.value(), 0);
}

/// `set` clamps to the representable range.
#[test]
fn counter_set_clamps() {
    let mut counter = SatCounter::new(3);
    counter.set(6);
    assert_eq!(counter.value(), 6);
    counter.set(200);
    assert_eq!(counter.value(), 7);
}

/// The high bit flips exactly at half range.
#[test]
fn counter_high_bit_threshold() {
    let mut counter = SatCounter::new(3);
    for _ in 0..3 {
        counter.increment();
    }
    assert!(!counter.high_bit(), "3 of 7 is below half range");
    counter.increment();
    assert!(counter.high_bit(), "4 of 7 has the high bit set");
}

/// Width 1 and width 8 are the accepted extremes.
#[test]
fn counter_width_extremes() {
    let mut one = SatCounter::new(1);
    one.increment();
    one.increment();
    assert_eq!(one.value(), 1);

    let mut eight = SatCounter::new(8);
    eight.saturate();
    assert_eq!(eight.value(), 255);
}

// ══════════════════════════════════════════════════════════
// 2. CRC mixers
// ══════════════════════════════════════════════════════════

/// The mixers are deterministic and actually permute their input.
#[test]
fn crc_mixers_are_deterministic() {
    assert_eq!(crc64(0xDEAD_BEEF), crc64(0xDEAD_BEEF));
    assert_eq!(crc_short(0xDEAD_BEEF), crc_short(0xDEAD_BEEF));
    assert_ne!(crc64(0xDEAD_BEEF), 0xDEAD_BEEF);
    assert_ne!(crc64(1), crc64(2));
}

/// The deep and shallow mixers disagree (different fold counts).
#[test]
fn crc_depths_differ() {
    assert_ne!(crc64(0x1234_5678), crc_short(0x1234_5678));
}

/// Zero is a fixed point of the fold, so nonzero inputs must be used to
/// distinguish entries.
#[test]
fn crc_zero_fixed_point() {
    assert_eq!(crc64(0), 0);
    assert_eq!(crc_short(0), 0);
}

// ══════════════════════════════════════════════════════════
// 3. PC signatures
// ══════════════════════════════════════════════════════════

/// Signatures fit the requested width.
#[test]
fn signature_respects_width() {
    for pc in [0x400u64, 0x7fff_ffff_1234, u64::MAX] {
        let sig = pc_signature(pc, true, false, 0, 1, 11);
        assert!(sig < (1 << 11), "signature {:#x} exceeds 11 bits", sig);
    }
}

/// On a single core the hit flag separates signatures; on multiple cores the
/// core id does.
#[test]
fn signature_discriminators() {
    let pc = 0x40_1000;
    assert_ne!(
        pc_signature(pc, true, false, 0, 1, 11),
        pc_signature(pc, false, false, 0, 1, 11)
    );
    assert_ne!(
        pc_signature(pc, false, false, 0, 4, 11),
        pc_signature(pc, false, false, 1, 4, 11)
    );
}

// ══════════════════════════════════════════════════════════
// 4. Requests
// ══════════════════════════════════════════════════════════

/// A demand request is trainable; an anonymous one is not.
#[test]
fn request_trainability() {
    let demand = Request::demand(0x1000, 0x400, 2);
    assert!(demand.trainable());
    assert_eq!(demand.core(), 2);

    let anonymous = Request::anonymous(0x1000);
    assert!(!anonymous.trainable());
    assert_eq!(anonymous.core(), 0, "anonymous requests default to core 0");
}
