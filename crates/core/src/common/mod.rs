//! Common building blocks shared by both replacement engines.
//!
//! This module provides:
//! 1. **Counters:** Width-parameterized saturating counters (RRPV, classifier entries).
//! 2. **Hashing:** CRC-style mixers for address tags and PC signatures.
//! 3. **Requests:** The sideband record a cache access carries into the engine
//!    (PC, owning core, instruction/cycle counts, hierarchy telemetry).

/// Saturating counter with reset/saturate/increment/decrement.
pub mod counter;

/// CRC-style address and PC mixing.
pub mod hash;

/// Access request and telemetry sideband types.
pub mod request;

pub use counter::SatCounter;
pub use hash::{crc64, crc_short, pc_signature};
pub use request::{CacheLevelSample, DramSample, Request};
