//! Predictive last-level cache replacement library.
//!
//! This crate implements two predictive LLC replacement engines and the
//! micro-structures they share:
//! 1. **Common:** saturating counters, CRC-style mixers, request sideband.
//! 2. **Samplers:** set-sampled history microcaches feeding the trainers.
//! 3. **Predictors:** approximate-Belady occupancy vectors, a PC-indexed
//!    binary classifier, and a temporal-difference reuse-distance estimator.
//! 4. **Policies:** the Hawkeye engine with per-core Flock way partitioning,
//!    and the Mockingjay engine with clock-based ETR aging and bypass.
//! 5. **Simulation:** a trace-driven LLC shell, configuration, and
//!    statistics collection.
//!
//! A cache instance is driven from a single thread; engines own their
//! sub-structures exclusively and borrow candidate sets only for the duration
//! of a call.

/// Common types (counters, hashing, requests).
pub mod common;
/// Run configuration (defaults, enums, validation).
pub mod config;
/// Replacement engines and the partition controller.
pub mod policy;
/// Prediction structures (occupancy vector, classifier, reuse distances).
pub mod predict;
/// Set-sampled history caches.
pub mod sampler;
/// Trace-driven LLC shell.
pub mod sim;
/// Statistics aggregation and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Hawkeye engine with Flock partitioning.
pub use crate::policy::HawkeyeEngine;
/// Mockingjay engine.
pub use crate::policy::MockingjayEngine;
/// Engine contract consumed by the cache controller.
pub use crate::policy::ReplacementPolicy;
/// Trace-driven LLC shell; construct with `Llc::new`.
pub use crate::sim::Llc;
