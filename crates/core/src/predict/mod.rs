//! Prediction structures feeding the replacement decisions.
//!
//! This module provides:
//! 1. **Occupancy vector:** liveness histogram answering "would the optimal
//!    policy have cached this interval" over a wrap-around timeline.
//! 2. **Classifier:** PC-indexed saturating counters voting cache-friendly
//!    versus cache-averse.
//! 3. **Reuse-distance predictor:** per-signature temporal-difference
//!    estimator of time until re-reference.

/// Approximate-Belady occupancy vector.
pub mod optgen;

/// PC-indexed binary classifier.
pub mod classifier;

/// Reuse-distance predictor.
pub mod reuse;

pub use classifier::PcClassifier;
pub use optgen::OccupancyVector;
pub use reuse::ReuseDistPredictor;
