//! Replacement decision engines.
//!
//! Implements the per-access decision surface the cache controller drives:
//!
//! - `Hawkeye`: RRPV metadata trained against approximate-Belady verdicts,
//!   with per-core Flock way partitioning and ratio-driven aging.
//! - `Mockingjay`: signed estimated-time-until-re-reference metadata with
//!   clock-based aging and insertion bypass.
//!
//! Each engine strongly types its per-line metadata; the candidate set is
//! borrowed as a slice for the duration of a call and referenced by way index
//! only.

/// Hawkeye engine (Flock-partitioned).
pub mod hawkeye;

/// Mockingjay engine.
pub mod mockingjay;

/// Flock partition controller (FCP, greedy budgets, aging ratios).
pub mod partition;

pub use hawkeye::{HawkeyeEngine, HawkeyeLine};
pub use mockingjay::{MockingjayEngine, MockingjayLine};
pub use partition::FlockController;

use crate::common::Request;
use crate::stats::HierarchyStats;

/// Contract between the cache controller and a replacement engine.
///
/// For each reference the controller calls `on_access` exactly once, then
/// `on_hit` for a resident block, or `should_bypass` / `choose_victim` /
/// `on_miss_insert` for a fill. `candidates` always spans the full target set;
/// within a call the slice is exclusively borrowed and never retained.
///
/// Passing an empty candidate set to `choose_victim` is a contract violation
/// and panics; a request without PC or context identification degrades to a
/// metadata-only update (the predictors cannot train on it).
pub trait ReplacementPolicy {
    /// Per-line replacement metadata owned by the enclosing cache.
    type Line;

    /// Fresh, invalid line metadata for a newly constructed cache slot.
    fn instantiate_entry(&self) -> Self::Line;

    /// Marks a line invalid; invalid lines are always the preferred victim.
    fn invalidate(&mut self, line: &mut Self::Line);

    /// Per-reference bookkeeping: telemetry ingest, counters, aging and
    /// periodic tasks. Called once per access, before hit or fill handling.
    fn on_access(&mut self, req: &Request, hit: bool, candidates: &mut [Self::Line]);

    /// Refreshes metadata of a resident block and trains the predictors.
    fn on_hit(&mut self, req: &Request, way: usize, candidates: &mut [Self::Line]);

    /// Initializes metadata of a newly filled way and trains the predictors.
    fn on_miss_insert(&mut self, req: &Request, way: usize, candidates: &mut [Self::Line]);

    /// Whether the fill for `req` should be skipped entirely, leaving the
    /// candidate set untouched. Engines without a bypass path keep the
    /// default.
    fn should_bypass(&mut self, _req: &Request, _candidates: &[Self::Line]) -> bool {
        false
    }

    /// Picks the way to evict.
    ///
    /// # Panics
    ///
    /// Panics if `candidates` is empty.
    fn choose_victim(&self, candidates: &[Self::Line]) -> usize;

    /// Statistics aggregated by the engine.
    fn stats(&self) -> &HierarchyStats;
}
