//! Set-associative LLC shell driving a replacement engine.
//!
//! The shell keeps its own tag array; per-line replacement metadata lives in
//! the engine's strongly typed entries, stored alongside in a flat vector.
//! For each reference the shell looks up the tag, then walks the engine
//! contract: `on_access`, and either `on_hit` or the fill path
//! (`should_bypass` → `choose_victim` → `on_miss_insert`).

use tracing::info;

use crate::common::Request;
use crate::policy::ReplacementPolicy;
use crate::sim::trace::TraceRecord;

/// Aggregate results of a shell run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LlcSummary {
    /// References that hit.
    pub hits: u64,
    /// References that missed and filled a line.
    pub fills: u64,
    /// References that missed and were bypassed.
    pub bypasses: u64,
}

impl LlcSummary {
    /// Total references driven.
    pub fn accesses(&self) -> u64 {
        self.hits + self.fills + self.bypasses
    }
}

/// Minimal tag store owning one replacement engine.
pub struct Llc<P: ReplacementPolicy> {
    policy: P,
    num_sets: usize,
    num_ways: usize,
    block_size: usize,
    tags: Vec<u64>,
    present: Vec<bool>,
    lines: Vec<P::Line>,
    summary: LlcSummary,
}

impl<P: ReplacementPolicy> Llc<P> {
    /// Creates a shell of `num_sets` x `num_ways` lines of `block_size` bytes.
    pub fn new(policy: P, num_sets: usize, num_ways: usize, block_size: usize) -> Self {
        assert!(num_sets.is_power_of_two() && block_size.is_power_of_two());
        assert!(num_ways > 0);
        let total = num_sets * num_ways;
        let lines = (0..total).map(|_| policy.instantiate_entry()).collect();
        Self {
            policy,
            num_sets,
            num_ways,
            block_size,
            tags: vec![0; total],
            present: vec![false; total],
            lines,
            summary: LlcSummary::default(),
        }
    }

    /// The engine, for inspection.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Run results so far.
    pub fn summary(&self) -> LlcSummary {
        self.summary
    }

    #[inline]
    fn set_and_tag(&self, addr: u64) -> (usize, u64) {
        let block = addr / self.block_size as u64;
        let set = (block as usize) % self.num_sets;
        let tag = block / self.num_sets as u64;
        (set, tag)
    }

    /// Drives one reference through the engine contract.
    ///
    /// Returns true on a hit.
    pub fn access(&mut self, req: &Request) -> bool {
        let (set, tag) = self.set_and_tag(req.addr);
        let base = set * self.num_ways;

        let mut hit_way = None;
        for way in 0..self.num_ways {
            if self.present[base + way] && self.tags[base + way] == tag {
                hit_way = Some(way);
                break;
            }
        }

        let candidates = &mut self.lines[base..base + self.num_ways];
        self.policy.on_access(req, hit_way.is_some(), candidates);

        match hit_way {
            Some(way) => {
                self.policy.on_hit(req, way, candidates);
                self.summary.hits += 1;
                true
            }
            None => {
                if self.policy.should_bypass(req, candidates) {
                    self.summary.bypasses += 1;
                    return false;
                }
                let victim = self.policy.choose_victim(candidates);
                self.policy.on_miss_insert(req, victim, candidates);
                self.tags[base + victim] = tag;
                self.present[base + victim] = true;
                self.summary.fills += 1;
                false
            }
        }
    }

    /// Invalidates a block if resident; returns whether it was.
    pub fn invalidate(&mut self, addr: u64) -> bool {
        let (set, tag) = self.set_and_tag(addr);
        let base = set * self.num_ways;
        for way in 0..self.num_ways {
            if self.present[base + way] && self.tags[base + way] == tag {
                self.present[base + way] = false;
                self.policy.invalidate(&mut self.lines[base + way]);
                return true;
            }
        }
        false
    }

    /// Drives a whole trace, building one demand request per record.
    pub fn run(&mut self, records: &[TraceRecord]) -> LlcSummary {
        for record in records {
            let req = Request::demand(record.addr, record.pc, record.core);
            self.access(&req);
        }
        let summary = self.summary;
        info!(
            hits = summary.hits,
            fills = summary.fills,
            bypasses = summary.bypasses,
            "trace complete"
        );
        summary
    }
}
