//! History sampler for the Hawkeye engine.
//!
//! Per sampled set: an 8-way LRU microcache of bit-packed entries holding a
//! 16-bit hashed address tag, a 16-bit hashed PC, and an 8-bit timestamp, plus
//! a wrapping timestamp counter. A sampler hit yields the reuse interval that
//! the occupancy vector turns into an OPT verdict for classifier training.

use tracing::trace;

use super::{is_sampled_set, SampleOutcome};
use crate::common::crc64;

/// Sampler associativity.
const NUM_WAYS: usize = 8;
/// Address tag width within a packed entry.
const ADDR_TAG_BITS: u32 = 16;
/// PC signature width within a packed entry.
const PC_BITS: u32 = 16;
/// Timestamp width within a packed entry.
const TS_BITS: u32 = 8;

const ADDR_TAG_MASK: u64 = (1 << ADDR_TAG_BITS) - 1;
const PC_MASK: u64 = (1 << PC_BITS) - 1;
const TS_MASK: u64 = (1 << TS_BITS) - 1;

/// One sampler way: 40 payload bits packed into a u64.
#[derive(Clone, Copy, Default)]
struct SamplerLine {
    valid: bool,
    lru: u8,
    packed: u64,
}

impl SamplerLine {
    #[inline]
    fn addr_tag(&self) -> u16 {
        ((self.packed >> (PC_BITS + TS_BITS)) & ADDR_TAG_MASK) as u16
    }

    #[inline]
    fn pc(&self) -> u16 {
        ((self.packed >> TS_BITS) & PC_MASK) as u16
    }

    #[inline]
    fn timestamp(&self) -> u8 {
        (self.packed & TS_MASK) as u8
    }

    #[inline]
    fn pack(addr_tag: u16, pc: u16, timestamp: u8) -> u64 {
        (u64::from(addr_tag) << (PC_BITS + TS_BITS))
            | (u64::from(pc) << TS_BITS)
            | u64::from(timestamp)
    }

    #[inline]
    fn set_pc(&mut self, pc: u16) {
        self.packed = Self::pack(self.addr_tag(), pc, self.timestamp());
    }

    #[inline]
    fn set_timestamp(&mut self, timestamp: u8) {
        self.packed = Self::pack(self.addr_tag(), self.pc(), timestamp);
    }
}

#[derive(Clone)]
struct SamplerSet {
    ways: [SamplerLine; NUM_WAYS],
}

impl SamplerSet {
    fn new() -> Self {
        Self {
            ways: [SamplerLine::default(); NUM_WAYS],
        }
    }

    /// Looks up a tag; on a hit returns the previous (PC, timestamp), writes
    /// the new ones, and promotes the way to most-recently-used.
    fn lookup(&mut self, addr_tag: u16, pc: u16, timestamp: u8) -> Option<(u16, u8)> {
        let hit = self
            .ways
            .iter()
            .position(|w| w.valid && w.addr_tag() == addr_tag)?;

        let previous = (self.ways[hit].pc(), self.ways[hit].timestamp());
        self.ways[hit].set_pc(pc);
        self.ways[hit].set_timestamp(timestamp);

        let promoted_rank = self.ways[hit].lru;
        for way in self.ways.iter_mut() {
            if way.lru > promoted_rank {
                way.lru -= 1;
            }
        }
        self.ways[hit].lru = (NUM_WAYS - 1) as u8;
        Some(previous)
    }

    /// Inserts a fresh entry, evicting an invalid way if one exists and the
    /// least-recently-used way otherwise.
    fn insert(&mut self, addr_tag: u16, pc: u16, timestamp: u8) {
        let victim = self
            .ways
            .iter()
            .position(|w| !w.valid)
            .or_else(|| self.ways.iter().position(|w| w.valid && w.lru == 0))
            .expect("sampler set has neither an invalid nor an LRU way");

        for way in self.ways.iter_mut() {
            if way.valid && way.lru > 0 {
                way.lru -= 1;
            }
        }
        self.ways[victim] = SamplerLine {
            valid: true,
            lru: (NUM_WAYS - 1) as u8,
            packed: SamplerLine::pack(addr_tag, pc, timestamp),
        };
    }

    #[cfg(test)]
    fn lru_ranks(&self) -> Vec<u8> {
        self.ways.iter().filter(|w| w.valid).map(|w| w.lru).collect()
    }
}

/// Set-sampled history cache feeding the Hawkeye training pipeline.
pub struct HistorySampler {
    sets: Vec<SamplerSet>,
    set_timestamp: Vec<u64>,
    log2_sampler_sets: u32,
    log2_block_size: u32,
    timer_size: u64,
}

impl HistorySampler {
    /// Creates a sampler with `num_sets` sampled sets.
    ///
    /// `timestamp_bits` sizes the per-set timers; all timestamp arithmetic
    /// wraps at `2^timestamp_bits`.
    pub fn new(num_sets: usize, block_size: usize, timestamp_bits: u32) -> Self {
        assert!(num_sets.is_power_of_two() && block_size.is_power_of_two());
        Self {
            sets: vec![SamplerSet::new(); num_sets],
            set_timestamp: vec![0; num_sets],
            log2_sampler_sets: num_sets.trailing_zeros(),
            log2_block_size: block_size.trailing_zeros(),
            timer_size: 1 << timestamp_bits,
        }
    }

    /// Offers one reference to the sampler.
    ///
    /// Returns `None` when `set` is outside the sampled subset. Otherwise the
    /// reference is timestamped, looked up, and inserted on a miss; the
    /// outcome carries whatever interval information became available.
    pub fn sample(&mut self, addr: u64, pc: u64, set: usize) -> Option<SampleOutcome> {
        if !is_sampled_set(set, self.log2_sampler_sets) {
            return None;
        }

        let set_index =
            ((addr >> self.log2_block_size) as usize) % self.sets.len();
        let addr_tag =
            (crc64(addr >> (self.log2_block_size + self.log2_sampler_sets)) & ADDR_TAG_MASK) as u16;
        let hashed_pc = (crc64(pc) & PC_MASK) as u16;
        let curr_ts = self.set_timestamp[set_index] as u8;

        trace!(set, set_index, addr_tag, hashed_pc, curr_ts, "sampler probe");

        let outcome = match self.sets[set_index].lookup(addr_tag, hashed_pc, curr_ts) {
            Some((last_pc, last_ts)) => SampleOutcome::Hit {
                last_pc,
                last_ts,
                curr_ts,
            },
            None => {
                self.sets[set_index].insert(addr_tag, hashed_pc, curr_ts);
                SampleOutcome::Miss {
                    curr_ts,
                    evicted: None,
                }
            }
        };

        self.set_timestamp[set_index] =
            (self.set_timestamp[set_index] + 1) % self.timer_size;
        Some(outcome)
    }

    /// Timestamp wrap modulus (`2^timestamp_bits`).
    #[inline]
    pub fn timer_size(&self) -> u64 {
        self.timer_size
    }
}
