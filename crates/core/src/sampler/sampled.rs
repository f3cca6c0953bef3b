//! Sampled cache for the Mockingjay engine.
//!
//! Per sampled set: a 5-way microcache of bit-packed entries holding a 10-bit
//! hashed address tag, an 11-bit PC signature, and an 8-bit timestamp. Victim
//! preference on insert: an invalid way, then any way whose entry is older
//! than the infinite-reuse bound (a dead sampler entry), then the
//! least-recently-used way. Displacing a valid way reports its signature so
//! the reuse-distance predictor can detrain it as a scan.

use tracing::trace;

use super::{elapsed, is_sampled_set, SampleOutcome};
use crate::common::{crc64, pc_signature};

/// Sampler associativity.
const NUM_WAYS: usize = 5;
/// Address tag width within a packed entry.
const ADDR_TAG_BITS: u32 = 10;
/// PC signature width within a packed entry.
pub(crate) const PC_BITS: u32 = 11;
/// Timestamp width within a packed entry.
const TS_BITS: u32 = 8;

const ADDR_TAG_MASK: u64 = (1 << ADDR_TAG_BITS) - 1;
const PC_MASK: u64 = (1 << PC_BITS) - 1;
const TS_MASK: u64 = (1 << TS_BITS) - 1;

/// One sampler way: 29 payload bits packed into a u64.
#[derive(Clone, Copy, Default)]
struct SampledLine {
    valid: bool,
    lru: u8,
    packed: u64,
}

impl SampledLine {
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
    fn refresh(&mut self, pc: u16, timestamp: u8) {
        self.packed = Self::pack(self.addr_tag(), pc, timestamp);
    }
}

#[derive(Clone)]
struct SampledSet {
    ways: [SampledLine; NUM_WAYS],
}

impl SampledSet {
    fn new() -> Self {
        Self {
            ways: [SampledLine::default(); NUM_WAYS],
        }
    }

    fn lookup(&mut self, addr_tag: u16, pc: u16, timestamp: u8) -> Option<(u16, u8)> {
        let hit = self
            .ways
            .iter()
            .position(|w| w.valid && w.addr_tag() == addr_tag)?;

        let previous = (self.ways[hit].pc(), self.ways[hit].timestamp());
        self.ways[hit].refresh(pc, timestamp);

        let promoted_rank = self.ways[hit].lru;
        for way in self.ways.iter_mut() {
            if way.lru > promoted_rank {
                way.lru -= 1;
            }
        }
        self.ways[hit].lru = (NUM_WAYS - 1) as u8;
        Some(previous)
    }

    /// Inserts a fresh entry and returns the (signature, timestamp) of a
    /// valid way it displaced, if any.
    ///
    /// `curr_ts` and `inf_rd` drive the dead-entry preference: a way whose
    /// forward distance to `curr_ts` exceeds `inf_rd` cannot produce a finite
    /// reuse observation anymore and is reclaimed before the LRU way.
    fn insert(
        &mut self,
        addr_tag: u16,
        pc: u16,
        curr_ts: u8,
        timer_size: u64,
        inf_rd: u64,
    ) -> Option<(u16, u8)> {
        let victim = self
            .ways
            .iter()
            .position(|w| !w.valid)
            .or_else(|| {
                self.ways.iter().position(|w| {
                    w.valid
                        && elapsed(u64::from(curr_ts), u64::from(w.timestamp()), timer_size)
                            > inf_rd
                })
            })
            .or_else(|| self.ways.iter().position(|w| w.valid && w.lru == 0))
            .expect("sampled set has neither an invalid nor an LRU way");

        let evicted = if self.ways[victim].valid {
            Some((self.ways[victim].pc(), self.ways[victim].timestamp()))
        } else {
            None
        };

        for way in self.ways.iter_mut() {
            if way.valid && way.lru > 0 {
                way.lru -= 1;
            }
        }
        self.ways[victim] = SampledLine {
            valid: true,
            lru: (NUM_WAYS - 1) as u8,
            packed: SampledLine::pack(addr_tag, pc, curr_ts),
        };
        evicted
    }
}

/// Set-sampled history cache feeding the reuse-distance predictor.
pub struct SampledCache {
    sets: Vec<SampledSet>,
    set_timestamp: Vec<u64>,
    log2_sampler_sets: u32,
    log2_block_size: u32,
    timer_size: u64,
    inf_rd: u64,
    num_cpus: usize,
}

impl SampledCache {
    /// Creates a sampled cache with `num_sets` sampled sets.
    ///
    /// `inf_rd` is the reuse-distance value beyond which an unrevisited entry
    /// is considered dead (the predictor's infinite-distance threshold, in
    /// timestamp units).
    pub fn new(
        num_sets: usize,
        block_size: usize,
        timestamp_bits: u32,
        num_cpus: usize,
        inf_rd: u64,
    ) -> Self {
        assert!(num_sets.is_power_of_two() && block_size.is_power_of_two());
        Self {
            sets: vec![SampledSet::new(); num_sets],
            set_timestamp: vec![0; num_sets],
            log2_sampler_sets: num_sets.trailing_zeros(),
            log2_block_size: block_size.trailing_zeros(),
            timer_size: 1 << timestamp_bits,
            inf_rd,
            num_cpus,
        }
    }

    /// Offers one reference to the sampled cache.
    ///
    /// Returns `None` when `set` is outside the sampled subset. The stored PC
    /// signature folds in the hit/prefetch flags and owning core, matching the
    /// signature the predictor is queried with.
    pub fn sample(
        &mut self,
        addr: u64,
        pc: u64,
        set: usize,
        hit: bool,
        prefetch: bool,
        core: u32,
    ) -> Option<SampleOutcome> {
        if !is_sampled_set(set, self.log2_sampler_sets) {
            return None;
        }

        let set_index =
            ((addr >> self.log2_block_size) as usize) % self.sets.len();
        let addr_tag =
            (crc64(addr >> (self.log2_block_size + self.log2_sampler_sets)) & ADDR_TAG_MASK) as u16;
        let signature = pc_signature(
            pc,
            hit,
            prefetch,
            core,
            self.num_cpus as u32,
            PC_BITS,
        ) as u16;
        let curr_ts = self.set_timestamp[set_index] as u8;

        trace!(set, set_index, addr_tag, signature, curr_ts, "sampled-cache probe");

        let outcome = match self.sets[set_index].lookup(addr_tag, signature, curr_ts) {
            Some((last_pc, last_ts)) => SampleOutcome::Hit {
                last_pc,
                last_ts,
                curr_ts,
            },
            None => {
                let evicted = self.sets[set_index].insert(
                    addr_tag,
                    signature,
                    curr_ts,
                    self.timer_size,
                    self.inf_rd,
                );
                SampleOutcome::Miss { curr_ts, evicted }
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
