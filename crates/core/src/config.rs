//! Configuration for the replacement core.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the engines. It provides:
//! 1. **Defaults:** Baseline geometry and predictor sizing constants.
//! 2. **Structures:** Hierarchical config for the cache, the Hawkeye engine,
//!    and the Mockingjay engine.
//! 3. **Validation:** Geometry checks performed before an engine is built.
//!
//! Configuration is supplied as JSON (CLI `--config`) or via `Config::default()`.

use serde::Deserialize;
use thiserror::Error;

/// Default configuration constants.
///
/// These values define the baseline configuration when not explicitly
/// overridden in a JSON configuration file.
mod defaults {
    /// Number of sets in the target cache (2048 sets x 16 ways x 64 B = 2 MiB).
    pub const NUM_CACHE_SETS: usize = 2048;

    /// Associativity of the target cache.
    pub const NUM_CACHE_WAYS: usize = 16;

    /// Cache block size in bytes.
    pub const CACHE_BLOCK_SIZE: usize = 64;

    /// Number of hardware contexts sharing the cache.
    pub const NUM_CPUS: usize = 1;

    /// Hierarchy level of this cache (0 = L1I, 1 = L1D, 2 = L2, 3 = LLC).
    pub const CACHE_LEVEL: usize = 3;

    /// RRPV counter width in bits (range 0..=7).
    pub const NUM_RRPV_BITS: u32 = 3;

    /// ETR counter width in bits (signed, |etr| <= 7).
    pub const NUM_ETR_BITS: u32 = 4;

    /// Occupancy vector length (timeline slots).
    pub const OPTGEN_VECTOR_SIZE: usize = 128;

    /// Classifier entry count (13-bit hashed-PC index).
    pub const HAWKEYE_PRED_ENTRIES: usize = 8192;

    /// Classifier counter width in bits.
    pub const HAWKEYE_PRED_BITS: u32 = 3;

    /// Reuse-distance table entry count (11-bit signature index).
    pub const MOCKINGJAY_PRED_ENTRIES: usize = 2048;

    /// Reuse-distance counter width in bits.
    pub const MOCKINGJAY_PRED_BITS: u32 = 8;

    /// Number of sampled sets in the history cache.
    pub const NUM_SAMPLED_SETS: usize = 64;

    /// Timestamp counter width in bits (timer wraps at `2^T`).
    pub const TIMESTAMP_BITS: u32 = 8;

    /// Per-set aging clock width in bits (clock wraps every `2^C` accesses).
    pub const NUM_CLOCK_BITS: u32 = 3;
}

/// Which replacement engine drives the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Hawkeye with per-core Flock partitioning.
    #[default]
    Hawkeye,
    /// Mockingjay (estimated time until re-reference).
    Mockingjay,
}

/// Errors raised by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A structural parameter must be a power of two for index arithmetic.
    #[error("{name} must be a power of two (got {value})")]
    NotPowerOfTwo {
        /// Offending parameter name.
        name: &'static str,
        /// Offending value.
        value: usize,
    },
    /// A counter width is outside its representable range.
    #[error("{name} must be in [{min}, {max}] (got {value})")]
    WidthOutOfRange {
        /// Offending parameter name.
        name: &'static str,
        /// Offending value.
        value: u32,
        /// Smallest accepted width.
        min: u32,
        /// Largest accepted width.
        max: u32,
    },
    /// A parameter exceeds the structure it indexes into.
    #[error("{0}")]
    Inconsistent(String),
}

/// Geometry of the cache this engine serves, plus its hierarchy position.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheParams {
    /// Number of sets in the target cache.
    #[serde(default = "CacheParams::default_sets")]
    pub num_sets: usize,

    /// Associativity of the target cache.
    #[serde(default = "CacheParams::default_ways")]
    pub num_ways: usize,

    /// Cache block size in bytes.
    #[serde(default = "CacheParams::default_block_size")]
    pub block_size: usize,

    /// Number of hardware contexts sharing the cache.
    #[serde(default = "CacheParams::default_num_cpus")]
    pub num_cpus: usize,

    /// Hierarchy level of this cache.
    #[serde(default = "CacheParams::default_cache_level")]
    pub cache_level: usize,
}

impl CacheParams {
    /// Returns the default set count.
    fn default_sets() -> usize {
        defaults::NUM_CACHE_SETS
    }

    /// Returns the default associativity.
    fn default_ways() -> usize {
        defaults::NUM_CACHE_WAYS
    }

    /// Returns the default block size in bytes.
    fn default_block_size() -> usize {
        defaults::CACHE_BLOCK_SIZE
    }

    /// Returns the default context count.
    fn default_num_cpus() -> usize {
        defaults::NUM_CPUS
    }

    /// Returns the default hierarchy level.
    fn default_cache_level() -> usize {
        defaults::CACHE_LEVEL
    }

    /// Base-2 logarithm of the block size.
    #[inline]
    pub fn log2_block_size(&self) -> u32 {
        self.block_size.trailing_zeros()
    }

    /// Base-2 logarithm of the set count.
    #[inline]
    pub fn log2_num_sets(&self) -> u32 {
        self.num_sets.trailing_zeros()
    }
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            num_sets: defaults::NUM_CACHE_SETS,
            num_ways: defaults::NUM_CACHE_WAYS,
            block_size: defaults::CACHE_BLOCK_SIZE,
            num_cpus: defaults::NUM_CPUS,
            cache_level: defaults::CACHE_LEVEL,
        }
    }
}

/// Hawkeye engine parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HawkeyeParams {
    /// RRPV counter width in bits.
    #[serde(default = "HawkeyeParams::default_rrpv_bits")]
    pub num_rrpv_bits: u32,

    /// Occupancy vector length (timeline slots).
    #[serde(default = "HawkeyeParams::default_vector_size")]
    pub optgen_vector_size: usize,

    /// Classifier entry count.
    #[serde(default = "HawkeyeParams::default_pred_entries")]
    pub num_pred_entries: usize,

    /// Classifier counter width in bits.
    #[serde(default = "HawkeyeParams::default_pred_bits")]
    pub num_pred_bits: u32,

    /// Number of sampled sets in the history cache.
    #[serde(default = "HawkeyeParams::default_sampled_sets")]
    pub num_sampled_sets: usize,

    /// Timestamp counter width in bits.
    #[serde(default = "HawkeyeParams::default_timestamp_bits")]
    pub timestamp_bits: u32,

    /// Enables periodic per-core way repartitioning.
    #[serde(default)]
    pub cache_partition_on: bool,
}

impl HawkeyeParams {
    /// Returns the default RRPV width.
    fn default_rrpv_bits() -> u32 {
        defaults::NUM_RRPV_BITS
    }

    /// Returns the default occupancy vector length.
    fn default_vector_size() -> usize {
        defaults::OPTGEN_VECTOR_SIZE
    }

    /// Returns the default classifier entry count.
    fn default_pred_entries() -> usize {
        defaults::HAWKEYE_PRED_ENTRIES
    }

    /// Returns the default classifier counter width.
    fn default_pred_bits() -> u32 {
        defaults::HAWKEYE_PRED_BITS
    }

    /// Returns the default sampled-set count.
    fn default_sampled_sets() -> usize {
        defaults::NUM_SAMPLED_SETS
    }

    /// Returns the default timestamp width.
    fn default_timestamp_bits() -> u32 {
        defaults::TIMESTAMP_BITS
    }
}

impl Default for HawkeyeParams {
    fn default() -> Self {
        Self {
            num_rrpv_bits: defaults::NUM_RRPV_BITS,
            optgen_vector_size: defaults::OPTGEN_VECTOR_SIZE,
            num_pred_entries: defaults::HAWKEYE_PRED_ENTRIES,
            num_pred_bits: defaults::HAWKEYE_PRED_BITS,
            num_sampled_sets: defaults::NUM_SAMPLED_SETS,
            timestamp_bits: defaults::TIMESTAMP_BITS,
            cache_partition_on: false,
        }
    }
}

/// Mockingjay engine parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct MockingjayParams {
    /// ETR counter width in bits (signed).
    #[serde(default = "MockingjayParams::default_etr_bits")]
    pub num_etr_bits: u32,

    /// Reuse-distance table entry count.
    #[serde(default = "MockingjayParams::default_pred_entries")]
    pub num_pred_entries: usize,

    /// Reuse-distance counter width in bits.
    #[serde(default = "MockingjayParams::default_pred_bits")]
    pub num_pred_bits: u32,

    /// Number of sampled sets in the history cache.
    #[serde(default = "MockingjayParams::default_sampled_sets")]
    pub num_sampled_sets: usize,

    /// Timestamp counter width in bits.
    #[serde(default = "MockingjayParams::default_timestamp_bits")]
    pub timestamp_bits: u32,

    /// Per-set aging clock width in bits.
    #[serde(default = "MockingjayParams::default_clock_bits")]
    pub num_clock_bits: u32,
}

impl MockingjayParams {
    /// Returns the default ETR width.
    fn default_etr_bits() -> u32 {
        defaults::NUM_ETR_BITS
    }

    /// Returns the default reuse-distance table size.
    fn default_pred_entries() -> usize {
        defaults::MOCKINGJAY_PRED_ENTRIES
    }

    /// Returns the default reuse-distance counter width.
    fn default_pred_bits() -> u32 {
        defaults::MOCKINGJAY_PRED_BITS
    }

    /// Returns the default sampled-set count.
    fn default_sampled_sets() -> usize {
        defaults::NUM_SAMPLED_SETS
    }

    /// Returns the default timestamp width.
    fn default_timestamp_bits() -> u32 {
        defaults::TIMESTAMP_BITS
    }

    /// Returns the default aging clock width.
    fn default_clock_bits() -> u32 {
        defaults::NUM_CLOCK_BITS
    }
}

impl Default for MockingjayParams {
    fn default() -> Self {
        Self {
            num_etr_bits: defaults::NUM_ETR_BITS,
            num_pred_entries: defaults::MOCKINGJAY_PRED_ENTRIES,
            num_pred_bits: defaults::MOCKINGJAY_PRED_BITS,
            num_sampled_sets: defaults::NUM_SAMPLED_SETS,
            timestamp_bits: defaults::TIMESTAMP_BITS,
            num_clock_bits: defaults::NUM_CLOCK_BITS,
        }
    }
}

/// Root configuration: cache geometry plus both engines' parameter groups.
///
/// # Examples
///
/// ```
/// use llc_core::config::{Config, PolicyKind};
///
/// let json = r#"{
///     "cache": { "num_sets": 1024, "num_ways": 8, "num_cpus": 2 },
///     "policy": "mockingjay",
///     "mockingjay": { "num_etr_bits": 4 }
/// }"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// config.validate().unwrap();
/// assert_eq!(config.policy, PolicyKind::Mockingjay);
/// assert_eq!(config.cache.num_ways, 8);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Target cache geometry.
    #[serde(default)]
    pub cache: CacheParams,

    /// Engine selection.
    #[serde(default)]
    pub policy: PolicyKind,

    /// Hawkeye parameters (used when `policy` is `hawkeye`).
    #[serde(default)]
    pub hawkeye: HawkeyeParams,

    /// Mockingjay parameters (used when `policy` is `mockingjay`).
    #[serde(default)]
    pub mockingjay: MockingjayParams,
}

fn require_pow2(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 || !value.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { name, value });
    }
    Ok(())
}

fn require_width(
    name: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::WidthOutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl Config {
    /// Checks structural consistency before an engine is built.
    ///
    /// Index arithmetic throughout the engines assumes power-of-two geometry;
    /// counter widths are bounded by their backing integer types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_pow2("cache.num_sets", self.cache.num_sets)?;
        require_pow2("cache.block_size", self.cache.block_size)?;
        if self.cache.num_ways == 0 {
            return Err(ConfigError::Inconsistent(
                "cache.num_ways must be non-zero".into(),
            ));
        }
        if self.cache.num_cpus == 0 {
            return Err(ConfigError::Inconsistent(
                "cache.num_cpus must be non-zero".into(),
            ));
        }

        require_pow2("hawkeye.optgen_vector_size", self.hawkeye.optgen_vector_size)?;
        require_pow2("hawkeye.num_pred_entries", self.hawkeye.num_pred_entries)?;
        require_pow2("hawkeye.num_sampled_sets", self.hawkeye.num_sampled_sets)?;
        require_width("hawkeye.num_rrpv_bits", self.hawkeye.num_rrpv_bits, 2, 8)?;
        require_width("hawkeye.num_pred_bits", self.hawkeye.num_pred_bits, 1, 8)?;
        require_width("hawkeye.timestamp_bits", self.hawkeye.timestamp_bits, 1, 8)?;

        require_pow2(
            "mockingjay.num_pred_entries",
            self.mockingjay.num_pred_entries,
        )?;
        require_pow2(
            "mockingjay.num_sampled_sets",
            self.mockingjay.num_sampled_sets,
        )?;
        require_width("mockingjay.num_etr_bits", self.mockingjay.num_etr_bits, 2, 7)?;
        require_width(
            "mockingjay.num_pred_bits",
            self.mockingjay.num_pred_bits,
            6,
            16,
        )?;
        require_width(
            "mockingjay.timestamp_bits",
            self.mockingjay.timestamp_bits,
            1,
            8,
        )?;
        require_width(
            "mockingjay.num_clock_bits",
            self.mockingjay.num_clock_bits,
            1,
            8,
        )?;

        for (name, sampled) in [
            ("hawkeye.num_sampled_sets", self.hawkeye.num_sampled_sets),
            (
                "mockingjay.num_sampled_sets",
                self.mockingjay.num_sampled_sets,
            ),
        ] {
            if sampled > self.cache.num_sets {
                return Err(ConfigError::Inconsistent(format!(
                    "{} ({}) exceeds cache.num_sets ({})",
                    name, sampled, self.cache.num_sets
                )));
            }
        }
        Ok(())
    }
}
