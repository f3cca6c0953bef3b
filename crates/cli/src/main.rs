//! Trace-driven LLC replacement simulator CLI.
//!
//! This binary drives the replacement engines from access traces. It performs:
//! 1. **Run:** parse a trace file, drive it through an LLC shell with the
//!    configured policy, and print the statistics report.
//! 2. **Gen:** emit a synthetic trace (scan, hot-loop, or mixed) for
//!    experimentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::{fs, process};

use llc_core::config::{Config, PolicyKind};
use llc_core::sim::{parse_trace, Llc, LlcSummary, TraceRecord};
use llc_core::{HawkeyeEngine, MockingjayEngine, ReplacementPolicy};

#[derive(Parser, Debug)]
#[command(
    name = "llcsim",
    author,
    version,
    about = "Trace-driven LLC replacement simulator",
    long_about = "Drive an access trace through a predictive LLC replacement engine \
(Hawkeye with Flock partitioning, or Mockingjay) and report hit rates and \
hierarchy statistics.\n\nExamples:\n  llcsim gen --pattern mixed -n 200000 -o trace.txt\n  llcsim run trace.txt --policy mockingjay\n  llcsim run trace.txt --config config.json --stats summary"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Hawkeye,
    Mockingjay,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Pattern {
    /// Sequential sweep over a footprint larger than the cache.
    Scan,
    /// Small hot set revisited from a handful of PCs.
    Hot,
    /// Hot set interleaved with a scanning stream.
    Mixed,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a trace through the configured engine and print statistics.
    Run {
        /// Trace file (`<pc> <addr> [core]` per line, hex).
        trace: String,

        /// JSON configuration file; defaults are used when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Override the configured policy.
        #[arg(short, long)]
        policy: Option<PolicyArg>,

        /// Print only these report sections (summary, levels, dram).
        #[arg(long)]
        stats: Vec<String>,
    },

    /// Generate a synthetic trace.
    Gen {
        /// Output file.
        #[arg(short, long)]
        output: String,

        /// Access pattern.
        #[arg(long, value_enum, default_value = "mixed")]
        pattern: Pattern,

        /// Number of references.
        #[arg(short = 'n', long, default_value_t = 100_000)]
        count: u64,

        /// Number of cores issuing references round-robin.
        #[arg(long, default_value_t = 1)]
        cores: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            trace,
            config,
            policy,
            stats,
        } => cmd_run(&trace, config.as_deref(), policy, &stats),
        Commands::Gen {
            output,
            pattern,
            count,
            cores,
        } => cmd_gen(&output, pattern, count, cores),
    }
}

fn load_config(path: Option<&str>) -> Config {
    let config: Config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config {}: {}", path, e);
                process::exit(1);
            });
            serde_json::from_str(&text).unwrap_or_else(|e| {
                eprintln!("Error parsing config {}: {}", path, e);
                process::exit(1);
            })
        }
        None => Config::default(),
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        process::exit(1);
    }
    config
}

fn print_run<P: ReplacementPolicy>(llc: &Llc<P>, summary: LlcSummary, sections: &[String]) {
    let accesses = summary.accesses().max(1);
    println!(
        "accesses: {}  hits: {}  fills: {}  bypasses: {}  hit_rate: {:.2}%",
        summary.accesses(),
        summary.hits,
        summary.fills,
        summary.bypasses,
        (summary.hits as f64 / accesses as f64) * 100.0
    );
    llc.policy().stats().print_sections(sections);
}

fn cmd_run(
    trace_path: &str,
    config_path: Option<&str>,
    policy: Option<PolicyArg>,
    stats: &[String],
) {
    let mut config = load_config(config_path);
    match policy {
        Some(PolicyArg::Hawkeye) => config.policy = PolicyKind::Hawkeye,
        Some(PolicyArg::Mockingjay) => config.policy = PolicyKind::Mockingjay,
        None => {}
    }

    let text = fs::read_to_string(trace_path).unwrap_or_else(|e| {
        eprintln!("Error reading trace {}: {}", trace_path, e);
        process::exit(1);
    });
    let records = parse_trace(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing trace {}: {}", trace_path, e);
        process::exit(1);
    });

    println!(
        "[*] {} references, policy {:?}, {} sets x {} ways",
        records.len(),
        config.policy,
        config.cache.num_sets,
        config.cache.num_ways
    );

    match config.policy {
        PolicyKind::Hawkeye => {
            let engine = HawkeyeEngine::new(&config.cache, &config.hawkeye);
            let mut llc = Llc::new(
                engine,
                config.cache.num_sets,
                config.cache.num_ways,
                config.cache.block_size,
            );
            let summary = llc.run(&records);
            print_run(&llc, summary, stats);
            println!("partition: {:?}", llc.policy().partition());
        }
        PolicyKind::Mockingjay => {
            let engine = MockingjayEngine::new(&config.cache, &config.mockingjay);
            let mut llc = Llc::new(
                engine,
                config.cache.num_sets,
                config.cache.num_ways,
                config.cache.block_size,
            );
            let summary = llc.run(&records);
            print_run(&llc, summary, stats);
        }
    }
}

/// Small xorshift generator so traces are reproducible without extra crates.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

fn cmd_gen(output: &str, pattern: Pattern, count: u64, cores: u32) {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let hot_blocks: u64 = 512;
    let scan_span: u64 = 1 << 22;

    let mut records: Vec<TraceRecord> = Vec::with_capacity(count as usize);
    for i in 0..count {
        let core = (i % u64::from(cores.max(1))) as u32;
        let record = match pattern {
            Pattern::Scan => TraceRecord {
                pc: 0x40_0000 + (i % 4) * 4,
                addr: (i * 64) % scan_span,
                core,
            },
            Pattern::Hot => TraceRecord {
                pc: 0x40_0100 + (rng.next() % 8) * 4,
                addr: (rng.next() % hot_blocks) * 64,
                core,
            },
            Pattern::Mixed => {
                if rng.next() % 2 == 0 {
                    TraceRecord {
                        pc: 0x40_0100 + (rng.next() % 8) * 4,
                        addr: (rng.next() % hot_blocks) * 64,
                        core,
                    }
                } else {
                    TraceRecord {
                        pc: 0x40_0000,
                        addr: (i * 64) % scan_span,
                        core,
                    }
                }
            }
        };
        records.push(record);
    }

    let mut lines = String::with_capacity(records.len() * 24);
    for r in &records {
        lines.push_str(&format!("{:x} {:x} {:x}\n", r.pc, r.addr, r.core));
    }
    if let Err(e) = fs::write(output, lines) {
        eprintln!("Error writing {}: {}", output, e);
        process::exit(1);
    }
    println!("[*] wrote {} references to {}", records.len(), output);
}
