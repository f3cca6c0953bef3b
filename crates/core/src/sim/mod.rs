//! Trace-driven simulation shell.
//!
//! This module provides:
//! 1. **LLC shell:** a minimal set-associative tag store that owns one
//!    replacement engine and drives it through the per-access contract.
//! 2. **Traces:** a line-oriented access-trace format and parser.
//!
//! The shell is the boundary collaborator standing in for a full cache
//! controller: it decides hit or miss from its tag array and delegates every
//! replacement decision to the engine. It carries no replacement logic of its
//! own.

/// Set-associative LLC shell.
pub mod llc;

/// Access-trace parsing.
pub mod trace;

pub use llc::{Llc, LlcSummary};
pub use trace::{parse_trace, TraceError, TraceRecord};
