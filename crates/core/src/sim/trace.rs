//! Line-oriented access traces.
//!
//! Each non-empty line holds `<pc> <addr> [core]`, hexadecimal with an
//! optional `0x` prefix; `core` defaults to 0. Lines starting with `#` are
//! comments.

use thiserror::Error;

/// One parsed trace reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    /// Program counter issuing the reference.
    pub pc: u64,
    /// Block address referenced.
    pub addr: u64,
    /// Issuing core.
    pub core: u32,
}

/// Errors raised while parsing a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A line did not have two or three fields.
    #[error("line {line}: expected '<pc> <addr> [core]', got {got} fields")]
    FieldCount {
        /// 1-based line number.
        line: usize,
        /// Number of fields found.
        got: usize,
    },
    /// A field was not a hexadecimal integer.
    #[error("line {line}: bad {field} value '{value}'")]
    BadField {
        /// 1-based line number.
        line: usize,
        /// Field name.
        field: &'static str,
        /// Raw text of the field.
        value: String,
    },
}

fn parse_hex(line: usize, field: &'static str, value: &str) -> Result<u64, TraceError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16).map_err(|_| TraceError::BadField {
        line,
        field,
        value: value.to_string(),
    })
}

/// Parses a whole trace from text.
pub fn parse_trace(text: &str) -> Result<Vec<TraceRecord>, TraceError> {
    let mut records = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(TraceError::FieldCount {
                line,
                got: fields.len(),
            });
        }
        let pc = parse_hex(line, "pc", fields[0])?;
        let addr = parse_hex(line, "addr", fields[1])?;
        let core = if fields.len() == 3 {
            parse_hex(line, "core", fields[2])? as u32
        } else {
            0
        };
        records.push(TraceRecord { pc, addr, core });
    }
    Ok(records)
}
