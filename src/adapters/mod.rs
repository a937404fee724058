//! Raw sensor-log adapters
//!
//! This module provides adapters that parse raw sensor logs and map each row
//! to a canonical record. Adapters never fail on a bad row: every row becomes
//! a [`RowOutcome`], either a record or a skip with its reason.

mod degree_log;

pub use degree_log::DegreeLogAdapter;

use crate::types::CanonicalRecord;
use serde::Serialize;
use std::fmt;

/// Why a raw row was dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Only empty or whitespace cells
    Blank,
    /// Fewer populated cells than the layout needs
    TooFewCells { found: usize },
    /// A required cell is not a finite number (0-based column among populated cells)
    NotNumeric { column: usize },
    /// The row could not be split into cells
    Malformed { detail: String },
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Blank => "blank",
            SkipReason::TooFewCells { .. } => "too_few_cells",
            SkipReason::NotNumeric { .. } => "not_numeric",
            SkipReason::Malformed { .. } => "malformed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Blank => write!(f, "blank row"),
            SkipReason::TooFewCells { found } => write!(f, "only {found} populated cells"),
            SkipReason::NotNumeric { column } => write!(f, "cell {column} is not numeric"),
            SkipReason::Malformed { detail } => write!(f, "malformed row: {detail}"),
        }
    }
}

/// Result of converting one raw row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record(CanonicalRecord),
    Skipped {
        /// 1-based line in the source file, when known
        line: Option<u64>,
        reason: SkipReason,
    },
}

/// Trait for raw sensor-log adapters
pub trait SensorLogAdapter {
    /// Short identifier of the source layout
    fn name(&self) -> &'static str;

    /// Convert the raw file contents, one outcome per data row, in file order
    fn parse(&self, raw: &[u8]) -> Vec<RowOutcome>;
}
