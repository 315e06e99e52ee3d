//! On-disk sample log shared by the samplers (writers) and the profile
//! summary (reader).
//!
//! ```text
//! # Elapsed time   CPU (%)     Real (MB)  Virtual (MB)  Threads (id user sys)...
//! START_TIME: 1718000000.123456
//! 1718000000.223456       12.500       85.113      512.004 4242 0.12 0.03 4243 0.01 0
//! ```
//!
//! The first column is the absolute sample time (start time plus elapsed
//! seconds), so logs written by independent samplers of one run line up.

mod churn;
mod reader;
mod writer;

use serde::{Deserialize, Serialize};

use crate::config::RateUnit;
use crate::process::ThreadTimes;

pub use churn::{ChurnCount, ThreadChurn};
pub use reader::{parse_log, parse_reader, ParsedLog};
pub use writer::LogWriter;

pub(crate) const COMMENT_MARKER: char = '#';
pub(crate) const START_TIME_MARKER: &str = "START_TIME:";

/// Column indices of parsed CPU/memory rows.
pub mod cpu_columns {
    pub const TIME: usize = 0;
    pub const CPU_PERCENT: usize = 1;
    pub const RESIDENT_MB: usize = 2;
    pub const VIRTUAL_MB: usize = 3;
    pub const CHANGED_THREADS: usize = 4;
    pub const LIVE_THREADS: usize = 5;
}

/// Column indices of parsed disk rows.
pub mod disk_columns {
    pub const TIME: usize = 0;
    pub const READ_CHARS: usize = 1;
    pub const WRITE_CHARS: usize = 2;
    pub const READ_BYTES: usize = 3;
    pub const WRITE_BYTES: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Cpu,
    Disk,
}

impl LogKind {
    /// Numeric columns written per row, ahead of any thread triples.
    pub fn fixed_columns(self) -> usize {
        match self {
            LogKind::Cpu => 4,
            LogKind::Disk => 5,
        }
    }

    /// Width of a parsed row. CPU rows gain the two thread churn columns.
    pub fn parsed_columns(self) -> usize {
        match self {
            LogKind::Cpu => 6,
            LogKind::Disk => 5,
        }
    }

    pub fn labels(self, unit: RateUnit) -> Vec<String> {
        match self {
            LogKind::Cpu => vec![
                "Elapsed time".to_string(),
                "CPU (%)".to_string(),
                "Real (MB)".to_string(),
                "Virtual (MB)".to_string(),
                "Threads (id user sys)".to_string(),
            ],
            LogKind::Disk => {
                let unit = unit.label();
                vec![
                    "Elapsed time".to_string(),
                    format!("ReadChars ({})", unit),
                    format!("WriteChars ({})", unit),
                    format!("ReadBytes ({})", unit),
                    format!("WriteBytes ({})", unit),
                ]
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    pub timestamp: f64,
    pub cpu_percent: f64,
    pub resident_mb: f64,
    pub virtual_mb: f64,
    pub threads: Vec<ThreadTimes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiskSample {
    pub timestamp: f64,
    pub read_chars: f64,
    pub write_chars: f64,
    pub read_bytes: f64,
    pub write_bytes: f64,
}

/// One log row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    Cpu(CpuSample),
    Disk(DiskSample),
}

impl Sample {
    pub fn timestamp(&self) -> f64 {
        match self {
            Sample::Cpu(s) => s.timestamp,
            Sample::Disk(s) => s.timestamp,
        }
    }

    pub fn kind(&self) -> LogKind {
        match self {
            Sample::Cpu(_) => LogKind::Cpu,
            Sample::Disk(_) => LogKind::Disk,
        }
    }
}
