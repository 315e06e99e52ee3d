//! Post-run profile summary built from parsed logs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RateUnit;
use crate::record::{cpu_columns, disk_columns, LogKind, ParsedLog};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    /// Start of the recording; `None` when the log carried no usable start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Seconds between the first and the last CPU sample.
    pub duration_secs: f64,
    pub samples: usize,
    pub cpu: CpuSummary,
    pub memory: MemorySummary,
    pub peak_live_threads: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<DiskSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuSummary {
    pub peak_percent: f64,
    pub mean_percent: f64,
    /// Share of the available CPU capacity the tree used over the run, in
    /// percent. `None` with fewer than two samples.
    pub fill_factor_percent: Option<f64>,
    pub logical_cpus: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemorySummary {
    pub peak_resident_mb: f64,
    pub peak_virtual_mb: f64,
}

/// Disk traffic integrated over the run, in gigabits or gigabytes per `unit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskSummary {
    pub unit: RateUnit,
    pub read_chars: f64,
    pub write_chars: f64,
    pub read_bytes: f64,
    pub write_bytes: f64,
}

impl ProfileSummary {
    /// Summarizes a parsed CPU/memory log and, optionally, the disk log of the
    /// same run. `logical_cpus` scales the fill factor.
    pub fn from_logs(
        cpu: &ParsedLog,
        disk: Option<(&ParsedLog, RateUnit)>,
        logical_cpus: usize,
    ) -> Self {
        debug_assert_eq!(cpu.kind, LogKind::Cpu);

        let times = cpu.elapsed();
        let cpu_percent = cpu.column(cpu_columns::CPU_PERCENT);
        let duration_secs = match (times.first(), times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };

        let fill_factor_percent = if duration_secs > 0.0 && logical_cpus > 0 {
            Some(trapezoid(&times, &cpu_percent) / (duration_secs * logical_cpus as f64))
        } else {
            None
        };

        let mean_percent = if cpu_percent.is_empty() {
            0.0
        } else {
            cpu_percent.iter().sum::<f64>() / cpu_percent.len() as f64
        };

        ProfileSummary {
            started_at: started_at(cpu.start_time),
            duration_secs,
            samples: cpu.len(),
            cpu: CpuSummary {
                peak_percent: peak(&cpu_percent),
                mean_percent,
                fill_factor_percent,
                logical_cpus,
            },
            memory: MemorySummary {
                peak_resident_mb: peak(&cpu.column(cpu_columns::RESIDENT_MB)),
                peak_virtual_mb: peak(&cpu.column(cpu_columns::VIRTUAL_MB)),
            },
            peak_live_threads: peak(&cpu.column(cpu_columns::LIVE_THREADS)) as u64,
            disk: disk.map(|(log, unit)| DiskSummary::from_log(log, unit)),
        }
    }
}

impl DiskSummary {
    pub fn from_log(log: &ParsedLog, unit: RateUnit) -> Self {
        debug_assert_eq!(log.kind, LogKind::Disk);
        let times = log.elapsed();
        let total = |column| trapezoid(&times, &log.column(column));
        DiskSummary {
            unit,
            read_chars: total(disk_columns::READ_CHARS),
            write_chars: total(disk_columns::WRITE_CHARS),
            read_bytes: total(disk_columns::READ_BYTES),
            write_bytes: total(disk_columns::WRITE_BYTES),
        }
    }
}

/// Trapezoidal integral of `values` over `times`.
pub fn trapezoid(times: &[f64], values: &[f64]) -> f64 {
    times
        .windows(2)
        .zip(values.windows(2))
        .map(|(t, v)| (t[1] - t[0]) * (v[0] + v[1]) / 2.0)
        .sum()
}

fn peak(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

fn started_at(start_time: f64) -> Option<DateTime<Utc>> {
    if start_time <= 0.0 || !start_time.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((start_time * 1_000_000.0).round() as i64)
}
