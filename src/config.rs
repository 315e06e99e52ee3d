// src/config.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::record::LogKind;

/// Shortest pause between ticks when a positive interval is requested.
pub const MIN_INTERVAL: Duration = Duration::from_millis(50);

/// Disk sampling falls back to the floor when no interval is given.
pub const DEFAULT_DISK_INTERVAL: Duration = MIN_INTERVAL;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    /// Gigabits per second.
    #[default]
    Bits,
    /// Gigabytes per second.
    Bytes,
}

impl RateUnit {
    /// Multiplier turning bytes per second into this unit.
    pub fn conversion_factor(self) -> f64 {
        match self {
            RateUnit::Bits => 8.0e-9,
            RateUnit::Bytes => 1.0e-9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RateUnit::Bits => "Gbit/s",
            RateUnit::Bytes => "GB/s",
        }
    }
}

/// Resolves a requested sampling interval in seconds.
///
/// `None` picks the per-kind default. Zero, negative or NaN mean no pause at
/// all. Positive values are raised to [`MIN_INTERVAL`].
pub fn resolve_interval(requested: Option<f64>, kind: LogKind) -> Duration {
    match requested {
        None => match kind {
            LogKind::Cpu => Duration::ZERO,
            LogKind::Disk => DEFAULT_DISK_INTERVAL,
        },
        Some(secs) if secs.is_nan() || secs <= 0.0 => Duration::ZERO,
        Some(secs) => Duration::try_from_secs_f64(secs)
            .unwrap_or(Duration::MAX)
            .max(MIN_INTERVAL),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    EveryRow,
    OnClose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub kind: LogKind,
    pub interval: Duration,
    pub unit: RateUnit,
    pub flush: FlushPolicy,
}

impl SamplerConfig {
    pub fn cpu(requested_interval: Option<f64>) -> Self {
        SamplerConfig {
            kind: LogKind::Cpu,
            interval: resolve_interval(requested_interval, LogKind::Cpu),
            unit: RateUnit::default(),
            // The CPU sampler is the primary one; never lose rows it wrote.
            flush: FlushPolicy::EveryRow,
        }
    }

    pub fn disk(requested_interval: Option<f64>, unit: RateUnit) -> Self {
        SamplerConfig {
            kind: LogKind::Disk,
            interval: resolve_interval(requested_interval, LogKind::Disk),
            unit,
            flush: FlushPolicy::OnClose,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    pub pid: u32,
    pub cpu_log: PathBuf,       // Default: cpu_profile.log
    pub disk_log: PathBuf,      // Default: disk_profile.log
    pub interval: Option<f64>,  // Seconds; None picks per-sampler defaults
    pub unit: RateUnit,         // Default: Bits
    pub record_disk: bool,      // Default: true
    pub cleanup: bool,          // Default: true, logs are removed once parsed
}

impl Default for RecorderConfig {
    fn default() -> Self {
        RecorderConfig {
            pid: 0,
            cpu_log: PathBuf::from("cpu_profile.log"),
            disk_log: PathBuf::from("disk_profile.log"),
            interval: None,
            unit: RateUnit::Bits,
            record_disk: true,
            cleanup: true,
        }
    }
}

impl RecorderConfig {
    pub fn cpu_sampler(&self) -> SamplerConfig {
        SamplerConfig::cpu(self.interval)
    }

    pub fn disk_sampler(&self) -> SamplerConfig {
        SamplerConfig::disk(self.interval, self.unit)
    }
}
