use crate::config::RateUnit;
use crate::process::{ResourceCounters, ThreadTimes};
use crate::record::{CpuSample, DiskSample, LogKind, Sample};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// `factor * delta / delta_t`. Callers guarantee `delta_t > 0`.
pub fn rate(delta: f64, delta_t: f64, factor: f64) -> f64 {
    factor * delta / delta_t
}

#[derive(Debug, Default)]
pub(crate) struct TickUsage {
    cpu_time: f64,
    read_chars: u64,
    write_chars: u64,
    read_bytes: u64,
    write_bytes: u64,
    resident_bytes: u64,
    virtual_bytes: u64,
    threads: Vec<ThreadTimes>,
}

impl TickUsage {
    // Counters that went backwards contribute nothing.
    pub(crate) fn add_delta(&mut self, before: &ResourceCounters, after: &ResourceCounters) {
        self.cpu_time += (after.cpu_time - before.cpu_time).max(0.0);
        self.read_chars += after.read_chars.saturating_sub(before.read_chars);
        self.write_chars += after.write_chars.saturating_sub(before.write_chars);
        self.read_bytes += after.read_bytes.saturating_sub(before.read_bytes);
        self.write_bytes += after.write_bytes.saturating_sub(before.write_bytes);
    }

    pub(crate) fn add_current(&mut self, counters: &ResourceCounters) {
        self.resident_bytes += counters.resident_bytes;
        self.virtual_bytes += counters.virtual_bytes;
        self.threads.extend(counters.threads.iter().cloned());
    }

    pub(crate) fn into_sample(
        self,
        kind: LogKind,
        unit: RateUnit,
        timestamp: f64,
        delta_t: f64,
    ) -> Sample {
        match kind {
            LogKind::Cpu => Sample::Cpu(CpuSample {
                timestamp,
                cpu_percent: rate(self.cpu_time, delta_t, 100.0),
                resident_mb: self.resident_bytes as f64 / BYTES_PER_MB,
                virtual_mb: self.virtual_bytes as f64 / BYTES_PER_MB,
                threads: self.threads,
            }),
            LogKind::Disk => {
                let factor = unit.conversion_factor();
                Sample::Disk(DiskSample {
                    timestamp,
                    read_chars: rate(self.read_chars as f64, delta_t, factor),
                    write_chars: rate(self.write_chars as f64, delta_t, factor),
                    read_bytes: rate(self.read_bytes as f64, delta_t, factor),
                    write_bytes: rate(self.write_bytes as f64, delta_t, factor),
                })
            }
        }
    }
}
