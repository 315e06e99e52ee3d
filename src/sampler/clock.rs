use std::time::Instant;

use chrono::{DateTime, Utc};

pub trait Clock: Send {
    /// Wall-clock start of the run, in seconds since the Unix epoch.
    fn start_time(&self) -> f64;

    /// Seconds elapsed since the start, from a monotonic source.
    fn elapsed(&mut self) -> f64;
}

/// Start of a run: the wall-clock time it began plus a monotonic baseline.
///
/// Offsets are measured against the monotonic baseline, so adjusting the
/// system clock mid-run does not disturb them. Copies share the same epoch,
/// which keeps the logs of concurrent samplers on one time axis.
#[derive(Clone, Copy, Debug)]
pub struct StartEpoch {
    wall: DateTime<Utc>,
    origin: Instant,
}

impl StartEpoch {
    pub fn now() -> Self {
        StartEpoch {
            wall: Utc::now(),
            origin: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.wall
    }
}

impl Clock for StartEpoch {
    fn start_time(&self) -> f64 {
        self.wall.timestamp_micros() as f64 / 1_000_000.0
    }

    fn elapsed(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
