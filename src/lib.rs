//! Records the resource usage of a running process and all of its
//! descendants into two time-series logs, and reads them back.
//!
//! A CPU/memory log carries CPU percent, resident and virtual memory and the
//! per-thread CPU times of every sample. A disk log carries read/write
//! throughput. Both logs share one start time so they can be plotted on a
//! common axis.

pub mod config;
pub mod error;
pub mod process;
pub mod record;
#[cfg(target_os = "linux")]
pub mod recorder;
pub mod sampler;
pub mod summary;

pub use config::{RateUnit, RecorderConfig, SamplerConfig};
pub use error::{LogError, ProbeError, SamplerError};
pub use process::{ProcessHandle, ResourceCounters, ThreadTimes};
pub use record::{parse_log, LogKind, LogWriter, ParsedLog, Sample};
#[cfg(target_os = "linux")]
pub use recorder::{record, RecordOutcome};
pub use sampler::{RunEnd, RunSummary, Sampler, Tick};
pub use summary::ProfileSummary;
