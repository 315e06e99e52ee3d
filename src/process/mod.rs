mod children;
#[cfg(test)]
pub(crate) mod fake;
#[cfg(target_os = "linux")]
mod live;
mod terminate;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

pub use children::{Reconciliation, TrackedChild, TrackedChildSet};
#[cfg(target_os = "linux")]
pub use live::LiveProcess;
pub use terminate::{terminate, terminate_with_grace, TERM_GRACE};

/// Accumulated CPU time of one thread, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreadTimes {
    pub id: u64,
    pub user_time: f64,
    pub system_time: f64,
}

/// Point-in-time view of a process's resource usage.
///
/// The I/O counters and `cpu_time` only ever grow for a given process, so they
/// are meaningful as a difference between two snapshots of the same handle.
/// Memory and the thread list are instantaneous.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCounters {
    pub read_chars: u64,
    pub write_chars: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    /// User plus system time, in seconds.
    pub cpu_time: f64,
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
    pub threads: Vec<ThreadTimes>,
}

/// Live view onto an OS process.
///
/// The same interface covers the monitored target and each of its
/// descendants. A handle may stop answering at any moment when the process
/// exits; callers treat that as the end of the process, not a fault.
pub trait ProcessHandle: Sized {
    fn pid(&self) -> u32;

    fn is_alive(&self) -> bool;

    fn counters(&self) -> Result<ResourceCounters, ProbeError>;

    /// All current descendants, recursively. Enumeration failures yield an
    /// empty list.
    fn children(&self) -> Vec<Self>;
}

/// procfs states of a process that has exited but may not be reaped yet.
#[cfg(target_os = "linux")]
pub(crate) fn is_exited(state: char) -> bool {
    matches!(state, 'Z' | 'X' | 'x')
}
