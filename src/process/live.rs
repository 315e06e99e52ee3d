use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use procfs::process::{all_processes, Process};
use procfs::ProcError;
use sysinfo::{Pid, ProcessStatus, System};

use super::{is_exited, ProcessHandle, ResourceCounters, ThreadTimes};
use crate::error::ProbeError;

/// A process on the local Linux host.
///
/// Liveness and memory come from `sysinfo`; the character/byte I/O counters and
/// per-thread CPU times, which `sysinfo` does not expose, are read from procfs.
/// Handles discovered through [`ProcessHandle::children`] share the parent's
/// `System` so one refresh serves the whole tree.
#[derive(Clone)]
pub struct LiveProcess {
    pid: Pid,
    system: Arc<Mutex<System>>,
    read_io: bool,
}

impl LiveProcess {
    /// Attaches to `pid`, failing with `ProcessGone` if it is not running.
    pub fn attach(pid: u32) -> Result<Self, ProbeError> {
        let handle = LiveProcess {
            pid: Pid::from_u32(pid),
            system: Arc::new(Mutex::new(System::new())),
            read_io: true,
        };
        if !handle.is_alive() {
            return Err(ProbeError::ProcessGone(pid));
        }
        Ok(handle)
    }

    /// Leaves the I/O counters at zero instead of reading `/proc/<pid>/io`,
    /// which needs ptrace access that stat, memory and threads do not.
    /// Children found from this handle inherit the setting.
    pub fn without_io(mut self) -> Self {
        self.read_io = false;
        self
    }

    fn child(&self, pid: i32) -> Self {
        LiveProcess {
            pid: Pid::from_u32(pid as u32),
            system: Arc::clone(&self.system),
            read_io: self.read_io,
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn proc_error(&self, err: ProcError) -> ProbeError {
        let pid = self.pid.as_u32();
        match err {
            ProcError::NotFound(_) | ProcError::Incomplete(_) => ProbeError::ProcessGone(pid),
            ProcError::PermissionDenied(_) => ProbeError::AccessDenied(pid),
            other => ProbeError::Io {
                pid,
                reason: other.to_string(),
            },
        }
    }

    fn memory(&self) -> Result<(u64, u64), ProbeError> {
        let mut system = self.system();
        if !system.refresh_process(self.pid) {
            return Err(ProbeError::ProcessGone(self.pid.as_u32()));
        }
        let process = system
            .process(self.pid)
            .ok_or(ProbeError::ProcessGone(self.pid.as_u32()))?;
        Ok((process.memory(), process.virtual_memory()))
    }
}

impl ProcessHandle for LiveProcess {
    fn pid(&self) -> u32 {
        self.pid.as_u32()
    }

    fn is_alive(&self) -> bool {
        let mut system = self.system();
        if !system.refresh_process(self.pid) {
            return false;
        }
        match system.process(self.pid) {
            Some(process) => !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead),
            None => false,
        }
    }

    fn counters(&self) -> Result<ResourceCounters, ProbeError> {
        let process = Process::new(self.pid.as_u32() as i32).map_err(|e| self.proc_error(e))?;
        let stat = process.stat().map_err(|e| self.proc_error(e))?;
        if is_exited(stat.state) {
            return Err(ProbeError::ProcessGone(self.pid.as_u32()));
        }
        let io = if self.read_io {
            Some(process.io().map_err(|e| self.proc_error(e))?)
        } else {
            None
        };
        let ticks = procfs::ticks_per_second() as f64;

        let mut threads = Vec::new();
        let tasks = process.tasks().map_err(|e| self.proc_error(e))?;
        for task in tasks.flatten() {
            // Threads exiting between listing and reading are simply left out.
            if let Ok(task_stat) = task.stat() {
                threads.push(ThreadTimes {
                    id: task.tid as u64,
                    user_time: task_stat.utime as f64 / ticks,
                    system_time: task_stat.stime as f64 / ticks,
                });
            }
        }

        let (resident_bytes, virtual_bytes) = self.memory()?;

        let mut counters = ResourceCounters {
            cpu_time: (stat.utime + stat.stime) as f64 / ticks,
            resident_bytes,
            virtual_bytes,
            threads,
            ..ResourceCounters::default()
        };
        if let Some(io) = io {
            counters.read_chars = io.rchar;
            counters.write_chars = io.wchar;
            counters.read_bytes = io.read_bytes;
            counters.write_bytes = io.write_bytes;
        }
        Ok(counters)
    }

    fn children(&self) -> Vec<Self> {
        let processes = match all_processes() {
            Ok(processes) => processes,
            Err(err) => {
                debug!("process enumeration failed: {}", err);
                return Vec::new();
            }
        };

        let mut by_parent: HashMap<i32, Vec<i32>> = HashMap::new();
        for process in processes.flatten() {
            if let Ok(stat) = process.stat() {
                by_parent.entry(stat.ppid).or_default().push(stat.pid);
            }
        }

        let mut descendants = Vec::new();
        let mut queue = VecDeque::from([self.pid.as_u32() as i32]);
        while let Some(parent) = queue.pop_front() {
            if let Some(kids) = by_parent.remove(&parent) {
                for kid in kids {
                    descendants.push(self.child(kid));
                    queue.push_back(kid);
                }
            }
        }
        descendants
    }
}
