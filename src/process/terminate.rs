use std::thread;
use std::time::{Duration, Instant};

use libc::{kill as libc_kill, ESRCH, SIGKILL, SIGTERM};
use log::warn;

use crate::error::ProbeError;

/// Time a process gets to exit after SIGTERM before it is killed.
pub const TERM_GRACE: Duration = Duration::from_secs(1);

const EXIT_POLL: Duration = Duration::from_millis(20);

/// Stops the monitored process: SIGTERM, then SIGKILL if it is still running
/// after [`TERM_GRACE`]. A process that is already gone counts as terminated.
pub fn terminate(pid: u32) -> Result<(), ProbeError> {
    terminate_with_grace(pid, TERM_GRACE)
}

pub fn terminate_with_grace(pid: u32, grace: Duration) -> Result<(), ProbeError> {
    let term_res = unsafe { libc_kill(pid as i32, SIGTERM) };
    if term_res == 0 {
        if wait_for_exit(pid, grace) {
            return Ok(());
        }
        warn!("{} still running {:?} after SIGTERM, killing", pid, grace);
    } else {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(ESRCH) {
            return Ok(());
        }
        warn!("SIGTERM to {} failed ({}), escalating", pid, err);
    }

    let kill_res = unsafe { libc_kill(pid as i32, SIGKILL) };
    if kill_res == 0 {
        return Ok(());
    }

    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(ESRCH) => Ok(()),
        Some(libc::EPERM) => Err(ProbeError::AccessDenied(pid)),
        _ => Err(ProbeError::Io {
            pid,
            reason: format!("failed to kill process: {}", err),
        }),
    }
}

fn wait_for_exit(pid: u32, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        if !is_running(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(EXIT_POLL);
    }
}

// Zombies still answer kill(pid, 0) until reaped, so ask procfs for the state.
#[cfg(target_os = "linux")]
fn is_running(pid: u32) -> bool {
    match procfs::process::Process::new(pid as i32).and_then(|p| p.stat()) {
        Ok(stat) => !super::is_exited(stat.state),
        Err(_) => false,
    }
}

#[cfg(not(target_os = "linux"))]
fn is_running(pid: u32) -> bool {
    unsafe { libc_kill(pid as i32, 0) == 0 }
}
