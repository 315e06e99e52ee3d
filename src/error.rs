use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading a single process's state from the OS.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("process {0} is gone")]
    ProcessGone(u32),
    #[error("access to process {0} denied")]
    AccessDenied(u32),
    #[error("reading process {pid} failed: {reason}")]
    Io { pid: u32, reason: String },
}

impl ProbeError {
    /// Exit and permission loss end monitoring of a process; anything else is a fault.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProbeError::ProcessGone(_) | ProbeError::AccessDenied(_))
    }

    pub fn pid(&self) -> u32 {
        match self {
            ProbeError::ProcessGone(pid) | ProbeError::AccessDenied(pid) => *pid,
            ProbeError::Io { pid, .. } => *pid,
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed log line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        LogError::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LogError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("no such process: {0}")]
    NoSuchProcess(u32),
    #[error("permission denied for process {0}")]
    AccessDenied(u32),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("disk sampler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SamplerError {
    /// Maps a failed attach/initial snapshot to the user-facing startup error.
    pub(crate) fn at_start(err: ProbeError) -> Self {
        match err {
            ProbeError::ProcessGone(pid) => SamplerError::NoSuchProcess(pid),
            ProbeError::AccessDenied(pid) => SamplerError::AccessDenied(pid),
            other => SamplerError::Probe(other),
        }
    }
}
