//! Runs the CPU/memory and disk samplers of one recording side by side.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{RecorderConfig, SamplerConfig};
use crate::error::SamplerError;
use crate::process::{terminate, LiveProcess};
use crate::record::{LogKind, LogWriter};
use crate::sampler::{Clock, RunSummary, Sampler, StartEpoch};

/// How a recording went, per sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordOutcome {
    pub started_at: DateTime<Utc>,
    /// Value written to both logs' `START_TIME:` line.
    pub start_time: f64,
    pub cpu: RunSummary,
    /// `None` when disk recording was turned off.
    pub disk: Option<RunSummary>,
}

/// Records `config.pid` until it exits or `cancel` fires.
///
/// The disk sampler runs on a spawned task while the CPU/memory sampler runs
/// on the caller's task; both share one start epoch so their logs line up.
/// Cancelling stops both samplers and terminates the target.
pub async fn record(
    config: &RecorderConfig,
    cancel: CancellationToken,
) -> Result<RecordOutcome, SamplerError> {
    let epoch = StartEpoch::now();
    let start_time = epoch.start_time();

    let cpu = start_sampler(config.pid, config.cpu_sampler(), epoch)?;
    let cpu_writer = open_writer(&config.cpu_log, cpu.config(), start_time)?;

    let disk_task = if config.record_disk {
        let disk = start_sampler(config.pid, config.disk_sampler(), epoch)?;
        let disk_writer = open_writer(&config.disk_log, disk.config(), start_time)?;
        Some(tokio::spawn(disk.run(disk_writer, cancel.clone())))
    } else {
        None
    };

    info!(
        "recording {} into {}{}",
        config.pid,
        config.cpu_log.display(),
        if config.record_disk {
            format!(" and {}", config.disk_log.display())
        } else {
            String::new()
        }
    );

    let cpu_summary = match cpu.run(cpu_writer, cancel).await {
        Ok(summary) => summary,
        Err(err) => {
            if let Some(task) = disk_task {
                task.abort();
            }
            return Err(err);
        }
    };

    let disk_summary = match disk_task {
        Some(task) => Some(task.await??),
        None => None,
    };

    Ok(RecordOutcome {
        started_at: epoch.started_at(),
        start_time,
        cpu: cpu_summary,
        disk: disk_summary,
    })
}

fn start_sampler(
    pid: u32,
    config: SamplerConfig,
    epoch: StartEpoch,
) -> Result<Sampler<LiveProcess, StartEpoch>, SamplerError> {
    let mut target = LiveProcess::attach(pid).map_err(SamplerError::at_start)?;
    if config.kind == LogKind::Cpu {
        target = target.without_io();
    }
    let sampler = Sampler::start(target, config, epoch)?.with_interrupt_hook(|pid| {
        match terminate(pid) {
            Ok(()) => warn!("sent termination signal to {}", pid),
            Err(err) => warn!("could not terminate {}: {}", pid, err),
        }
    });
    Ok(sampler)
}

fn open_writer(
    path: &Path,
    config: &SamplerConfig,
    start_time: f64,
) -> Result<LogWriter<std::io::BufWriter<std::fs::File>>, SamplerError> {
    Ok(LogWriter::create(
        path,
        config.kind,
        config.unit,
        start_time,
        config.flush,
    )?)
}
