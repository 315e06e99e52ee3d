//! Command-line recorder: samples a running process tree until it exits,
//! then prints a JSON profile summary of the run.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use procrecord::{RateUnit, RecorderConfig};

/// Record CPU, memory, thread and disk activity of a process and its children
#[derive(Parser, Debug, Clone)]
#[command(name = "procrecord", version)]
struct Args {
    /// PID of the process to monitor
    pid: u32,

    /// CPU/memory log file
    #[arg(long, default_value = "cpu_profile.log", env = "PROCRECORD_LOGFILE")]
    logfile: PathBuf,

    /// Disk activity log file
    #[arg(long, default_value = "disk_profile.log", env = "PROCRECORD_DISKFILE")]
    diskfile: PathBuf,

    /// Seconds between samples; defaults to as fast as possible for CPU and
    /// 0.05 for disk
    #[arg(long, env = "PROCRECORD_INTERVAL")]
    interval: Option<f64>,

    /// Report disk rates in GB/s instead of Gbit/s
    #[arg(long)]
    bytes: bool,

    /// Keep the log files after the summary has been built
    #[arg(long)]
    noclean: bool,

    /// Only record CPU and memory
    #[arg(long)]
    no_disk: bool,

    /// Write the JSON summary here instead of stdout
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Args {
    fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            pid: self.pid,
            cpu_log: self.logfile.clone(),
            disk_log: self.diskfile.clone(),
            interval: self.interval,
            unit: if self.bytes {
                RateUnit::Bytes
            } else {
                RateUnit::Bits
            },
            record_disk: !self.no_disk,
            cleanup: !self.noclean,
        }
    }
}

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    run(args).await
}

#[cfg(not(target_os = "linux"))]
fn main() -> anyhow::Result<()> {
    let _ = Args::parse();
    anyhow::bail!("procrecord reads process counters from procfs and only runs on Linux")
}

#[cfg(target_os = "linux")]
async fn run(args: Args) -> anyhow::Result<()> {
    use procrecord::{parse_log, LogKind, ProfileSummary};
    use tokio_util::sync::CancellationToken;

    let config = args.recorder_config();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let outcome = procrecord::record(&config, cancel)
        .await
        .with_context(|| format!("failed to record process {}", config.pid))?;
    log::info!(
        "recording ended ({:?}): {} cpu rows{}",
        outcome.cpu.end,
        outcome.cpu.rows,
        outcome
            .disk
            .map(|disk| format!(", {} disk rows", disk.rows))
            .unwrap_or_default()
    );

    let cpu_log = parse_log(&config.cpu_log, LogKind::Cpu, config.cleanup)
        .with_context(|| format!("failed to read {}", config.cpu_log.display()))?;
    let disk_log = if config.record_disk {
        let log = parse_log(&config.disk_log, LogKind::Disk, config.cleanup)
            .with_context(|| format!("failed to read {}", config.disk_log.display()))?;
        Some(log)
    } else {
        None
    };

    let summary = ProfileSummary::from_logs(
        &cpu_log,
        disk_log.as_ref().map(|log| (log, config.unit)),
        num_cpus::get(),
    );
    let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;

    match &args.summary {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write summary to {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_recorder_config() {
        let args = Args::try_parse_from([
            "procrecord",
            "4242",
            "--interval",
            "0.25",
            "--bytes",
            "--noclean",
            "--no-disk",
        ])
        .unwrap();
        let config = args.recorder_config();

        assert_eq!(config.pid, 4242);
        assert_eq!(config.interval, Some(0.25));
        assert_eq!(config.unit, RateUnit::Bytes);
        assert!(!config.cleanup);
        assert!(!config.record_disk);
        assert_eq!(config.cpu_log, PathBuf::from("cpu_profile.log"));
    }

    #[test]
    fn pid_is_required() {
        assert!(Args::try_parse_from(["procrecord"]).is_err());
    }
}
