#![cfg(target_os = "linux")]

use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command};
use std::time::Duration;

use procrecord::process::{terminate_with_grace, LiveProcess, ProcessHandle};
use procrecord::record::{cpu_columns, disk_columns};
use procrecord::{
    parse_log, record, LogKind, ProfileSummary, RateUnit, RecorderConfig, RunEnd, SamplerError,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn spawn(program: &str, args: &[&str]) -> Child {
    Command::new(program)
        .args(args)
        .spawn()
        .expect("spawn test process")
}

fn config_in(dir: &TempDir, pid: u32) -> RecorderConfig {
    RecorderConfig {
        pid,
        cpu_log: dir.path().join("cpu.log"),
        disk_log: dir.path().join("disk.log"),
        interval: Some(0.05),
        unit: RateUnit::Bytes,
        record_disk: true,
        cleanup: true,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn records_until_target_exits() {
    let dir = TempDir::new().unwrap();
    let mut child = spawn("sleep", &["0.5"]);
    let config = config_in(&dir, child.id());

    let outcome = record(&config, CancellationToken::new()).await.unwrap();
    child.wait().unwrap();

    assert_eq!(outcome.cpu.end, RunEnd::Terminated);
    assert!(outcome.cpu.rows >= 1);
    assert_eq!(outcome.disk.unwrap().end, RunEnd::Terminated);

    let cpu = parse_log(&config.cpu_log, LogKind::Cpu, config.cleanup).unwrap();
    let disk = parse_log(&config.disk_log, LogKind::Disk, config.cleanup).unwrap();
    assert!(!config.cpu_log.exists());
    assert!(!config.disk_log.exists());

    assert_eq!(cpu.start_time, outcome.start_time);
    assert_eq!(disk.start_time, outcome.start_time);
    assert_eq!(cpu.len(), outcome.cpu.rows);
    assert!(cpu.elapsed().windows(2).all(|w| w[0] < w[1]));
    assert!(cpu.column(cpu_columns::RESIDENT_MB).iter().all(|mb| *mb > 0.0));
    assert!(cpu.column(cpu_columns::LIVE_THREADS).iter().all(|n| *n >= 1.0));
    for column in [disk_columns::READ_CHARS, disk_columns::WRITE_BYTES] {
        assert!(disk.column(column).iter().all(|rate| *rate >= 0.0));
    }

    let summary = ProfileSummary::from_logs(&cpu, Some((&disk, RateUnit::Bytes)), 1);
    assert_eq!(summary.samples, cpu.len());
    assert!(summary.memory.peak_resident_mb > 0.0);
}

#[tokio::test]
async fn recording_a_reaped_process_fails() {
    let dir = TempDir::new().unwrap();
    let mut child = spawn("true", &[]);
    let pid = child.id();
    child.wait().unwrap();

    let err = record(&config_in(&dir, pid), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SamplerError::NoSuchProcess(p) if p == pid));
    assert!(!dir.path().join("cpu.log").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_terminates_the_target() {
    let dir = TempDir::new().unwrap();
    let mut child = spawn("sleep", &["30"]);
    let mut config = config_in(&dir, child.id());
    config.record_disk = false;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let outcome = record(&config, cancel).await.unwrap();
    let status = child.wait().unwrap();

    assert_eq!(outcome.cpu.end, RunEnd::Interrupted);
    assert!(outcome.disk.is_none());
    assert_eq!(status.signal(), Some(libc::SIGTERM));

    let cpu = parse_log(&config.cpu_log, LogKind::Cpu, false).unwrap();
    assert_eq!(cpu.len(), outcome.cpu.rows);
    assert!(config.cpu_log.exists());
}

#[test]
fn live_counters_of_own_process() {
    let me = LiveProcess::attach(std::process::id()).unwrap();
    assert!(me.is_alive());

    let counters = me.counters().unwrap();
    assert!(counters.resident_bytes > 0);
    assert!(counters.virtual_bytes >= counters.resident_bytes);
    assert!(!counters.threads.is_empty());
    assert!(counters
        .threads
        .iter()
        .any(|t| t.id == u64::from(std::process::id())));
}

#[test]
fn children_are_found_recursively() {
    let mut shell = spawn("sh", &["-c", "sleep 2 & wait"]);
    std::thread::sleep(Duration::from_millis(200));

    let target = LiveProcess::attach(shell.id()).unwrap();
    let children = target.children();
    assert!(!children.is_empty());
    assert!(children.iter().all(|c| c.pid() != shell.id()));

    let me = LiveProcess::attach(std::process::id()).unwrap();
    assert!(me.children().iter().any(|c| c.pid() == shell.id()));

    for child in &children {
        procrecord::process::terminate(child.pid()).unwrap();
    }
    shell.wait().unwrap();
}

#[test]
fn terminate_kills_a_target_that_ignores_sigterm() {
    let mut stubborn = spawn("sh", &["-c", "trap '' TERM; while :; do sleep 1; done"]);
    std::thread::sleep(Duration::from_millis(200));

    terminate_with_grace(stubborn.id(), Duration::from_millis(300)).unwrap();

    let status = stubborn.wait().unwrap();
    assert_eq!(status.signal(), Some(libc::SIGKILL));
}

#[test]
fn terminate_returns_once_target_exits_on_sigterm() {
    let mut child = spawn("sleep", &["30"]);
    let started = std::time::Instant::now();

    terminate_with_grace(child.id(), Duration::from_secs(5)).unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(child.wait().unwrap().signal(), Some(libc::SIGTERM));
}

#[test]
fn cpu_only_handle_skips_io_counters() {
    let init = LiveProcess::attach(1).unwrap().without_io();
    let counters = init.counters().unwrap();

    assert_eq!(counters.read_chars, 0);
    assert_eq!(counters.write_chars, 0);
    assert_eq!(counters.read_bytes, 0);
    assert_eq!(counters.write_bytes, 0);
    assert!(!counters.threads.is_empty());
}
