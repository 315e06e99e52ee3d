use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{FlushPolicy, RateUnit};
use crate::error::LogError;

use super::{LogKind, Sample, COMMENT_MARKER, START_TIME_MARKER};

/// Append-only writer for one sampler's log.
///
/// The header (column labels and start time) is written on construction;
/// rows must then arrive in increasing time order.
pub struct LogWriter<W: Write> {
    out: W,
    path: PathBuf,
    kind: LogKind,
    flush: FlushPolicy,
    rows: usize,
    last_timestamp: Option<f64>,
}

impl LogWriter<BufWriter<File>> {
    pub fn create(
        path: &Path,
        kind: LogKind,
        unit: RateUnit,
        start_time: f64,
        flush: FlushPolicy,
    ) -> Result<Self, LogError> {
        let file = File::create(path).map_err(|e| LogError::io(path, e))?;
        LogWriter::new(BufWriter::new(file), path, kind, unit, start_time, flush)
    }
}

impl<W: Write> LogWriter<W> {
    /// `path` only labels errors; nothing is opened.
    pub fn new(
        out: W,
        path: impl Into<PathBuf>,
        kind: LogKind,
        unit: RateUnit,
        start_time: f64,
        flush: FlushPolicy,
    ) -> Result<Self, LogError> {
        let mut writer = LogWriter {
            out,
            path: path.into(),
            kind,
            flush,
            rows: 0,
            last_timestamp: None,
        };

        let labels = kind.labels(unit);
        let mut header = String::new();
        header.push(COMMENT_MARKER);
        for label in &labels[..labels.len() - 1] {
            let _ = write!(header, " {:^12}", label);
        }
        let _ = write!(header, " {}", labels[labels.len() - 1]);

        writer.write_line(&header)?;
        writer.write_line(&format!("{} {}", START_TIME_MARKER, start_time))?;
        writer.out.flush().map_err(|e| LogError::io(&writer.path, e))?;
        Ok(writer)
    }

    pub fn kind(&self) -> LogKind {
        self.kind
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn append(&mut self, sample: &Sample) -> Result<(), LogError> {
        debug_assert_eq!(sample.kind(), self.kind);
        debug_assert!(self
            .last_timestamp
            .map_or(true, |last| sample.timestamp() > last));

        let line = format_row(sample);
        self.write_line(&line)?;
        if self.flush == FlushPolicy::EveryRow {
            self.out.flush().map_err(|e| LogError::io(&self.path, e))?;
        }
        self.rows += 1;
        self.last_timestamp = Some(sample.timestamp());
        Ok(())
    }

    /// Flushes buffered rows and hands back the sink.
    pub fn finish(mut self) -> Result<W, LogError> {
        self.out.flush().map_err(|e| LogError::io(&self.path, e))?;
        Ok(self.out)
    }

    fn write_line(&mut self, line: &str) -> Result<(), LogError> {
        writeln!(self.out, "{}", line).map_err(|e| LogError::io(&self.path, e))
    }
}

fn format_row(sample: &Sample) -> String {
    match sample {
        Sample::Cpu(s) => {
            let mut line = format!(
                "{:12.6} {:12.3} {:12.3} {:12.3}",
                s.timestamp, s.cpu_percent, s.resident_mb, s.virtual_mb
            );
            for thread in &s.threads {
                let _ = write!(
                    line,
                    " {} {} {}",
                    thread.id, thread.user_time, thread.system_time
                );
            }
            line
        }
        Sample::Disk(s) => format!(
            "{:12.6} {:12.6} {:12.6} {:12.6} {:12.6}",
            s.timestamp, s.read_chars, s.write_chars, s.read_bytes, s.write_bytes
        ),
    }
}
