use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};

use crate::error::LogError;

use super::{LogKind, ThreadChurn, COMMENT_MARKER, START_TIME_MARKER};

/// A log read back into numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub kind: LogKind,
    pub start_time: f64,
    /// One row per sample, `kind.parsed_columns()` wide.
    pub rows: Vec<Vec<f64>>,
}

impl ParsedLog {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Sample times relative to the start time.
    pub fn elapsed(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row[0] - self.start_time).collect()
    }
}

/// Parses the log at `path`. With `cleanup` the file is deleted once it has
/// been read successfully.
pub fn parse_log(path: &Path, kind: LogKind, cleanup: bool) -> Result<ParsedLog, LogError> {
    let file = File::open(path).map_err(|e| LogError::io(path, e))?;
    let parsed = parse_reader(BufReader::new(file), kind, path)?;

    if cleanup {
        fs::remove_file(path).map_err(|e| LogError::io(path, e))?;
        debug!("removed {}", path.display());
    }
    Ok(parsed)
}

pub fn parse_reader<R: BufRead>(
    reader: R,
    kind: LogKind,
    path: &Path,
) -> Result<ParsedLog, LogError> {
    let mut start_time = None;
    let mut rows = Vec::new();
    let mut churn = ThreadChurn::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| LogError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        if let Some(rest) = line.strip_prefix(START_TIME_MARKER) {
            let value = rest.trim();
            let parsed = value
                .parse::<f64>()
                .map_err(|_| LogError::parse(line_no, format!("bad start time {:?}", value)))?;
            start_time = Some(parsed);
            continue;
        }

        let row = match kind {
            LogKind::Disk => parse_fixed(line, line_no, kind.fixed_columns())?,
            LogKind::Cpu => parse_cpu_row(line, line_no, &mut churn)?,
        };
        rows.push(row);
    }

    let start_time = start_time.unwrap_or_else(|| {
        warn!("{} has no {} line, assuming 0", path.display(), START_TIME_MARKER);
        0.0
    });

    Ok(ParsedLog {
        kind,
        start_time,
        rows,
    })
}

fn parse_float(field: &str, line_no: usize) -> Result<f64, LogError> {
    field
        .parse::<f64>()
        .map_err(|_| LogError::parse(line_no, format!("not a number: {:?}", field)))
}

fn parse_fixed(line: &str, line_no: usize, width: usize) -> Result<Vec<f64>, LogError> {
    let row = line
        .split_whitespace()
        .map(|field| parse_float(field, line_no))
        .collect::<Result<Vec<_>, _>>()?;
    if row.len() != width {
        return Err(LogError::parse(
            line_no,
            format!("expected {} columns, found {}", width, row.len()),
        ));
    }
    Ok(row)
}

fn parse_cpu_row(line: &str, line_no: usize, churn: &mut ThreadChurn) -> Result<Vec<f64>, LogError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let fixed = LogKind::Cpu.fixed_columns();
    if fields.len() < fixed {
        return Err(LogError::parse(
            line_no,
            format!("expected at least {} columns, found {}", fixed, fields.len()),
        ));
    }
    let (head, triples) = fields.split_at(fixed);
    if triples.len() % 3 != 0 {
        return Err(LogError::parse(
            line_no,
            format!("thread list has {} fields, not a multiple of 3", triples.len()),
        ));
    }

    let mut row = head
        .iter()
        .map(|field| parse_float(field, line_no))
        .collect::<Result<Vec<_>, _>>()?;

    let mut threads = HashMap::with_capacity(triples.len() / 3);
    for triple in triples.chunks_exact(3) {
        let id = triple[0]
            .parse::<u64>()
            .map_err(|_| LogError::parse(line_no, format!("bad thread id {:?}", triple[0])))?;
        let user = parse_float(triple[1], line_no)?;
        let system = parse_float(triple[2], line_no)?;
        threads.insert(id, (user, system));
    }

    let count = churn.observe(threads);
    row.push(count.changed as f64);
    row.push(count.live as f64);
    Ok(row)
}
