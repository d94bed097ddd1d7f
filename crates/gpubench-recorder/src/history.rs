//! Reading the result log back.

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

use crate::{BenchResult, CSV_HEADER, TIMESTAMP_FORMAT};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read result log: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse result log: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

/// Parse one CSV record into a result.
pub fn parse_record(record: &StringRecord) -> Result<BenchResult, HistoryError> {
    let line = record.position().map_or(0, |p| p.line());
    let malformed = |reason: String| HistoryError::Malformed { line, reason };
    let fields: Vec<&str> = record.iter().collect();
    let [timestamp, user, device, benchmark, score] = fields[..] else {
        return Err(malformed(format!("expected 5 fields, found {}", fields.len())));
    };
    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| malformed(format!("bad timestamp `{timestamp}`: {e}")))?;
    let score = score.parse::<f64>().map_err(|e| malformed(format!("bad score `{score}`: {e}")))?;
    Ok(BenchResult {
        timestamp,
        user: user.to_owned(),
        device: device.to_owned(),
        benchmark: benchmark.to_owned(),
        score,
    })
}

/// Read every well-formed record in the log at `path`.
///
/// Header rows are skipped; malformed records are logged and skipped.
pub fn read_history(path: &Path) -> Result<Vec<BenchResult>, HistoryError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().has_headers(false).flexible(true).from_reader(file);
    let header: Vec<&str> = CSV_HEADER.trim_end().split(',').collect();
    let mut results = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable history record");
                continue;
            }
        };
        if record.iter().eq(header.iter().copied()) {
            continue;
        }
        match parse_record(&record) {
            Ok(result) => results.push(result),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping history record"),
        }
    }
    Ok(results)
}
