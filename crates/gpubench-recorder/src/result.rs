//! Completed-run records.

use chrono::{Local, NaiveDateTime};
use std::fmt;

/// `strftime` pattern of the `DateTime` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata of one completed run. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchResult {
    pub timestamp: NaiveDateTime,
    pub user: String,
    pub device: String,
    pub benchmark: String,
    pub score: f64,
}

impl BenchResult {
    /// Record a result stamped with the current local time.
    pub fn new(
        user: impl Into<String>,
        device: impl Into<String>,
        benchmark: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            user: user.into(),
            device: device.into(),
            benchmark: benchmark.into(),
            score,
        }
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// One newline-terminated CSV record in `DateTime,User,GPU,Benchmark,Score` order.
    pub fn to_csv_record(&self) -> csv::Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record([
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.user.clone(),
            self.device.clone(),
            self.benchmark.clone(),
            format!("{:.2}", self.score),
        ])?;
        let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ran {} on {}: {:.2}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.user,
            self.benchmark,
            self.device,
            self.score
        )
    }
}

/// Name of the operator running the benchmark.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
