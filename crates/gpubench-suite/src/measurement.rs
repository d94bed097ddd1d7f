//! Timing and score of a completed run.

use std::time::Duration;

/// Observable output of one `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub elapsed: Duration,
    /// Units of work performed (multiply-accumulates, bytes, ...).
    pub work_units: u64,
    /// Unit of [`Measurement::score`].
    pub unit: &'static str,
    pub score: f64,
}

impl Measurement {
    /// Throughput score: millions of work units per second.
    pub fn throughput(elapsed: Duration, work_units: u64, unit: &'static str) -> Self {
        let secs = elapsed.as_secs_f64();
        let score = if secs > 0.0 { work_units as f64 / secs / 1e6 } else { 0.0 };
        Self { elapsed, work_units, unit, score }
    }

    /// Combine several measurements; the score is the geometric mean of the
    /// part scores (0 if any part scored 0).
    pub fn composite(parts: &[Measurement]) -> Self {
        let elapsed = parts.iter().map(|m| m.elapsed).sum();
        let work_units = parts.iter().map(|m| m.work_units).sum();
        let score = if parts.is_empty() || parts.iter().any(|m| m.score <= 0.0) {
            0.0
        } else {
            let log_sum: f64 = parts.iter().map(|m| m.score.ln()).sum();
            (log_sum / parts.len() as f64).exp()
        };
        Self { elapsed, work_units, unit: "points", score }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1e3
    }
}
