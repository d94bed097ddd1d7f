//! Console result sink, used as the fallback for the CSV log.

use std::io::{self, Write};

use crate::{BenchResult, ResultSink};

/// Writes CSV records to a stream (stdout by default).
pub struct ConsoleLogger<W: Write + Send = io::Stdout> {
    out: W,
}

impl ConsoleLogger {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write + Send> ConsoleLogger<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ResultSink for ConsoleLogger<W> {
    fn write(&mut self, result: &BenchResult) {
        let outcome = result.to_csv_record().map_err(io::Error::other).and_then(|record| {
            self.out.write_all(record.as_bytes())?;
            self.out.flush()
        });
        if let Err(e) = outcome {
            // Last resort: there is no further sink to fall back to.
            tracing::error!(error = %e, result = %result, "console sink write failed");
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::error!(error = %e, "failed to flush console sink");
        }
    }
}
