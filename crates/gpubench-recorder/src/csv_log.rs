//! Durable CSV result log.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{BenchResult, ConsoleLogger, OperatorNotifier, ResultSink, TracingNotifier};

/// Header row written when the log is created.
pub const CSV_HEADER: &str = "DateTime,User,GPU,Benchmark,Score\n";

/// Title of the operator warning raised when a record cannot be written.
pub const WRITE_WARNING_TITLE: &str = "File Write Warning";

/// Appends one record per result to a CSV log.
///
/// On a failed write the record goes to the fallback sink (the console by
/// default) and the operator is warned once for that write.
pub struct CsvLogger {
    label: String,
    writer: Option<Box<dyn Write + Send>>,
    fallback: Box<dyn ResultSink>,
    notifier: Arc<dyn OperatorNotifier>,
}

impl CsvLogger {
    /// Open `<base>.csv`, creating it with a header if needed.
    pub fn open(base: impl AsRef<Path>) -> io::Result<Self> {
        let mut name = base.as_ref().as_os_str().to_owned();
        name.push(".csv");
        Self::open_path(PathBuf::from(name))
    }

    /// Open the log at exactly `path`.
    ///
    /// The header is written only when the file is new (or empty); an
    /// existing log is opened in append mode.
    pub fn open_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        // Unbuffered, so a failed record never reaches the file on a later write.
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let fresh = file.metadata()?.len() == 0;
        if fresh {
            file.write_all(CSV_HEADER.as_bytes())?;
            tracing::info!(path = %path.display(), "created result log");
        } else {
            tracing::debug!(path = %path.display(), "appending to existing result log");
        }
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_writer(label, file))
    }

    /// Wrap an arbitrary writer. No header is written.
    pub fn from_writer(label: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            label: label.into(),
            writer: Some(Box::new(writer)),
            fallback: Box::new(ConsoleLogger::stdout()),
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn ResultSink>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OperatorNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Name shown to the operator in warnings.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn try_write(&mut self, result: &BenchResult) -> io::Result<()> {
        let record = result.to_csv_record().map_err(io::Error::other)?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "result log is closed"))?;
        writer.write_all(record.as_bytes())?;
        writer.flush()
    }
}

impl ResultSink for CsvLogger {
    fn write(&mut self, result: &BenchResult) {
        match self.try_write(result) {
            Ok(()) => {
                tracing::debug!(log = %self.label, benchmark = %result.benchmark, "result recorded");
            }
            Err(e) => {
                tracing::error!(log = %self.label, error = %e, "failed to write result log");
                self.fallback.write(result);
                self.notifier.warn(
                    WRITE_WARNING_TITLE,
                    &format!(
                        "Can not write to the {} file. Will write to the console instead.",
                        self.label
                    ),
                );
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::error!(log = %self.label, error = %e, "failed to flush result log on close");
            }
        }
        self.fallback.close();
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        self.close();
    }
}
