//! Result recording for gpubench
//!
//! Completed runs become a [`BenchResult`] that a [`ResultSink`] persists.
//! [`CsvLogger`] appends to a durable CSV log and, when a write fails, hands
//! the record to a fallback sink and raises a warning on the
//! [`OperatorNotifier`] channel instead of dropping it.

pub mod console;
pub mod csv_log;
pub mod history;
pub mod notify;
pub mod result;

pub use console::ConsoleLogger;
pub use csv_log::{CSV_HEADER, CsvLogger, WRITE_WARNING_TITLE};
pub use history::{HistoryError, read_history};
pub use notify::{OperatorNotifier, TracingNotifier};
pub use result::{BenchResult, TIMESTAMP_FORMAT, current_user};

/// Destination for completed benchmark results.
///
/// `write` never fails from the caller's perspective: sinks are expected to
/// degrade (fallback, warning) rather than raise.
pub trait ResultSink: Send {
    fn write(&mut self, result: &BenchResult);

    /// Release the underlying resource. Safe to call more than once.
    fn close(&mut self);
}
