//! Operator warnings on the terminal.

use console::style;
use gpubench_recorder::OperatorNotifier;

/// Prints a highlighted warning on stderr and mirrors it to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl OperatorNotifier for ConsoleNotifier {
    fn warn(&self, title: &str, message: &str) {
        tracing::warn!(title = %title, "{}", message);
        eprintln!("{} {}", style(format!("{title}:")).yellow().bold(), message);
    }
}
