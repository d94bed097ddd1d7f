//! Operator warning channel.

/// Surface for non-fatal problems the operator should see.
pub trait OperatorNotifier: Send + Sync {
    fn warn(&self, title: &str, message: &str);
}

/// Emits warnings through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl OperatorNotifier for TracingNotifier {
    fn warn(&self, title: &str, message: &str) {
        tracing::warn!(title = %title, "{}", message);
    }
}
