//! Error types shared by every gpubench crate.

use thiserror::Error;

/// Coarse classification of a [`BenchError`].
///
/// Front ends use this to decide how a failure is presented: configuration
/// and persistence problems degrade gracefully, while device and dispatch
/// failures abort the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    DeviceCapability,
    Dispatch,
    Persistence,
    Cancelled,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::DeviceCapability => write!(f, "device capability"),
            Self::Dispatch => write!(f, "dispatch"),
            Self::Persistence => write!(f, "persistence"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Errors produced while preparing, running or recording a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid benchmark configuration: {0}")]
    Config(String),

    #[error("benchmark `{0}` used before initialize()")]
    NotInitialized(&'static str),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("device `{device}` reports invalid limits: {reason}")]
    InvalidDeviceLimits { device: String, reason: String },

    #[error("invalid execution grid: {0}")]
    InvalidGrid(String),

    #[error("kernel dispatch failed: {0}")]
    Dispatch(String),

    #[error("failed to persist result: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("benchmark run was cancelled")]
    Cancelled,
}

impl BenchError {
    /// The error category used for user-facing reporting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::NotInitialized(_) => ErrorCategory::Configuration,
            Self::DeviceNotFound(_) | Self::InvalidDeviceLimits { .. } => {
                ErrorCategory::DeviceCapability
            }
            Self::InvalidGrid(_) | Self::Dispatch(_) => ErrorCategory::Dispatch,
            Self::Persistence(_) => ErrorCategory::Persistence,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Whether the error aborts a run (as opposed to degrading gracefully).
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::DeviceCapability | ErrorCategory::Dispatch | ErrorCategory::Cancelled
        )
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, BenchError>;
