//! Sync engine error types.
//!
//! Port failures never show up here: they are counted in an
//! [`OperationSummary`](racecal_providers::OperationSummary) and the cycle
//! carries on. These errors stop a run before or outside a cycle.

use thiserror::Error;

/// Result type for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid sync settings.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The scheduler loop is no longer receiving commands.
    #[error("Scheduler is not running")]
    SchedulerStopped,
}

impl SyncError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for SyncError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::SchedulerStopped
    }
}
