//! Client error types.

use racecal_core::{IdentityError, TracingError};
use racecal_providers::ProviderError;
use racecal_sync::SyncError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("invalid identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to initialise logging: {0}")]
    Tracing(#[from] TracingError),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    /// The run finished but some operations failed.
    #[error("{failures} operation(s) failed")]
    Incomplete { failures: usize },
}
