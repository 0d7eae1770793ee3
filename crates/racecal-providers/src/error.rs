//! Error types for port operations.
//!
//! Every calendar, storage and source implementation reports failures as a
//! [`ProviderError`]. The orchestrator never inspects more than the code and
//! the message: a failure is recorded against the affected id and the cycle
//! moves on.

use std::fmt;

use racecal_core::{RaceType, RecordError};
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The addressed event or record does not exist.
    NotFound,
    /// An insert collided with an existing id.
    Conflict,
    /// Filesystem or transport failure.
    Io,
    /// Data read back from a backend did not parse or validate.
    InvalidData,
    /// The backend is temporarily not answering.
    Unavailable,
    Internal,
}

impl ProviderErrorCode {
    /// Returns true if the next cycle may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Unavailable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Io => "io",
            Self::InvalidData => "invalid_data",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error returned by a port implementation.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Name of the backend that failed, e.g. "file-calendar".
    backend: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            backend: None,
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Conflict, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Io, message)
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidData, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Internal, message)
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref backend) = self.backend {
            write!(f, "[{}] ", backend)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Why a raw source row could not become a [`racecal_core::RaceRecord`].
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unparseable {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("{race_type} row is missing {field}")]
    MissingField {
        race_type: RaceType,
        field: &'static str,
    },

    #[error("no {race_type} venue has display code {code:02}")]
    UnknownDisplayCode { race_type: RaceType, code: u8 },

    #[error(transparent)]
    Record(#[from] RecordError),
}

impl NormalizeError {
    pub(crate) fn invalid(field: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}
