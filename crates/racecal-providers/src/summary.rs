//! Aggregated outcome of a batch of port operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Which port an operation went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Calendar,
    Storage,
    Source,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Storage => "storage",
            Self::Source => "source",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed external operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub resource: Resource,
    /// Identity of the affected record, event or source date.
    pub id: String,
    pub reason: String,
}

/// Success and failure counts for a batch of operations.
///
/// `failure_count` always equals `failures.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<OperationFailure>,
}

impl OperationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, resource: Resource, id: impl Into<String>, reason: impl Into<String>) {
        self.failure_count += 1;
        self.failures.push(OperationFailure {
            resource,
            id: id.into(),
            reason: reason.into(),
        });
    }

    pub fn record_error(&mut self, resource: Resource, id: impl Into<String>, error: &ProviderError) {
        self.record_failure(resource, id, error.to_string());
    }

    /// Folds another summary into this one.
    pub fn merge(&mut self, other: OperationSummary) {
        self.success_count += other.success_count;
        self.failure_count += other.failure_count;
        self.failures.extend(other.failures);
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_track_failures() {
        let mut summary = OperationSummary::new();
        summary.record_success();
        summary.record_success();
        summary.record_error(
            Resource::Calendar,
            "keirin202412303811",
            &ProviderError::unavailable("timeout"),
        );

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_clean());
        assert_eq!(summary.failures[0].reason, "unavailable: timeout");
    }

    #[test]
    fn merge_adds_up() {
        let mut a = OperationSummary::new();
        a.record_success();
        let mut b = OperationSummary::new();
        b.record_failure(Resource::Storage, "jra202412220611", "disk full");
        b.record_success();

        a.merge(b);
        assert_eq!(a.success_count, 2);
        assert_eq!(a.failure_count, 1);
        assert_eq!(a.failures.len(), 1);
    }

    #[test]
    fn serialized_shape() {
        let mut summary = OperationSummary::new();
        summary.record_failure(Resource::Source, "nar/20241229", "unavailable: 503");
        insta::assert_json_snapshot!(summary, @r#"
        {
          "success_count": 0,
          "failure_count": 1,
          "failures": [
            {
              "resource": "source",
              "id": "nar/20241229",
              "reason": "unavailable: 503"
            }
          ]
        }
        "#);
    }
}
