use std::time::Duration;

use thiserror::Error;

use crate::types::ItemId;

/// External collaborator that a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Pricing rule table store
    RuleTable,
    /// AI image-analysis provider
    Analysis,
    /// AI image-generation provider
    Render,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Service::RuleTable => "rule table",
            Service::Analysis => "analysis provider",
            Service::Render => "render provider",
        };
        f.write_str(name)
    }
}

/// Main crate error type.
///
/// Data gaps (an unresolvable pricing rule or colour) are deliberately absent:
/// they are recovered locally and reported through
/// [`PriceBreakdown::data_gaps`](crate::pricing::PriceBreakdown) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // === Upstream failures ===
    /// A collaborator was unreachable or returned an unusable response
    #[error("{service} failure: {message}")]
    Upstream { service: Service, message: String },

    /// A collaborator exceeded its fixed response ceiling
    #[error("{service} timed out after {}s", after.as_secs())]
    Timeout { service: Service, after: Duration },

    // === Policy ===
    /// Free-text instructions rejected before any render call
    #[error("Policy '{policy}' violated: {message}")]
    PolicyViolation {
        policy: &'static str,
        message: String,
    },

    // === Session state ===
    /// Mutator addressed an item that does not exist in the live state
    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    /// Operation requires state that has not been established yet
    #[error("Missing state: {0}")]
    MissingState(&'static str),

    // === Configuration and IO ===
    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// JSON parse error
    #[error("Json parse error: {0}")]
    Json(String),

    /// TOML parse error
    #[error("Toml parse error: {0}")]
    Toml(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(String),
}

// Convenience constructors for common error patterns
impl Error {
    /// Create an upstream failure for the given collaborator
    pub fn upstream(service: Service, message: impl Into<String>) -> Self {
        Error::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Create a timeout failure for the given collaborator
    pub fn timeout(service: Service, after: Duration) -> Self {
        Error::Timeout { service, after }
    }

    /// Whether the failure came from an external collaborator
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::Timeout { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Toml(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout(Service::Render, Duration::from_secs(60));
        assert_eq!(err.to_string(), "render provider timed out after 60s");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_policy_violation_is_not_upstream() {
        let err = Error::PolicyViolation {
            policy: "no-new-items",
            message: "nope".to_string(),
        };
        assert!(!err.is_upstream());
        assert!(err.to_string().contains("no-new-items"));
    }
}
