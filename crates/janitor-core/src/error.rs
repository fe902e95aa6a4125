//! Error types for janitor-core and the crates built on it

use std::time::Duration;
use thiserror::Error;

/// Result type alias using janitor-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed provider error, as returned by SDK and Kubernetes clients
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error taxonomy for a janitor run
///
/// Only [`Error::Decode`] is recovered locally (the offending artifact or
/// object is logged and skipped). Every other variant terminates the run.
#[derive(Error, Debug)]
pub enum Error {
    /// Contradictory or missing policy fields
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// Any ECS/Lambda/EKS/Kubernetes/registry API failure, including pagination
    #[error("{operation} failed: {source}")]
    Provider {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// Malformed manifest JSON or Kubernetes payload
    #[error("Failed to decode {subject}: {message}")]
    Decode { subject: String, message: String },

    /// External command exceeded its time bound
    #[error("External command `{command}` timed out after {}s", timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    /// External command exited unsuccessfully or printed an invalid payload
    #[error("External command `{command}` failed: {status}")]
    CommandFailed { command: String, status: String },

    /// Deletion confirmation was declined
    #[error("Aborted: deletion on {repository} was not confirmed")]
    Aborted { repository: String },

    /// The run was cancelled before completion
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a provider failure with the operation that produced it
    pub fn provider<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Provider {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Create a decode error
    pub fn decode(subject: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            subject: subject.into(),
            message: message.to_string(),
        }
    }

    /// Create a timeout error
    pub fn timeout(command: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            command: command.into(),
            timeout,
        }
    }

    /// Create a failed-command error
    pub fn command_failed(command: impl Into<String>, status: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
        }
    }

    /// Create an aborted error
    pub fn aborted(repository: impl Into<String>) -> Self {
        Self::Aborted {
            repository: repository.into(),
        }
    }

    /// Whether the error is handled locally by skipping the affected item
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_decode_is_recoverable() {
        assert!(Error::decode("manifest", "bad json").is_recoverable());
        assert!(!Error::configuration("x").is_recoverable());
        assert!(!Error::aborted("repo").is_recoverable());
        assert!(!Error::timeout("sleep 10", Duration::from_secs(1)).is_recoverable());
        assert!(!Error::Cancelled.is_recoverable());
    }

    #[test]
    fn test_provider_error_message() {
        let err = Error::provider("ecs:ListClusters", "throttled");
        assert_eq!(err.to_string(), "ecs:ListClusters failed: throttled");
    }

    #[test]
    fn test_timeout_message() {
        let err = Error::timeout("sleep 1", Duration::from_millis(1500));
        assert!(err.to_string().contains("1.5s"));
    }
}
