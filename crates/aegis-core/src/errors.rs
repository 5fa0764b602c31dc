//! Error types shared by every Aegis subsystem
//!
//! Failures are grouped by where they come from: the generation server's
//! transport, the shape of its replies, the session store, and the local
//! configuration and document sources. Payloads are plain strings so the enum
//! stays `Clone` and can travel inside a fragment stream.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AegisError {
    #[error("Could not connect to the generation service: {0}")]
    TransportError(String),
    #[error("Malformed response from the generation service: {0}")]
    MalformedResponse(String),
    #[error("No response field in JSON")]
    MissingResponseField,
    #[error("Unknown session: {0}")]
    UnknownSession(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Document error: {0}")]
    DocumentError(String),
    #[error("Context retrieval failed: {0}")]
    ContextError(String),
    #[error("I/O error: {0}")]
    IoError(String),
}

impl AegisError {
    /// Transport failures are the only kind a retry could fix.
    pub fn is_transport(&self) -> bool {
        matches!(self, AegisError::TransportError(_))
    }
}

impl From<std::io::Error> for AegisError {
    fn from(err: std::io::Error) -> Self {
        AegisError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for AegisError {
    fn from(err: reqwest::Error) -> Self {
        AegisError::TransportError(describe_request_error(&err))
    }
}

/// Request error text followed by its causes, labelled when the client gave up
/// waiting.
pub(crate) fn describe_request_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }

    if err.is_timeout() {
        format!("request timed out: {}", message)
    } else {
        message
    }
}

impl From<serde_json::Error> for AegisError {
    fn from(err: serde_json::Error) -> Self {
        AegisError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_matches_server_contract() {
        assert_eq!(
            AegisError::MissingResponseField.to_string(),
            "No response field in JSON"
        );
    }

    #[test]
    fn test_json_errors_are_malformed_responses() {
        let err: AegisError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AegisError::MalformedResponse(_)));
        assert!(!err.is_transport());
    }
}
