//! Error taxonomy shared by the gateway and the reconciler.
//!
//! All errors are explicit and typed. Every variant maps onto one of the four
//! [`ErrorKind`]s reported to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for cql-user operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure, as reported in the structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required input missing or inconsistent for the selected operation.
    Validation,
    /// No cluster node could be reached.
    Connection,
    /// The cluster rejected the supplied credentials.
    Authentication,
    /// A statement failed after the connection was established.
    Execution,
}

impl ErrorKind {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Connection => "connection",
            Self::Authentication => "authentication",
            Self::Execution => "execution",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type for cql-user operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{reason}")]
    Validation { reason: String },

    #[error("unable to connect to {contact_point}: {reason}")]
    ConnectionFailed { contact_point: String, reason: String },

    #[error("authentication against {contact_point} failed: {reason}")]
    AuthenticationFailed { contact_point: String, reason: String },

    /// `statement` is the unrendered template, never the text with secrets bound.
    #[error("statement '{statement}' failed: {reason}")]
    ExecutionFailed { statement: String, reason: String },

    #[error("unexpected result for '{statement}': {reason}")]
    UnexpectedRows { statement: String, reason: String },
}

impl Error {
    /// Create a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create a connection error.
    pub fn connection_failed(contact_point: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            contact_point: contact_point.into(),
            reason: reason.into(),
        }
    }

    /// Create an authentication error.
    pub fn authentication_failed(
        contact_point: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::AuthenticationFailed {
            contact_point: contact_point.into(),
            reason: reason.into(),
        }
    }

    /// Create a statement execution error.
    pub fn execution_failed(statement: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            statement: statement.into(),
            reason: reason.into(),
        }
    }

    /// Create an error for a row set that does not have the expected shape.
    pub fn unexpected_rows(statement: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedRows {
            statement: statement.into(),
            reason: reason.into(),
        }
    }

    /// Classification reported to callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::ConnectionFailed { .. } => ErrorKind::Connection,
            Self::AuthenticationFailed { .. } => ErrorKind::Authentication,
            Self::ExecutionFailed { .. } | Self::UnexpectedRows { .. } => ErrorKind::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = Error::validation("Password is required in order to change password");
        assert_eq!(
            err.to_string(),
            "Password is required in order to change password"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_execution_failed_names_statement() {
        let err = Error::execution_failed("DROP USER IF EXISTS ?", "timeout");
        assert!(err.to_string().contains("DROP USER IF EXISTS ?"));
        assert!(err.to_string().contains("timeout"));
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_unexpected_rows_is_execution_kind() {
        let err = Error::unexpected_rows("LIST USERS", "missing column 'super'");
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_kind_serializes_snake_case() -> std::result::Result<(), serde_json::Error> {
        let json = serde_json::to_string(&ErrorKind::Authentication)?;
        assert_eq!(json, "\"authentication\"");
        Ok(())
    }
}
