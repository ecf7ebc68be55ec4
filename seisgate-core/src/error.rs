//! Error types for gateway operations

use thiserror::Error;

/// The two recoverable failure kinds a request can end in.
///
/// `InvalidArgument` covers everything the caller can fix by changing the
/// request. `Internal` covers engine failures, unreachable datasets and
/// rejected credentials.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Human-readable message without the kind.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(message) | Self::Internal(message) => message,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Replace every occurrence of `secret` in the message.
    ///
    /// Engine messages may echo connection strings back; the request's
    /// credential must never reach a caller or a log line.
    pub fn redact(self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        match self {
            Self::InvalidArgument(message) => {
                Self::InvalidArgument(message.replace(secret, "<redacted>"))
            }
            Self::Internal(message) => Self::Internal(message.replace(secret, "<redacted>")),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Internal(format!("Serialization failed: {}", err))
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_message() {
        let err = GatewayError::invalid_argument("invalid direction 'x'");
        assert_eq!(err.to_string(), "invalid direction 'x'");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_redact_removes_secret() {
        let err = GatewayError::internal("Could not open VDS: sv=2020&sig=abc failed");
        let redacted = err.redact("sv=2020&sig=abc");
        assert_eq!(redacted.message(), "Could not open VDS: <redacted> failed");
        assert!(!redacted.is_invalid_argument());
    }

    #[test]
    fn test_redact_with_empty_secret_is_identity() {
        let err = GatewayError::internal("boom");
        assert_eq!(err.clone().redact(""), err);
    }
}
