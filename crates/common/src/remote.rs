//! Errors surfaced by remote collaborators (server cart, order materialization,
//! payment gateway).

use thiserror::Error;

/// Failure of a call to a remote collaborator.
///
/// Every network seam in the workspace speaks this type so the cart engine
/// and the checkout orchestrator can decide on rollback and retry without
/// knowing which transport produced the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The server rejected the call because the shopper is not authenticated (HTTP 401).
    #[error("authentication required")]
    AuthRequired,

    /// Timeout, connection failure, or 5xx response.
    #[error("transient network error: {0}")]
    Transient(String),

    /// The server understood the request and refused it.
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Returns true if the failure may succeed when repeated.
    ///
    /// Only read paths act on this; mutations are never retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }

    /// Maps an HTTP status and message body to the matching variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => RemoteError::AuthRequired,
            408 | 429 | 500..=599 => RemoteError::Transient(format!("status {status}: {message}")),
            _ => RemoteError::Rejected { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RemoteError::from_status(401, ""), RemoteError::AuthRequired);
        assert!(RemoteError::from_status(503, "down").is_retryable());
        assert!(RemoteError::from_status(408, "slow").is_retryable());
        assert_eq!(
            RemoteError::from_status(409, "price changed"),
            RemoteError::Rejected {
                status: 409,
                message: "price changed".to_string()
            }
        );
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(!RemoteError::AuthRequired.is_retryable());
        assert!(!RemoteError::Decode("eof".into()).is_retryable());
        assert!(
            !RemoteError::Rejected {
                status: 400,
                message: String::new()
            }
            .is_retryable()
        );
    }
}
