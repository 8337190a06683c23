//! # Authorization Errors
//!
//! The authentication and authorization variants carry fixed messages:
//! responses must not reveal whether an identifier exists, whether a secret
//! was wrong, or whether a context exists but belongs to someone else.

use thiserror::Error;

/// Errors from the context and authorization layer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    /// Credential verification failed. Fixed message regardless of which
    /// check failed (unknown identifier, wrong secret, inactive user,
    /// missing default context).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The caller may not act in the requested scope. Fixed message
    /// regardless of which check failed.
    #[error("access denied")]
    Forbidden,

    /// The requested context is unknown or inactive for this caller.
    #[error("context not found")]
    ContextNotFound,

    /// A referenced directory record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A multi-step write was rolled back; no partial state is visible.
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    /// Malformed input to a directory operation.
    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failure_message_is_fixed() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
    }

    #[test]
    fn forbidden_message_is_fixed() {
        assert_eq!(AuthError::Forbidden.to_string(), "access denied");
    }

    #[test]
    fn context_not_found_does_not_name_the_context() {
        assert_eq!(AuthError::ContextNotFound.to_string(), "context not found");
    }
}
