//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error taxonomy used throughout the governance core. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Validation failures name the offending field and are never retried.
//! - [`GovernanceError::DataIncomplete`] is a distinct case from
//!   [`GovernanceError::NotFound`]: a decision that exists but predates
//!   context snapshotting cannot be replayed, and callers must be able to
//!   tell the two apart.
//! - Authentication and authorization failures carry uniform, fixed
//!   messages so responses cannot be used to enumerate accounts or
//!   contexts.

use thiserror::Error;

/// Top-level error type for the governance core.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Malformed event, rule, or rule set. Surfaced immediately, never retried.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record (decision, policy version, context) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record exists but lacks the context snapshot required to replay it.
    #[error("decision {0} has no context snapshot and cannot be replayed")]
    DataIncomplete(String),

    /// Credential verification failed. The message is uniform regardless of
    /// which check failed.
    #[error("invalid credentials")]
    Authentication,

    /// The caller is not permitted to act in the requested scope. The message
    /// is uniform regardless of which check failed.
    #[error("access denied")]
    Authorization,

    /// A multi-step write could not commit; no partial state was left behind.
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
}

/// Validation failures for events, rules, and rule sets.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required field was empty or missing.
    #[error("field '{field}' must not be empty")]
    EmptyField {
        /// The offending field path.
        field: String,
    },

    /// Two rules in the same scope share a priority, making ordering
    /// dependent on sort stability.
    #[error("duplicate priority {priority} in scope '{scope}' (rules '{first}' and '{second}')")]
    DuplicatePriority {
        /// The scope (`context_id`) containing the collision.
        scope: String,
        /// The colliding priority value.
        priority: i32,
        /// First rule with this priority.
        first: String,
        /// Second rule with this priority.
        second: String,
    },

    /// A field value was out of its permitted range or form.
    #[error("field '{field}' is invalid: {reason}")]
    InvalidField {
        /// The offending field path.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}
