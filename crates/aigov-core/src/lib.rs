#![deny(missing_docs)]

//! # aigov-core — Foundational Types for the AI Governance Core
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde`, `serde_json`,
//! `thiserror`, `chrono`, `uuid`, `sha2`, `parking_lot`, and `tracing` from
//! the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`DecisionId`] where a [`SnapshotId`]
//!    is expected.
//!
//! 2. **One error taxonomy.** [`GovernanceError`] distinguishes the cases
//!    callers must tell apart — in particular [`GovernanceError::DataIncomplete`]
//!    ("too old to replay") is never collapsed into `NotFound`.
//!
//! 3. **Fail-closed by construction.** Nothing in this crate, or in the
//!    crates above it, resolves an evaluation failure to approval.
//!
//! 4. **The audit log is a seam.** [`audit::AuditSink`] is the append-only
//!    boundary the governance core writes into; the store behind it is not
//!    owned by this workspace.

pub mod audit;
pub mod error;
pub mod id;
pub mod version;

pub use audit::{AuditEntry, AuditEntryKind, AuditSink, InMemoryAuditLog};
pub use error::{GovernanceError, ValidationError};
pub use id::{ContextId, DecisionId, EnterpriseId, SeatId, SnapshotId, ThreadId, TokenId, UserId};
pub use version::VersionString;
