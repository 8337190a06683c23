//! # Audit Log Seam
//!
//! The governance core writes decisions and context actions into an
//! append-only audit store it does not own. [`AuditSink`] is that boundary;
//! [`InMemoryAuditLog`] is the process-local implementation used by tests
//! and single-node deployments. A Postgres-backed implementation lives in
//! the API crate.
//!
//! ## Security Invariant
//!
//! Every entry is individually digestable: `SHA-256` over the entry's
//! canonical JSON. The in-memory log uses a bounded buffer that trims the
//! oldest 10% when the configured maximum is exceeded; trimmed entries are
//! expected to have been persisted durably before trimming in production.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// AuditEntryKind
// ---------------------------------------------------------------------------

/// The kind of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntryKind {
    /// A tool-usage event was evaluated and a verdict recorded.
    DecisionRecorded,
    /// A historical decision was replayed under a different policy.
    DecisionReplayed,
    /// A policy snapshot was activated for an enterprise.
    PolicyActivated,
    /// A user authenticated and received a context-bound token.
    SessionOpened,
    /// A session switched to a different user context.
    ContextSwitched,
    /// A session was closed (logout or expiry).
    SessionClosed,
    /// An enterprise was created.
    EnterpriseCreated,
    /// An agency seat was created.
    SeatCreated,
}

impl AuditEntryKind {
    /// Return the string value used in serialized entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DecisionRecorded => "decision_recorded",
            Self::DecisionReplayed => "decision_replayed",
            Self::PolicyActivated => "policy_activated",
            Self::SessionOpened => "session_opened",
            Self::ContextSwitched => "context_switched",
            Self::SessionClosed => "session_closed",
            Self::EnterpriseCreated => "enterprise_created",
            Self::SeatCreated => "seat_created",
        }
    }
}

impl std::fmt::Display for AuditEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

/// A single entry in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The kind of audit event.
    pub kind: AuditEntryKind,
    /// UTC timestamp when the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The subject the event concerns (decision id, context id, …).
    pub subject: Option<String>,
    /// Structured metadata payload.
    pub metadata: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Create a new audit entry with the current UTC timestamp.
    pub fn new(
        kind: AuditEntryKind,
        subject: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            subject,
            metadata,
        }
    }

    /// SHA-256 digest of the entry's canonical JSON, as lowercase hex.
    ///
    /// Returns `None` only if serialization fails, which cannot happen for
    /// well-formed entries.
    pub fn digest_hex(&self) -> Option<String> {
        let bytes = match serde_json::to_vec(self) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "audit entry serialization failed — digest unavailable");
                return None;
            }
        };
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Some(hex_encode(&hasher.finalize()))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// AuditSink
// ---------------------------------------------------------------------------

/// Append-only boundary to the audit store.
///
/// Implementations must never drop or reorder entries on the append path;
/// retention is the store's concern, not the caller's.
pub trait AuditSink: Send + Sync {
    /// Append one entry.
    fn append(&self, entry: AuditEntry);
}

// ---------------------------------------------------------------------------
// InMemoryAuditLog
// ---------------------------------------------------------------------------

/// Process-local audit log with a bounded buffer.
///
/// When the log exceeds its configured maximum, the oldest 10% of entries
/// are trimmed (at least one).
#[derive(Debug)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
    max_entries: usize,
}

impl InMemoryAuditLog {
    /// Create a log with the given maximum capacity.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_entries,
        }
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    /// Number of entries currently retained.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries of a specific kind, oldest first.
    pub fn entries_of_kind(&self, kind: AuditEntryKind) -> Vec<AuditEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Entries whose subject equals the given value, oldest first.
    pub fn entries_for_subject(&self, subject: &str) -> Vec<AuditEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.subject.as_deref() == Some(subject))
            .cloned()
            .collect()
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append(&self, entry: AuditEntry) {
        let mut guard = self.entries.write();
        guard.push(entry);
        if guard.len() > self.max_entries {
            let trim = (self.max_entries / 10).max(1);
            guard.drain(..trim);
        }
    }
}
