//! Audit event persistence — immutable hash chain.
//!
//! Every appended event carries a SHA-256 hash chaining to the previous
//! event, forming a tamper-evident log. The chain starts from a zero hash.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// An audit event to be persisted.
pub struct AuditEvent {
    /// Event kind (`decision_recorded`, `context_switched`, …).
    pub kind: String,
    /// The subject the event concerns.
    pub subject: Option<String>,
    /// Structured metadata payload.
    pub metadata: serde_json::Value,
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Append an audit event to the immutable log.
///
/// Computes the event hash by chaining with the previous event's hash.
pub async fn append(pool: &PgPool, event: AuditEvent) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    let previous_hash: Option<String> = sqlx::query_scalar(
        "SELECT event_hash FROM audit_events ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    let prev = previous_hash.as_deref().unwrap_or(ZERO_HASH);

    let hash_input = format!(
        "{}{}{}{}",
        prev,
        event.kind,
        event.subject.as_deref().unwrap_or(""),
        event.metadata,
    );
    let event_hash = sha256_hex(&hash_input);

    sqlx::query(
        "INSERT INTO audit_events (id, kind, subject, metadata, previous_hash, event_hash, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, NOW())",
    )
    .bind(id)
    .bind(&event.kind)
    .bind(&event.subject)
    .bind(&event.metadata)
    .bind(prev)
    .bind(&event_hash)
    .execute(pool)
    .await?;

    Ok(id)
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    kind: String,
    subject: Option<String>,
    metadata: serde_json::Value,
    previous_hash: String,
    event_hash: String,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

/// Verify the hash chain over the whole log.
///
/// Returns the index of the first broken link, or `None` when the chain is
/// intact.
pub async fn verify_chain(pool: &PgPool) -> Result<Option<usize>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AuditRow>(
        "SELECT kind, subject, metadata, previous_hash, event_hash, created_at
         FROM audit_events ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    let mut expected_prev = ZERO_HASH.to_string();
    for (index, row) in rows.iter().enumerate() {
        if row.previous_hash != expected_prev {
            return Ok(Some(index));
        }
        let hash_input = format!(
            "{}{}{}{}",
            row.previous_hash,
            row.kind,
            row.subject.as_deref().unwrap_or(""),
            row.metadata,
        );
        if sha256_hex(&hash_input) != row.event_hash {
            return Ok(Some(index));
        }
        expected_prev = row.event_hash.clone();
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_stable() {
        let a = sha256_hex("abc");
        let b = sha256_hex("abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn zero_hash_is_64_zeroes() {
        assert_eq!(ZERO_HASH.len(), 64);
        assert!(ZERO_HASH.chars().all(|c| c == '0'));
    }
}
