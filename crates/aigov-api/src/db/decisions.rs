//! Governance action persistence — the durable decision log.
//!
//! Append-only: rows are inserted, never updated or deleted. The
//! `context_snapshot` column is JSONB holding the frozen event and policy
//! state that make a decision replayable.

use aigov_core::{DecisionId, EnterpriseId, ThreadId};
use aigov_replay::{ActionType, ContextSnapshot, GovernanceAction};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Append a decision record to the durable log.
pub async fn append(pool: &PgPool, action: &GovernanceAction) -> Result<(), sqlx::Error> {
    let snapshot_json = action
        .context_snapshot
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        "INSERT INTO governance_actions
         (id, thread_id, enterprise_id, action_type, rationale, context_snapshot, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(action.id.as_uuid())
    .bind(action.thread_id.as_uuid())
    .bind(action.enterprise_id.as_uuid())
    .bind(action.action_type.as_str())
    .bind(&action.rationale)
    .bind(snapshot_json)
    .bind(action.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct DecisionRow {
    id: Uuid,
    thread_id: Uuid,
    enterprise_id: Uuid,
    action_type: String,
    rationale: Option<String>,
    context_snapshot: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl DecisionRow {
    fn into_action(self) -> Result<GovernanceAction, serde_json::Error> {
        let context_snapshot = self
            .context_snapshot
            .map(serde_json::from_value::<ContextSnapshot>)
            .transpose()?;
        Ok(GovernanceAction {
            id: DecisionId::from_uuid(self.id),
            thread_id: ThreadId::from_uuid(self.thread_id),
            enterprise_id: EnterpriseId::from_uuid(self.enterprise_id),
            action_type: ActionType::parse(&self.action_type),
            rationale: self.rationale,
            context_snapshot,
            created_at: self.created_at,
        })
    }
}

/// Load one decision from the durable log.
pub async fn get(pool: &PgPool, id: DecisionId) -> Result<Option<GovernanceAction>, sqlx::Error> {
    let row = sqlx::query_as::<_, DecisionRow>(
        "SELECT id, thread_id, enterprise_id, action_type, rationale, context_snapshot, created_at
         FROM governance_actions WHERE id = $1",
    )
    .bind(id.as_uuid())
    .fetch_optional(pool)
    .await?;

    row.map(|r| r.into_action())
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Load an enterprise's decisions inside a recency window, oldest first.
pub async fn list_for_enterprise(
    pool: &PgPool,
    enterprise_id: EnterpriseId,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<GovernanceAction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DecisionRow>(
        "SELECT id, thread_id, enterprise_id, action_type, rationale, context_snapshot, created_at
         FROM governance_actions
         WHERE enterprise_id = $1 AND created_at >= $2
         ORDER BY created_at ASC
         LIMIT $3",
    )
    .bind(enterprise_id.as_uuid())
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| r.into_action())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
