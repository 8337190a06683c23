//! # Replay Routes
//!
//! Single-decision replay and bulk policy impact analysis. Both routes are
//! gated on `replay:run` and scoped to the caller's enterprise — replaying
//! another tenant's decisions is answered with 404, not 403, so the
//! response does not confirm the decision exists.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use aigov_core::{DecisionId, SnapshotId};
use aigov_replay::{BulkReplayOptions, BulkReplayReport, DecisionStore, ReplayResult, ReplayTarget};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Single replay request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    /// The decision to replay.
    #[schema(value_type = String)]
    pub decision_id: DecisionId,
    /// Explicit target version label. Mutually exclusive with
    /// `targetPolicyId`; omitted means the current active snapshot.
    #[serde(default)]
    pub target_policy_version: Option<String>,
    /// Explicit target snapshot id.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub target_policy_id: Option<SnapshotId>,
}

impl ReplayRequest {
    fn target(&self) -> ReplayTarget {
        if let Some(id) = self.target_policy_id {
            ReplayTarget::ById(id)
        } else if let Some(version) = &self.target_policy_version {
            ReplayTarget::ByVersion(version.clone())
        } else {
            ReplayTarget::CurrentActive
        }
    }
}

/// Bulk replay request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplayRequest {
    /// The enterprise to replay. Must be the caller's own unless the caller
    /// is the platform superuser.
    #[schema(value_type = String)]
    pub enterprise_id: aigov_core::EnterpriseId,
    /// Source policy version: only decisions stored under it are replayed.
    pub from_policy_version: String,
    /// Target policy version.
    pub to_policy_version: String,
    /// Selection options.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub options: Option<BulkReplayOptions>,
}

impl Validate for BulkReplayRequest {
    fn validate(&self) -> Result<(), String> {
        if self.from_policy_version.trim().is_empty() {
            return Err("fromPolicyVersion must not be empty".to_string());
        }
        if self.to_policy_version.trim().is_empty() {
            return Err("toPolicyVersion must not be empty".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the replay router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/replay", post(replay_decision))
        .route("/v1/replay/bulk", post(bulk_replay))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/replay — replay one decision under a different policy.
#[utoipa::path(
    post,
    path = "/v1/replay",
    request_body = ReplayRequest,
    responses(
        (status = 200, description = "Replay result"),
        (status = 404, description = "Decision or target policy unknown"),
        (status = 409, description = "Decision predates context snapshotting (DATA_INCOMPLETE)"),
    ),
    security(("bearer_token" = []))
)]
async fn replay_decision(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<ReplayRequest>, JsonRejection>,
) -> Result<Json<ReplayResult>, AppError> {
    let req = extract_json(body)?;
    state
        .auth
        .require_permission(caller.0.token_id, "replay", "run", None)?;

    // Cross-tenant probing gets the same answer as a missing decision.
    match state.replay.decisions().get(req.decision_id) {
        Some(decision) if decision.enterprise_id == caller.0.enterprise_id => {}
        Some(_) if caller.0.role.is_superuser() => {}
        _ => return Err(AppError::NotFound(format!("decision {}", req.decision_id))),
    }

    let result = state.replay.replay(req.decision_id, req.target())?;
    Ok(Json(result))
}

/// POST /v1/replay/bulk — bulk policy impact analysis.
#[utoipa::path(
    post,
    path = "/v1/replay/bulk",
    request_body = BulkReplayRequest,
    responses(
        (status = 200, description = "Bulk replay report"),
        (status = 403, description = "Enterprise outside the caller's scope"),
        (status = 404, description = "Target policy version unknown"),
    ),
    security(("bearer_token" = []))
)]
async fn bulk_replay(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<BulkReplayRequest>, JsonRejection>,
) -> Result<Json<BulkReplayReport>, AppError> {
    let req = extract_validated_json(body)?;
    state
        .auth
        .require_permission(caller.0.token_id, "replay", "run", None)?;

    if req.enterprise_id != caller.0.enterprise_id && !caller.0.role.is_superuser() {
        return Err(AppError::Forbidden);
    }

    let report = state
        .orchestrator
        .bulk_replay(
            req.enterprise_id,
            &req.from_policy_version,
            &req.to_policy_version,
            req.options.unwrap_or_default(),
        )
        .await?;
    Ok(Json(report))
}
