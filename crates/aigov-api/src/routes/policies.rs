//! # Policy Snapshot Routes
//!
//! Draft submission, activation, and lookup for versioned rule sets. All
//! routes act within the caller's enterprise scope and are gated on
//! `policies:*` permissions. Activation goes through the store's atomic
//! transition — the single-active-snapshot invariant is enforced there,
//! not here.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use aigov_core::{AuditEntry, AuditEntryKind, AuditSink, SnapshotId};
use aigov_policy::{PolicyRule, PolicySnapshot};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to submit a draft snapshot.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitPolicyRequest {
    /// Version label, unique per enterprise.
    pub version: String,
    /// The rules to freeze into the snapshot.
    #[schema(value_type = Vec<Object>)]
    pub rules: Vec<PolicyRule>,
}

impl Validate for SubmitPolicyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.version.trim().is_empty() {
            return Err("version must not be empty".to_string());
        }
        if self.version.len() > 64 {
            return Err("version must not exceed 64 characters".to_string());
        }
        Ok(())
    }
}

/// Response for snapshot submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPolicyResponse {
    /// The new snapshot's id.
    pub snapshot_id: String,
    /// The submitted version label.
    pub version: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the policy snapshot router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/policies", post(submit_policy))
        .route("/v1/policies/active", get(get_active_policy))
        .route("/v1/policies/versions", get(list_versions))
        .route("/v1/policies/version/:version", get(get_policy_by_version))
        .route("/v1/policies/:id/activate", post(activate_policy))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/policies — submit a draft snapshot for the caller's enterprise.
///
/// The rule set is validated at this boundary: duplicate priorities within
/// one scope and empty rule ids are rejected before the snapshot exists.
#[utoipa::path(
    post,
    path = "/v1/policies",
    request_body = SubmitPolicyRequest,
    responses(
        (status = 201, description = "Draft submitted", body = SubmitPolicyResponse),
        (status = 409, description = "Version already exists"),
        (status = 422, description = "Rule set failed validation"),
    ),
    security(("bearer_token" = []))
)]
async fn submit_policy(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<SubmitPolicyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitPolicyResponse>), AppError> {
    let req = extract_validated_json(body)?;
    state
        .auth
        .require_permission(caller.0.token_id, "policies", "write", None)?;
    let snapshot_id =
        state
            .snapshots
            .submit_draft(caller.0.enterprise_id, req.version.clone(), req.rules)?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitPolicyResponse {
            snapshot_id: snapshot_id.to_string(),
            version: req.version,
        }),
    ))
}

/// POST /v1/policies/:id/activate — activate a snapshot, retiring the
/// previous active one atomically.
#[utoipa::path(
    post,
    path = "/v1/policies/{id}/activate",
    params(("id" = String, Path, description = "Snapshot id")),
    responses(
        (status = 200, description = "Snapshot activated"),
        (status = 404, description = "Snapshot unknown"),
    ),
    security(("bearer_token" = []))
)]
async fn activate_policy(
    State(state): State<AppState>,
    caller: Caller,
    Path(snapshot_id): Path<SnapshotId>,
) -> Result<Json<PolicySnapshot>, AppError> {
    state
        .auth
        .require_permission(caller.0.token_id, "policies", "activate", None)?;
    let snapshot = state.snapshots.activate(caller.0.enterprise_id, snapshot_id)?;
    state.audit.append(AuditEntry::new(
        AuditEntryKind::PolicyActivated,
        Some(snapshot.id.to_string()),
        Some(serde_json::json!({
            "enterprise_id": caller.0.enterprise_id.to_string(),
            "version": snapshot.version.clone(),
        })),
    ));
    Ok(Json(snapshot))
}

/// GET /v1/policies/active — the caller enterprise's active snapshot.
#[utoipa::path(
    get,
    path = "/v1/policies/active",
    responses(
        (status = 200, description = "Active snapshot"),
        (status = 404, description = "No active snapshot"),
    ),
    security(("bearer_token" = []))
)]
async fn get_active_policy(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<PolicySnapshot>, AppError> {
    state
        .auth
        .require_permission(caller.0.token_id, "policies", "read", None)?;
    let snapshot = state.snapshots.active(caller.0.enterprise_id)?;
    Ok(Json(snapshot))
}

/// GET /v1/policies/version/:version — explicit version lookup.
///
/// Bypasses the active pointer: retired snapshots stay reachable, which is
/// what makes replay possible.
#[utoipa::path(
    get,
    path = "/v1/policies/version/{version}",
    params(("version" = String, Path, description = "Version label")),
    responses(
        (status = 200, description = "Snapshot"),
        (status = 404, description = "Version unknown"),
    ),
    security(("bearer_token" = []))
)]
async fn get_policy_by_version(
    State(state): State<AppState>,
    caller: Caller,
    Path(version): Path<String>,
) -> Result<Json<PolicySnapshot>, AppError> {
    state
        .auth
        .require_permission(caller.0.token_id, "policies", "read", None)?;
    let snapshot = state.snapshots.by_version(caller.0.enterprise_id, &version)?;
    Ok(Json(snapshot))
}

/// GET /v1/policies/versions — all version labels for the caller's enterprise.
#[utoipa::path(
    get,
    path = "/v1/policies/versions",
    responses((status = 200, description = "Version labels, in submission order")),
    security(("bearer_token" = []))
)]
async fn list_versions(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<String>>, AppError> {
    state
        .auth
        .require_permission(caller.0.token_id, "policies", "read", None)?;
    Ok(Json(state.snapshots.list_versions(caller.0.enterprise_id)))
}
