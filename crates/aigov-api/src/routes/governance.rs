//! # Governance Decision Routes
//!
//! The evaluation surface:
//!
//! - `POST /v1/policy/evaluate` — ad-hoc: event + rule list in, verdict
//!   out. Pure; nothing is persisted.
//! - `POST /v1/governance/decide` — the governed path: evaluates the event
//!   against the caller enterprise's *active* snapshot, persists a
//!   [`GovernanceAction`] whose context snapshot makes the decision
//!   replayable, and returns the verdict with the decision id.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use aigov_core::{AuditEntry, AuditEntryKind, AuditSink, DecisionId, ThreadId};
use aigov_policy::{evaluate, PolicyRule, ToolUsageEvent, Verdict, VerdictStatus};
use aigov_replay::{
    ActionType, ContextSnapshot, DecisionStore, ExternalContext, GovernanceAction, PolicyState,
    FALLBACK_CONFIDENCE, RULE_MATCH_CONFIDENCE,
};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Ad-hoc evaluation request: an event plus the rule list to judge it by.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EvaluateRequest {
    /// The tool-usage event.
    #[schema(value_type = Object)]
    pub event: ToolUsageEvent,
    /// The rules to evaluate against.
    #[schema(value_type = Vec<Object>)]
    pub rules: Vec<PolicyRule>,
}

impl Validate for EvaluateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.event.tool.name.trim().is_empty() {
            return Err("event.tool.name must not be empty".to_string());
        }
        if self.event.context.tenant_id.trim().is_empty() {
            return Err("event.context.tenantId must not be empty".to_string());
        }
        Ok(())
    }
}

/// Governed decision request: the event only; the policy comes from the
/// caller enterprise's active snapshot.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideRequest {
    /// The tool-usage event.
    #[schema(value_type = Object)]
    pub event: ToolUsageEvent,
}

impl Validate for DecideRequest {
    fn validate(&self) -> Result<(), String> {
        if self.event.tool.name.trim().is_empty() {
            return Err("event.tool.name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Governed decision response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    /// The verdict rendered on the event.
    #[schema(value_type = Object)]
    pub verdict: Verdict,
    /// The persisted decision record's id.
    pub decision_id: String,
    /// The thread the decision was filed under.
    pub thread_id: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the governance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/policy/evaluate", post(evaluate_rules))
        .route("/v1/governance/decide", post(decide))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/policy/evaluate — pure evaluation of an event against a rule
/// list supplied in the request. Nothing is persisted.
#[utoipa::path(
    post,
    path = "/v1/policy/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Verdict"),
        (status = 422, description = "Malformed event or rules"),
    ),
    security(("bearer_token" = []))
)]
async fn evaluate_rules(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<Verdict>, AppError> {
    let req = extract_validated_json(body)?;
    state
        .auth
        .require_permission(caller.0.token_id, "policies", "read", None)?;
    Ok(Json(evaluate(&req.event, &req.rules)))
}

/// POST /v1/governance/decide — evaluate against the active snapshot and
/// persist a replayable decision record.
///
/// The event's tenant must be the caller's enterprise — a session cannot
/// file decisions into a scope it is not bound to.
#[utoipa::path(
    post,
    path = "/v1/governance/decide",
    request_body = DecideRequest,
    responses(
        (status = 201, description = "Decision recorded", body = DecideResponse),
        (status = 403, description = "Event tenant outside the caller's scope"),
        (status = 404, description = "No active policy snapshot"),
    ),
    security(("bearer_token" = []))
)]
async fn decide(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<DecideRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DecideResponse>), AppError> {
    let req = extract_validated_json(body)?;
    state
        .auth
        .require_permission(caller.0.token_id, "decisions", "write", None)?;

    if req.event.context.tenant_id != caller.enterprise_str() {
        return Err(AppError::Forbidden);
    }

    let snapshot = state.snapshots.active(caller.0.enterprise_id)?;

    // Pin the event to the snapshot actually used, then evaluate.
    let mut event = req.event;
    event.context.policy_snapshot_id = snapshot.id.to_string();
    let mut verdict = evaluate(&event, &snapshot.rules);
    verdict.policy_snapshot_id = Some(snapshot.id.to_string());

    let confidence = if verdict.rule_id.is_some() {
        RULE_MATCH_CONFIDENCE
    } else {
        FALLBACK_CONFIDENCE
    };

    let action = GovernanceAction {
        id: DecisionId::new(),
        thread_id: ThreadId::new(),
        enterprise_id: caller.0.enterprise_id,
        action_type: action_type_for(verdict.status),
        rationale: Some(verdict.reason.clone()),
        context_snapshot: Some(ContextSnapshot {
            event,
            policy_state: PolicyState {
                snapshot_id: Some(snapshot.id),
                version: snapshot.version.clone(),
                rules: snapshot.rules.clone(),
            },
            external: Some(ExternalContext {
                confidence: Some(confidence),
            }),
        }),
        created_at: Utc::now(),
    };

    state.decisions.append(action.clone());
    state.audit.append(AuditEntry::new(
        AuditEntryKind::DecisionRecorded,
        Some(action.id.to_string()),
        Some(serde_json::json!({
            "status": verdict.status.as_str(),
            "rule_id": verdict.rule_id.clone(),
            "policy_version": snapshot.version.clone(),
        })),
    ));

    // Write-through to the durable external log when configured. Failure is
    // logged, not surfaced — the in-process record is authoritative here.
    if let Some(pool) = &state.pool {
        if let Err(e) = crate::db::decisions::append(pool, &action).await {
            tracing::error!(decision_id = %action.id, error = %e, "durable decision log write failed");
        }
        let audit_event = crate::db::audit::AuditEvent {
            kind: AuditEntryKind::DecisionRecorded.as_str().to_string(),
            subject: Some(action.id.to_string()),
            metadata: serde_json::json!({
                "status": verdict.status.as_str(),
                "policy_version": snapshot.version.clone(),
            }),
        };
        if let Err(e) = crate::db::audit::append(pool, audit_event).await {
            tracing::error!(decision_id = %action.id, error = %e, "durable audit log write failed");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(DecideResponse {
            verdict,
            decision_id: action.id.to_string(),
            thread_id: action.thread_id.to_string(),
        }),
    ))
}

/// The action-type literal recorded for an engine-rendered verdict.
fn action_type_for(status: VerdictStatus) -> ActionType {
    match status {
        VerdictStatus::Approved => ActionType::AgentAutoApprove,
        VerdictStatus::Prohibited => ActionType::AgentAutoBlock,
        VerdictStatus::RequiresReview => ActionType::Escalate,
    }
}
