//! # Session Routes
//!
//! The authorization boundary exposed to the UI layer: login, context
//! switching, logout, and context listing. `POST /v1/auth/login` is the
//! only route mounted outside the auth middleware besides health probes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use aigov_auth::{AuthSession, UserContext};
use aigov_core::ContextId;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login identifier (email).
    pub identifier: String,
    /// Login secret.
    pub secret: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if self.identifier.trim().is_empty() {
            return Err("identifier must not be empty".to_string());
        }
        if self.secret.is_empty() {
            return Err("secret must not be empty".to_string());
        }
        Ok(())
    }
}

/// Context switch request.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchContextRequest {
    /// The owned, active context to rebind to.
    #[schema(value_type = String)]
    pub context_id: ContextId,
}

/// An authenticated session on the wire.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// User id.
    pub user_id: String,
    /// User display name.
    pub user_name: String,
    /// The bound context.
    #[schema(value_type = Object)]
    pub context: UserContext,
    /// The bearer credential for subsequent requests.
    pub token: String,
    /// Token expiry (RFC 3339).
    pub expires_at: String,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user_id: session.user.id.to_string(),
            user_name: session.user.name,
            context: session.context,
            token: session.token.token_id.to_string(),
            expires_at: session.token.expires_at.to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Routers
// ---------------------------------------------------------------------------

/// Routes mounted outside the auth middleware.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/v1/auth/login", post(login))
}

/// Routes mounted behind the auth middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/switch-context", post(switch_context))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/contexts", get(list_contexts))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/auth/login — authenticate and bind the default context.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let session = state.auth.authenticate(&req.identifier, &req.secret)?;
    Ok(Json(session.into()))
}

/// POST /v1/auth/switch-context — rebind the session to another owned context.
#[utoipa::path(
    post,
    path = "/v1/auth/switch-context",
    request_body = SwitchContextRequest,
    responses(
        (status = 200, description = "Session rebound", body = SessionResponse),
        (status = 403, description = "Context not owned by caller"),
        (status = 404, description = "Context unknown or inactive"),
    ),
    security(("bearer_token" = []))
)]
async fn switch_context(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<SwitchContextRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let req = crate::extractors::extract_json(body)?;
    let session = state.auth.switch_context(caller.0.user_id, req.context_id)?;
    Ok(Json(session.into()))
}

/// POST /v1/auth/logout — close the session.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses((status = 204, description = "Session closed")),
    security(("bearer_token" = []))
)]
async fn logout(State(state): State<AppState>, caller: Caller) -> StatusCode {
    state.auth.logout(caller.0.token_id);
    StatusCode::NO_CONTENT
}

/// GET /v1/auth/contexts — the caller's active contexts, default first.
#[utoipa::path(
    get,
    path = "/v1/auth/contexts",
    responses((status = 200, description = "Contexts, default first")),
    security(("bearer_token" = []))
)]
async fn list_contexts(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<UserContext>>, AppError> {
    let contexts = state.auth.contexts_for_token(caller.0.token_id)?;
    Ok(Json(contexts))
}
