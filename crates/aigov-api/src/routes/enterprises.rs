//! # Enterprise & Agency Seat Routes
//!
//! Multi-step transactional writes: entity row, creator's owning context,
//! and audit entry commit together or not at all (see
//! `aigov_auth::DirectoryStore`).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use aigov_auth::{NewEnterprise, NewSeat, UserContext};
use aigov_core::EnterpriseId;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to create an enterprise.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEnterpriseRequest {
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique across the platform.
    pub slug: String,
    /// Enterprise category (`pharma`, `agency_network`, …).
    pub kind: String,
}

impl Validate for CreateEnterpriseRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.slug.trim().is_empty() {
            return Err("slug must not be empty".to_string());
        }
        if self.slug.len() > 64 {
            return Err("slug must not exceed 64 characters".to_string());
        }
        Ok(())
    }
}

/// Request to create an agency seat.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSeatRequest {
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique within the enterprise.
    pub slug: String,
}

impl Validate for CreateSeatRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.slug.trim().is_empty() {
            return Err("slug must not be empty".to_string());
        }
        Ok(())
    }
}

/// Response for enterprise creation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnterpriseResponse {
    /// The new enterprise id.
    pub enterprise_id: String,
    /// The enterprise slug.
    pub slug: String,
    /// The creator's owning context.
    #[schema(value_type = Object)]
    pub owner_context: UserContext,
}

/// Response for seat creation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeatResponse {
    /// The new seat id.
    pub seat_id: String,
    /// The owning enterprise id.
    pub enterprise_id: String,
    /// The creator's seat-admin context.
    #[schema(value_type = Object)]
    pub admin_context: UserContext,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the enterprise router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/enterprises", post(create_enterprise))
        .route("/v1/enterprises/:id/seats", post(create_seat))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/enterprises — create an enterprise owned by the caller.
#[utoipa::path(
    post,
    path = "/v1/enterprises",
    request_body = CreateEnterpriseRequest,
    responses(
        (status = 201, description = "Enterprise created", body = CreateEnterpriseResponse),
        (status = 409, description = "Slug taken or transaction aborted"),
    ),
    security(("bearer_token" = []))
)]
async fn create_enterprise(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateEnterpriseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateEnterpriseResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let (enterprise, owner_context) = state.auth.create_enterprise(
        NewEnterprise {
            name: req.name,
            slug: req.slug,
            kind: req.kind,
        },
        caller.0.user_id,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(CreateEnterpriseResponse {
            enterprise_id: enterprise.id.to_string(),
            slug: enterprise.slug,
            owner_context,
        }),
    ))
}

/// POST /v1/enterprises/:id/seats — create an agency seat.
#[utoipa::path(
    post,
    path = "/v1/enterprises/{id}/seats",
    request_body = CreateSeatRequest,
    params(("id" = String, Path, description = "Enterprise id")),
    responses(
        (status = 201, description = "Seat created", body = CreateSeatResponse),
        (status = 403, description = "Caller may not create seats here"),
        (status = 409, description = "Slug taken or transaction aborted"),
    ),
    security(("bearer_token" = []))
)]
async fn create_seat(
    State(state): State<AppState>,
    caller: Caller,
    Path(enterprise_id): Path<EnterpriseId>,
    body: Result<Json<CreateSeatRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSeatResponse>), AppError> {
    let req = extract_validated_json(body)?;
    state.auth.require_permission(
        caller.0.token_id,
        "agency_seats",
        "create",
        Some(&enterprise_id.to_string()),
    )?;
    let (seat, admin_context) = state.auth.create_agency_seat(
        enterprise_id,
        NewSeat {
            name: req.name,
            slug: req.slug,
        },
        caller.0.user_id,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSeatResponse {
            seat_id: seat.id.to_string(),
            enterprise_id: enterprise_id.to_string(),
            admin_context,
        }),
    ))
}
