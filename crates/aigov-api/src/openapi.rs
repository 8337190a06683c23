//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Registers the bearer-token security scheme used by all gated routes.
struct BearerToken;

impl Modify for BearerToken {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Context-bound session token from /v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the governance API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AI Governance Core API",
        version = "0.3.2",
        description = "Policy evaluation, decision replay, and the hierarchical authorization boundary for AI tool governance.",
        license(name = "BUSL-1.1")
    ),
    paths(
        // Sessions
        crate::routes::sessions::login,
        crate::routes::sessions::switch_context,
        crate::routes::sessions::logout,
        crate::routes::sessions::list_contexts,
        // Enterprises & seats
        crate::routes::enterprises::create_enterprise,
        crate::routes::enterprises::create_seat,
        // Policy snapshots
        crate::routes::policies::submit_policy,
        crate::routes::policies::activate_policy,
        crate::routes::policies::get_active_policy,
        crate::routes::policies::get_policy_by_version,
        crate::routes::policies::list_versions,
        // Governance
        crate::routes::governance::evaluate_rules,
        crate::routes::governance::decide,
        // Replay
        crate::routes::replay::replay_decision,
        crate::routes::replay::bulk_replay,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::sessions::LoginRequest,
        crate::routes::sessions::SwitchContextRequest,
        crate::routes::sessions::SessionResponse,
        crate::routes::enterprises::CreateEnterpriseRequest,
        crate::routes::enterprises::CreateSeatRequest,
        crate::routes::enterprises::CreateEnterpriseResponse,
        crate::routes::enterprises::CreateSeatResponse,
        crate::routes::policies::SubmitPolicyRequest,
        crate::routes::policies::SubmitPolicyResponse,
        crate::routes::governance::EvaluateRequest,
        crate::routes::governance::DecideRequest,
        crate::routes::governance::DecideResponse,
        crate::routes::replay::ReplayRequest,
        crate::routes::replay::BulkReplayRequest,
    )),
    modifiers(&BearerToken)
)]
pub struct ApiDoc;

/// Serve the assembled spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_assembles_and_serializes() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_value(&spec).unwrap();
        assert!(json["paths"].get("/v1/auth/login").is_some());
        assert!(json["paths"].get("/v1/replay/bulk").is_some());
        assert!(json["components"]["securitySchemes"]
            .get("bearer_token")
            .is_some());
    }
}
