//! # aigov-api — Axum API Services for the AI Governance Core
//!
//! The HTTP boundary the excluded UI/CRUD layer talks to. Every governed
//! route sits behind the bearer-token middleware; permission gating happens
//! per handler through `AuthService::require_permission`.
//!
//! ## API Surface
//!
//! | Prefix                  | Module                  | Domain                     |
//! |-------------------------|-------------------------|----------------------------|
//! | `/v1/auth/*`            | [`routes::sessions`]    | Login, switch, logout      |
//! | `/v1/enterprises/*`     | [`routes::enterprises`] | Enterprise & seat creation |
//! | `/v1/policies/*`        | [`routes::policies`]    | Snapshot management        |
//! | `/v1/policy/evaluate`   | [`routes::governance`]  | Ad-hoc rule evaluation     |
//! | `/v1/governance/decide` | [`routes::governance`]  | Gated decision recording   |
//! | `/v1/replay/*`          | [`routes::replay`]      | Single & bulk replay       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! Health probes (`/health/*`) and `POST /v1/auth/login` are mounted
//! outside the auth middleware.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    // Governed routes behind the bearer-token middleware.
    let protected = Router::new()
        .merge(routes::sessions::router())
        .merge(routes::enterprises::router())
        .merge(routes::policies::router())
        .merge(routes::governance::router())
        .merge(routes::replay::router())
        .merge(openapi::router())
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    // Login and health probes stay reachable without credentials.
    let public = Router::new()
        .merge(routes::sessions::public_router())
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
