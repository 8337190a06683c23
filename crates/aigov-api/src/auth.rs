//! # Authentication Middleware & Caller Extractor
//!
//! Bearer-token middleware over the session store. The bearer credential is
//! the opaque token id issued at login or context switch; the middleware
//! validates it and injects the full [`ContextToken`] into request
//! extensions, where handlers pick it up via the [`Caller`] extractor.
//!
//! Failure responses are uniform — they never reveal whether the token was
//! absent, malformed, unknown, or expired.

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use aigov_auth::ContextToken;
use aigov_core::TokenId;

use crate::error::{AppError, ErrorBody, ErrorDetail};
use crate::state::AppState;

/// The authenticated caller, extracted from request extensions.
#[derive(Debug, Clone)]
pub struct Caller(pub ContextToken);

impl Caller {
    /// The caller's enterprise scope as a wire string.
    pub fn enterprise_str(&self) -> String {
        self.0.enterprise_id.to_string()
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ContextToken>()
            .cloned()
            .map(Caller)
            .ok_or(AppError::Unauthorized)
    }
}

/// Validate the bearer token and inject the caller's [`ContextToken`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(bearer) = bearer else {
        tracing::warn!("authentication failed: missing or non-Bearer authorization header");
        return unauthorized_response();
    };

    let Ok(token_id) = bearer.parse::<TokenId>() else {
        tracing::warn!("authentication failed: malformed bearer token");
        return unauthorized_response();
    };

    match state.auth.validate_token(token_id) {
        Ok(token) => {
            request.extensions_mut().insert(token);
            next.run(request).await
        }
        Err(_) => {
            tracing::warn!("authentication failed: unknown or expired token");
            unauthorized_response()
        }
    }
}

fn unauthorized_response() -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: "invalid credentials".to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppConfig, AppState};
    use aigov_auth::NewEnterprise;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app_with_state(state: AppState) -> Router {
        Router::new()
            .route("/probe", get(|| async { "ok" }))
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn seeded_state() -> (AppState, String) {
        let state = AppState::in_memory(AppConfig::default());
        let owner = state
            .auth
            .directory()
            .provision_user("owner@acme.example", "hunter2", "Owner")
            .unwrap();
        state
            .auth
            .create_enterprise(
                NewEnterprise {
                    name: "Acme".into(),
                    slug: "acme".into(),
                    kind: "pharma".into(),
                },
                owner.id,
            )
            .unwrap();
        let session = state.auth.authenticate("owner@acme.example", "hunter2").unwrap();
        (state, session.token.token_id.to_string())
    }

    #[tokio::test]
    async fn valid_token_passes() {
        let (state, token) = seeded_state();
        let app = app_with_state(state);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/probe")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_header_is_401() {
        let (state, _) = seeded_state();
        let app = app_with_state(state);
        let response = app
            .oneshot(HttpRequest::builder().uri("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_and_unknown_tokens_fail_identically() {
        let (state, _) = seeded_state();

        let mut bodies = Vec::new();
        for bearer in ["not-a-uuid", &TokenId::new().to_string()] {
            let app = app_with_state(state.clone());
            let response = app
                .oneshot(
                    HttpRequest::builder()
                        .uri("/probe")
                        .header("Authorization", format!("Bearer {bearer}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            bodies.push(String::from_utf8(bytes.to_vec()).unwrap());
        }
        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn basic_scheme_is_rejected() {
        let (state, _) = seeded_state();
        let app = app_with_state(state);
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/probe")
                    .header("Authorization", "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
