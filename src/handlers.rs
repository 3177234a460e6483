//! Authentication HTTP Handlers
//!
//! REST endpoints for session creation and the protected dashboard.

use crate::error::AuthError;
use crate::extractors::{AuthenticatedIdentity, ClientInfo};
use crate::middleware;
use crate::models::*;
use crate::service::AuthService;

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
pub fn create_routes(auth_service: AuthState) -> Router {
    let public = Router::new().route("/sessions", post(create_session));

    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .layer(axum_middleware::from_fn_with_state(
            auth_service.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(auth_service)
}

// ============================================
// Sessions
// ============================================

/// POST /sessions
///
/// Authenticate with email and password and return a session token
pub async fn create_session(
    State(auth): State<AuthState>,
    ClientInfo { ip, user_agent }: ClientInfo,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    // Answer unreadable bodies with the same `{error}` shape as every other failure.
    let Json(credentials) = body.map_err(|rejection| AuthError::Validation(rejection.body_text()))?;

    let session = auth.authenticate(credentials).await.map_err(|e| {
        if e.is_unauthorized() {
            tracing::info!(
                ip = ip.as_deref().unwrap_or("-"),
                user_agent = user_agent.as_deref().unwrap_or("-"),
                reason = %e,
                "Login rejected"
            );
        }
        e
    })?;

    Ok(Json(session))
}

// ============================================
// Protected
// ============================================

/// GET /dashboard
///
/// Reachable only with a valid bearer token
pub async fn dashboard(AuthenticatedIdentity(identity): AuthenticatedIdentity) -> impl IntoResponse {
    Json(serde_json::json!({ "identity": identity }))
}
