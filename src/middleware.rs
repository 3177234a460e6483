//! Authentication Middleware
//!
//! Bearer-token access control for protected routes. A request either leaves
//! here with an [`Identity`] in its extensions, or is answered with 401 and
//! never reaches the handler.

use crate::error::AuthError;
use crate::handlers::AuthState;
use crate::models::Identity;
use crate::token::TokenIssuer;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Extract the bearer token from the Authorization header
///
/// A missing header, a scheme other than `Bearer`, or an empty token all
/// count as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = header.trim().split_once(' ').ok_or(AuthError::MissingToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Extract and verify the bearer token of a request
pub fn authenticate_request(tokens: &TokenIssuer, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let token = bearer_token(headers)?;
    tokens.verify(token)
}

/// Require authenticated user
///
/// Validates the token from the Authorization header and stores the identity
/// in request extensions for use by extractors.
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticate_request(auth.tokens(), req.headers()).map_err(|e| {
        tracing::debug!(path = %req.uri().path(), reason = %e, "Rejected unauthenticated request");
        e
    })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
