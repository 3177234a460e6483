//! Session Authentication
//!
//! Email/password authentication issuing stateless session tokens:
//! - Argon2id password hashing
//! - HS256 JWT session tokens bound to the user id
//! - Bearer-token middleware for protected routes
//! - Pluggable user storage (in-memory or PostgreSQL)
//!
//! # Configuration
//!
//! [`AuthConfig::from_env`] reads:
//! - `APP_SECRET` - Secret key for signing tokens (required)
//! - `JWT_ISSUER` - JWT issuer claim (default: "session-auth")
//! - `TOKEN_EXPIRATION` - Token lifetime in seconds (default: tokens never expire)
//! - `ARGON2_MEMORY_COST`, `ARGON2_TIME_COST`, `ARGON2_PARALLELISM` - Hashing cost
//!
//! # Usage
//!
//! ```rust,ignore
//! use session_auth::{build_app, AuthConfig, Credentials, InMemoryUserStore};
//! use std::sync::Arc;
//!
//! let config = AuthConfig::from_env()?;
//! let (auth, router) = build_app(Arc::new(InMemoryUserStore::new()), &config)?;
//! let session = auth.authenticate(Credentials::new("a@b.com", "123123")).await?;
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::{AuthenticatedIdentity, ClientInfo};
pub use handlers::{create_routes, AuthState};
pub use models::*;
pub use password::PasswordHasher;
pub use service::AuthService;
pub use store::{InMemoryUserStore, PgUserStore, UserStore};
pub use token::TokenIssuer;

use axum::Router;
use std::sync::Arc;

/// Build the authentication service and its router
///
/// Fails with [`AuthError::Config`] when the configuration is invalid, so a
/// missing secret stops the process at startup instead of failing requests.
pub fn build_app(
    store: Arc<dyn UserStore>,
    config: &AuthConfig,
) -> Result<(AuthState, Router), AuthError> {
    let auth_service = Arc::new(AuthService::from_config(store, config)?);
    let router = create_routes(auth_service.clone());

    Ok((auth_service, router))
}
