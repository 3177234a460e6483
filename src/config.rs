//! Authentication Configuration
//!
//! Values are loaded from environment variables by [`AuthConfig::from_env`] or
//! supplied explicitly with [`AuthConfig::new`]. Nothing else in the crate reads
//! the environment.

use crate::error::AuthError;
use std::env;

/// Secrets shorter than this are accepted but logged as weak.
const RECOMMENDED_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime: 100 years, in seconds.
pub const MAX_TOKEN_EXPIRATION: i64 = 100 * 365 * 24 * 60 * 60;

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for signing and verifying tokens (from APP_SECRET env var)
    pub app_secret: String,

    /// JWT issuer (from JWT_ISSUER env var)
    pub jwt_issuer: String,

    /// Token lifetime in seconds (from TOKEN_EXPIRATION env var).
    /// `None` issues non-expiring tokens.
    pub token_expiration: Option<i64>,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,
}

impl AuthConfig {
    /// Build a configuration around an explicit secret, with default settings
    pub fn new(app_secret: impl Into<String>) -> Self {
        Self {
            app_secret: app_secret.into(),
            jwt_issuer: "session-auth".to_string(),
            token_expiration: None,
            argon2_memory_cost: 65536, // 64 MiB
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Fails with [`AuthError::Config`] when `APP_SECRET` is missing.
    pub fn from_env() -> Result<Self, AuthError> {
        let app_secret = env::var("APP_SECRET")
            .map_err(|_| AuthError::Config("APP_SECRET environment variable must be set".into()))?;

        let defaults = Self::new(app_secret);

        Ok(Self {
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer.clone()),

            token_expiration: match env::var("TOKEN_EXPIRATION") {
                Ok(v) => Some(v.trim().parse().map_err(|_| {
                    AuthError::Config(format!("TOKEN_EXPIRATION must be a number of seconds, got {v:?}"))
                })?),
                Err(_) => None,
            },

            argon2_memory_cost: env::var("ARGON2_MEMORY_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.argon2_memory_cost),

            argon2_time_cost: env::var("ARGON2_TIME_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.argon2_time_cost),

            argon2_parallelism: env::var("ARGON2_PARALLELISM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.argon2_parallelism),

            ..defaults
        })
    }

    /// Set a token lifetime in seconds
    pub fn with_token_expiration(mut self, seconds: i64) -> Self {
        self.token_expiration = Some(seconds);
        self
    }

    /// Override the Argon2 cost parameters
    pub fn with_argon2_params(mut self, memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        self.argon2_memory_cost = memory_cost;
        self.argon2_time_cost = time_cost;
        self.argon2_parallelism = parallelism;
        self
    }

    /// Build the Argon2 parameter set described by this configuration
    pub fn argon2_params(&self) -> Result<argon2::Params, AuthError> {
        argon2::Params::new(
            self.argon2_memory_cost,
            self.argon2_time_cost,
            self.argon2_parallelism,
            None,
        )
        .map_err(|e| AuthError::Config(format!("invalid Argon2 parameters: {e}")))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.app_secret.trim().is_empty() {
            return Err(AuthError::Config("APP_SECRET must not be empty".to_string()));
        }

        if self.app_secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                length = self.app_secret.len(),
                "APP_SECRET is shorter than {} bytes",
                RECOMMENDED_SECRET_LEN
            );
        }

        if matches!(self.token_expiration, Some(ttl) if ttl <= 0 || ttl > MAX_TOKEN_EXPIRATION) {
            return Err(AuthError::Config(format!(
                "TOKEN_EXPIRATION must be between 1 and {MAX_TOKEN_EXPIRATION} seconds"
            )));
        }

        self.argon2_params()?;

        Ok(())
    }
}
