//! Authentication Service
//!
//! Core authentication logic: credential checks against the user store,
//! password changes, and token issuance.

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::*;
use crate::password::PasswordHasher;
use crate::store::UserStore;
use crate::token::TokenIssuer;

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Verified against when the email is unknown, so both failure paths cost one hash.
const DUMMY_PASSWORD: &str = "session-auth-dummy-password";

/// Authentication service
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    dummy_hash: String,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            store,
            hasher,
            tokens,
            dummy_hash,
        })
    }

    /// Create a service from configuration
    pub fn from_config(store: Arc<dyn UserStore>, config: &AuthConfig) -> Result<Self, AuthError> {
        config.validate()?;

        Self::new(
            store,
            PasswordHasher::from_config(config)?,
            TokenIssuer::from_config(config)?,
        )
    }

    /// Get reference to the user store
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Get reference to the token issuer
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    // ============================================
    // Password Hashing
    // ============================================

    /// Hash a password on the blocking pool
    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!("Password hashing task failed: {:?}", e);
                AuthError::Internal
            })?
    }

    /// Verify a password on the blocking pool
    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| {
                tracing::error!("Password verification task failed: {:?}", e);
                AuthError::Internal
            })?
    }

    // ============================================
    // Authentication
    // ============================================

    /// Check credentials and issue a session token
    ///
    /// Unknown email and wrong password are distinct errors here; the HTTP layer
    /// answers both with 401.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let Credentials { email, password } = credentials;

        let user = match self.store.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.verify_password(password, self.dummy_hash.clone()).await?;
                tracing::warn!(email = %normalize_email(&email), "Authentication failed: user not found");
                return Err(AuthError::UserNotFound);
            }
        };

        if !self
            .verify_password(password, user.password_hash.clone())
            .await?
        {
            tracing::warn!(user_id = %user.id, "Authentication failed: invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = user.identity();
        let token = self.tokens.issue(&identity)?;

        tracing::info!(user_id = %user.id, "User authenticated");

        Ok(Session {
            identity,
            user: UserResponse::from(user),
            token,
        })
    }

    /// Verify a session token
    pub fn identify(&self, token: &str) -> Result<Identity, AuthError> {
        self.tokens.verify(token)
    }

    // ============================================
    // Account Management
    // ============================================

    /// Create a user account
    pub async fn register(&self, req: NewUser) -> Result<UserRecord, AuthError> {
        req.validate()?;

        let password_hash = self.hash_password(req.password).await?;
        let user = self.store.insert(&req.name, &req.email, password_hash).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Set a new password for a user
    ///
    /// This is the only path that recomputes a stored password hash.
    pub async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), AuthError> {
        if self.store.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let password_hash = self.hash_password(password.to_string()).await?;
        self.store.set_password_hash(user_id, password_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        self.store.find_by_id(user_id).await
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;

    fn service() -> AuthService {
        let config = AuthConfig::new("test-secret").with_argon2_params(1024, 1, 1);
        AuthService::from_config(Arc::new(InMemoryUserStore::new()), &config).unwrap()
    }

    async fn register(auth: &AuthService, email: &str, password: &str) -> UserRecord {
        auth.register(NewUser {
            name: "Test User".into(),
            email: email.into(),
            password: password.into(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_valid_credentials() {
        let auth = service();
        let user = register(&auth, "a@b.com", "123123").await;

        let session = auth
            .authenticate(Credentials::new("a@b.com", "123123"))
            .await
            .unwrap();

        assert_eq!(session.identity.id, user.id);
        assert_eq!(session.user.email, "a@b.com");
        assert_eq!(auth.identify(&session.token).unwrap(), user.identity());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let auth = service();
        register(&auth, "a@b.com", "123123").await;

        let result = auth.authenticate(Credentials::new("a@b.com", "123456")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let auth = service();
        register(&auth, "a@b.com", "123123").await;

        let result = auth.authenticate(Credentials::new("x@y.com", "123123")).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_authenticate_email_case_insensitive() {
        let auth = service();
        let user = register(&auth, "a@b.com", "123123").await;

        let session = auth
            .authenticate(Credentials::new("A@B.COM", "123123"))
            .await
            .unwrap();
        assert_eq!(session.identity.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_empty_password() {
        let auth = service();
        register(&auth, "a@b.com", "123123").await;

        let result = auth.authenticate(Credentials::new("a@b.com", "")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_malformed_email() {
        let auth = service();
        register(&auth, "a@b.com", "123123").await;

        let result = auth.authenticate(Credentials::new("nobody", "123123")).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_repeated_authentication_tokens_all_verify() {
        let auth = service();
        let user = register(&auth, "a@b.com", "123123").await;

        for _ in 0..3 {
            let session = auth
                .authenticate(Credentials::new("a@b.com", "123123"))
                .await
                .unwrap();
            assert_eq!(auth.identify(&session.token).unwrap().id, user.id);
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let auth = service();
        let user = register(&auth, "a@b.com", "123123").await;

        assert_ne!(user.password_hash, "123123");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let auth = service();
        register(&auth, "a@b.com", "123123").await;

        let result = auth
            .register(NewUser {
                name: "Again".into(),
                email: "A@b.com".into(),
                password: "654321".into(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::EmailExists)));
    }

    #[tokio::test]
    async fn test_set_password() {
        let auth = service();
        let user = register(&auth, "a@b.com", "123123").await;

        auth.set_password(user.id, "654321").await.unwrap();

        let stored = auth.get_user(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, user.password_hash);
        assert_ne!(stored.password_hash, "654321");

        assert!(matches!(
            auth.authenticate(Credentials::new("a@b.com", "123123")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(auth
            .authenticate(Credentials::new("a@b.com", "654321"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_set_password_unknown_user() {
        let auth = service();
        let result = auth.set_password(Uuid::new_v4(), "654321").await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_set_password_empty() {
        let auth = service();
        let user = register(&auth, "a@b.com", "123123").await;

        let result = auth.set_password(user.id, "").await;
        assert!(matches!(result, Err(AuthError::EmptyPassword)));
    }

    #[test]
    fn test_from_config_rejects_empty_secret() {
        let config = AuthConfig::new("").with_argon2_params(1024, 1, 1);
        let result = AuthService::from_config(Arc::new(InMemoryUserStore::new()), &config);
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_identify_garbage() {
        assert!(matches!(
            service().identify("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }
}
