//! User Storage
//!
//! [`UserStore`] is the persistence seam for user records. Stores never hash
//! anything: they receive finished password hashes and keep them. Emails are
//! stored normalized and are unique.

use crate::error::AuthError;
use crate::models::{normalize_email, UserRecord};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by email, case-insensitively
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Find a user by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError>;

    /// Insert a new user holding an already computed password hash
    ///
    /// Fails with [`AuthError::EmailExists`] when the email is taken.
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: String,
    ) -> Result<UserRecord, AuthError>;

    /// Replace the password hash of a user
    ///
    /// Fails with [`AuthError::UserNotFound`] for an unknown id.
    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<(), AuthError>;
}

// ============================================
// In-memory store
// ============================================

/// Process-local store, for tests and single-node deployments without a database
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let email = normalize_email(email);
        let users = self.users.read().await;

        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: String,
    ) -> Result<UserRecord, AuthError> {
        let email = normalize_email(email);

        // Uniqueness check and insert happen under one write lock.
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(AuthError::EmailExists);
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<(), AuthError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        user.password_hash = password_hash;

        Ok(())
    }
}

// ============================================
// PostgreSQL store
// ============================================

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create the users table if it does not exist
    pub async fn migrate(&self) -> Result<(), AuthError> {
        tracing::info!("Running user store migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.db)
        .await?;

        tracing::info!("User store migrations completed");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: String,
    ) -> Result<UserRecord, AuthError> {
        // A concurrent duplicate surfaces as a unique violation, mapped to EmailExists.
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(normalize_email(email))
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&password_hash)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}
