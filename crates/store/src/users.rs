//! User accounts for the local authentication layer.
//!
//! Two representations: [`User`] is the complete `users` row (including the
//! Argon2 password hash) and never leaves the server; [`UserProfile`] is the
//! client-safe projection the API returns.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{StoreError, StoreResult};

const ROLES: [&str; 3] = ["patient", "clinician", "admin"];

/// Full user record from the database.
#[derive(Clone, Debug, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Project into the client-safe shape (no hash, no soft-delete marker).
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.to_string(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// User information safe to send to clients.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// User persistence and credential verification.
#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a user with a hashed password.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidRole`] for a role outside {patient, clinician,
    /// admin}; [`StoreError::EmailTaken`] when the email is already registered.
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
        role: &str,
    ) -> StoreResult<User> {
        if !ROLES.contains(&role) {
            return Err(StoreError::InvalidRole(role.to_string()));
        }
        let password_hash = medwallet_auth::hash_password(password)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, full_name, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(&password_hash)
        .bind(full_name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::EmailTaken(email.to_string())
            }
            _ => StoreError::Database(e),
        })?;

        tracing::info!(email, role, "user created");
        Ok(user)
    }

    /// Look up an active user by email.
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users \
             WHERE email = $1 AND is_active AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Verify credentials, returning the user on success and `None` on any
    /// mismatch. Failure is logged, never raised: the absent user is the sole
    /// failure signal for callers. Updates `last_login` on success.
    pub async fn authenticate(&self, email: &str, password: &str) -> StoreResult<Option<User>> {
        let Some(user) = self.find_by_email(email).await? else {
            tracing::warn!(email, "authentication failed: unknown or inactive user");
            return Ok(None);
        };

        if !medwallet_auth::verify_password(password, &user.password_hash)? {
            tracing::warn!(email, "authentication failed: password mismatch");
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET last_login = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(email, "user authenticated");
        Ok(Some(user))
    }

    /// Soft-delete a user.
    pub async fn soft_delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            full_name: Some("Ada".to_string()),
            role: "clinician".to_string(),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
            deleted_at: None,
        };
        let profile = user.to_profile();
        let json = serde_json::to_value(&profile).expect("serialise profile");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "clinician");
    }

    #[test]
    fn role_value_set() {
        assert!(ROLES.contains(&"patient"));
        assert!(ROLES.contains(&"admin"));
        assert!(!ROLES.contains(&"superuser"));
    }
}
