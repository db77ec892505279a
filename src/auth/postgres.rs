// src/auth/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AuthenticatedUser, Credential, IdentityProvider, check_password, normalize_email};
use crate::{
    error::AppError,
    models::account::{Account, CreateAccountRequest},
    utils::hash::hash_password,
};

/// Accounts in the 'accounts' table, passwords hashed with Argon2.
#[derive(Clone)]
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn sign_up(&self, request: &CreateAccountRequest) -> Result<AuthenticatedUser, AppError> {
        let hashed_password = hash_password(&request.password)?;
        let email = normalize_email(&request.email);

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, display_name, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, display_name, password, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&email)
        .bind(&request.display_name)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505
            let unique_violation = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == "23505");
            if unique_violation {
                AppError::Conflict(format!("An account for '{}' already exists", email))
            } else {
                tracing::error!("Failed to register account: {:?}", e);
                AppError::from(e)
            }
        })?;

        Ok(account.into())
    }

    async fn sign_in(&self, credential: Credential) -> Result<AuthenticatedUser, AppError> {
        let Credential::EmailPassword { email, password } = credential;

        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, display_name, password, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(&email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::from(e)
        })?;

        check_password(account, &password)
    }
}
