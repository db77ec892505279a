// src/auth/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    error::AppError,
    models::account::{Account, CreateAccountRequest},
    utils::hash::verify_password,
};

pub use memory::MemoryIdentityProvider;
pub use postgres::PgIdentityProvider;

/// What a user presents to sign in.
#[derive(Debug, Clone)]
pub enum Credential {
    EmailPassword { email: String, password: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Name shown on the dashboard: the chosen display name, else the e-mail's
    /// local part.
    pub fn shown_name(&self) -> String {
        match self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => name.to_string(),
            None => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl From<Account> for AuthenticatedUser {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
        }
    }
}

/// Exchanges credentials for an authenticated user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, request: &CreateAccountRequest) -> Result<AuthenticatedUser, AppError>;

    async fn sign_in(&self, credential: Credential) -> Result<AuthenticatedUser, AppError>;
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Shared tail of every e-mail/password sign-in.
pub(crate) fn check_password(
    account: Option<Account>,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let account = account.ok_or(AppError::AuthError(
        "No account exists for this e-mail".to_string(),
    ))?;

    if !verify_password(password, &account.password)? {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    Ok(account.into())
}
