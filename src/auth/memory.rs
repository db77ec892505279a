// src/auth/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AuthenticatedUser, Credential, IdentityProvider, check_password, normalize_email};
use crate::{
    error::AppError,
    models::account::{Account, CreateAccountRequest},
    utils::hash::hash_password,
};

/// Process-local accounts keyed by normalized e-mail.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, request: &CreateAccountRequest) -> Result<AuthenticatedUser, AppError> {
        let email = normalize_email(&request.email);
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&email) {
            return Err(AppError::Conflict(format!(
                "An account for '{}' already exists",
                email
            )));
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            display_name: request.display_name.clone(),
            password: hash_password(&request.password)?,
            created_at: Some(Utc::now()),
        };
        accounts.insert(email, account.clone());
        Ok(account.into())
    }

    async fn sign_in(&self, credential: Credential) -> Result<AuthenticatedUser, AppError> {
        let Credential::EmailPassword { email, password } = credential;
        let account = self
            .accounts
            .lock()
            .await
            .get(&normalize_email(&email))
            .cloned();
        check_password(account, &password)
    }
}
