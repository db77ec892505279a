// src/models/account.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'accounts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    /// Stable user id; also keys the user's stats document.
    pub id: String,

    /// Unique, stored lower-cased.
    pub email: String,

    pub display_name: Option<String>,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new account (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(email(message = "A valid e-mail address is required."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(max = 50, message = "Display name must be at most 50 characters."))]
    pub display_name: Option<String>,
}

/// DTO for e-mail/password sign-in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
