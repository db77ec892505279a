// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::{AuthenticatedUser, Credential, IdentityProvider},
    config::Config,
    error::AppError,
    models::account::{CreateAccountRequest, LoginRequest},
    stats::StatsRepository,
    utils::jwt::sign_jwt,
};

/// Registers a new e-mail/password account.
///
/// Bootstraps the user's stats profile right away.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(identity): State<Arc<dyn IdentityProvider>>,
    State(stats): State<StatsRepository>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = identity.sign_up(&payload).await?;
    tracing::info!("Registered account {}", user.id);

    stats.ensure_profile(&user.id, Some(&user.shown_name())).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Provider failures are surfaced with their own message. Every successful
/// sign-in makes sure the stats profile exists.
pub async fn login(
    State(identity): State<Arc<dyn IdentityProvider>>,
    State(stats): State<StatsRepository>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user: AuthenticatedUser = identity
        .sign_in(Credential::EmailPassword {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let display_name = user.shown_name();
    stats.ensure_profile(&user.id, Some(&display_name)).await?;

    let token = sign_jwt(
        &user.id,
        &display_name,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user,
        "display_name": display_name
    })))
}
