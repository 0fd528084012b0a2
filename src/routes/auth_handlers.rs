use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::{AppError, AppResult};
use crate::models::User;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;

use super::helpers::JsonBody;
use super::AppState;

/// Register a new account and return a token for it
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|_| AppError::Validation("name, email, password are required".to_string()))?;

    let email = payload.email.trim().to_lowercase();
    tracing::info!(email = %email, "Registration attempt");

    if state.repository.find_user_by_email(&email).await?.is_some() {
        tracing::info!(email = %email, "Email already registered");
        return Err(AppError::EmailExists("Email already registered".to_string()));
    }

    let password_hash = state.auth_service.hash_password(&payload.password)?;
    let user = User::new(payload.name.trim().to_string(), &email, password_hash);

    // The store re-checks the email atomically in case of a concurrent registration
    state.repository.insert_user(&user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    let token = state.auth_service.generate_token(&user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Login to get JWT token
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|_| AppError::Validation("email and password are required".to_string()))?;

    let email = payload.email.trim().to_lowercase();

    let Some(user) = state.repository.find_user_by_email(&email).await? else {
        tracing::warn!(email = %email, "Login for unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    if !state
        .auth_service
        .verify_password(&payload.password, &user.password_hash)?
    {
        tracing::warn!(email = %email, "Password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.auth_service.generate_token(&user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "Login successful");

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
