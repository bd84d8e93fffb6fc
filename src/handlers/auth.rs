// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{
        AuthResponse, ForgotPasswordPayload, LoginUserPayload, RegisterUserPayload,
        ResetPasswordPayload, User,
    },
};

// Handler de registro público
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state.auth_service.register_user(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered! Please check your email to verify your account."
        })),
    ))
}

// Handler de login
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    Ok(Json(response))
}

pub async fn verify_email(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.auth_service.verify_email(&token).await?;
    Ok(Json(json!({ "message": "Email verified successfully!" })))
}

pub async fn forgot_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state.auth_service.forgot_password(&payload.email).await?;
    Ok(Json(json!({ "message": "Password reset email sent" })))
}

pub async fn reset_password(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .auth_service
        .reset_password(&token, &payload.password)
        .await?;
    Ok(Json(json!({ "message": "Password reset successfully" })))
}

// Handler da rota protegida /me
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
