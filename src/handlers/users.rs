// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::rbac::{AdminOnly, RequireRole, StaffOnly},
    models::auth::{CreateUserPayload, UpdateUserPayload, User},
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Lista todos os usuários", body = Vec<User>),
        (status = 403, description = "Acesso negado")
    )
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _staff: RequireRole<StaffOnly>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state.auth_service.list_users().await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    security(("api_jwt" = [])),
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 409, description = "Email já cadastrado")
    )
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _staff: RequireRole<StaffOnly>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state
        .auth_service
        .admin_create_user(payload, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    security(("api_jwt" = [])),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _staff: RequireRole<StaffOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state
        .auth_service
        .update_user(id, payload, &actor)
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Usuário removido"),
        (status = 404, description = "Usuário não encontrado")
    )
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.auth_service.delete_user(id, &actor).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
