// src/handlers/memberships.rs

use axum::{
    Json,
    extract::{Path, Query, State},
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
    models::{
        membership::{
            CreateMembershipPayload, Membership, MembershipWithUser, UpdateMembershipPayload,
        },
        pagination::{Page, PaginationQuery},
    },
};

#[utoipa::path(
    post,
    path = "/api/memberships",
    tag = "Memberships",
    security(("api_jwt" = [])),
    request_body = CreateMembershipPayload,
    responses(
        (status = 201, description = "Matrícula criada", body = Membership),
        (status = 404, description = "Usuário ou plano não encontrado"),
        (status = 409, description = "Usuário já possui matrícula ativa")
    )
)]
pub async fn create_membership(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _staff: RequireRole<StaffOnly>,
    Json(payload): Json<CreateMembershipPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let membership = app_state
        .membership_service
        .create(payload, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

#[utoipa::path(
    get,
    path = "/api/memberships",
    tag = "Memberships",
    security(("api_jwt" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Lista paginada de matrículas", body = Page<MembershipWithUser>)
    )
)]
pub async fn list_memberships(
    State(app_state): State<AppState>,
    _staff: RequireRole<StaffOnly>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Page<MembershipWithUser>>, AppError> {
    let page = app_state.membership_service.list(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    put,
    path = "/api/memberships/{id}",
    tag = "Memberships",
    security(("api_jwt" = [])),
    request_body = UpdateMembershipPayload,
    responses(
        (status = 200, description = "Matrícula atualizada", body = Membership),
        (status = 404, description = "Matrícula não encontrada"),
        (status = 409, description = "Matrícula encerrada não pode ser reativada")
    )
)]
pub async fn update_membership(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMembershipPayload>,
) -> Result<Json<Membership>, AppError> {
    let membership = app_state
        .membership_service
        .update(id, payload, &actor)
        .await?;
    Ok(Json(membership))
}

#[utoipa::path(
    post,
    path = "/api/memberships/{id}/cancel",
    tag = "Memberships",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Matrícula cancelada", body = Membership),
        (status = 404, description = "Matrícula não encontrada"),
        (status = 409, description = "Matrícula não está ativa")
    )
)]
pub async fn cancel_membership(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<Membership>, AppError> {
    let membership = app_state.membership_service.cancel(id, &actor).await?;
    Ok(Json(membership))
}

#[utoipa::path(
    delete,
    path = "/api/memberships/{id}",
    tag = "Memberships",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Matrícula removida"),
        (status = 404, description = "Matrícula não encontrada")
    )
)]
pub async fn delete_membership(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.membership_service.delete(id, &actor).await?;
    Ok(Json(json!({ "message": "Membership deleted successfully" })))
}
