// src/handlers/checkins.rs

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
    middleware::auth::MaybeUser,
    middleware::rbac::{AdminOnly, RequireRole, StaffOnly},
    models::{
        checkin::{Checkin, CheckinListQuery, CheckinPayload, CheckinResponse},
        pagination::Page,
    },
};

// Check-in é público: o totem da recepção não autentica. Se vier um token
// válido, o registrador fica gravado na visita.
#[utoipa::path(
    post,
    path = "/api/checkins",
    tag = "Checkins",
    request_body = CheckinPayload,
    responses(
        (status = 201, description = "Entrada registrada", body = CheckinResponse),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Já existe sessão aberta para esta pessoa")
    )
)]
pub async fn record_checkin(
    State(app_state): State<AppState>,
    MaybeUser(actor): MaybeUser,
    Json(payload): Json<CheckinPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let checkin = app_state
        .checkin_service
        .record_checkin(payload, actor.as_ref())
        .await?;

    let message = if checkin.is_member {
        "Welcome back! Check-in successful."
    } else {
        "Check-in recorded. Ask the front desk about membership plans!"
    };

    Ok((
        StatusCode::CREATED,
        Json(CheckinResponse {
            message: message.to_string(),
            checkin,
        }),
    ))
}

// Checkout também sai do totem, sem autenticação
#[utoipa::path(
    post,
    path = "/api/checkins/{id}/checkout",
    tag = "Checkins",
    responses(
        (status = 200, description = "Saída registrada", body = Checkin),
        (status = 404, description = "Visita não encontrada"),
        (status = 409, description = "Visita já encerrada")
    )
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Checkin>, AppError> {
    let checkin = app_state.checkin_service.checkout(id).await?;
    Ok(Json(checkin))
}

#[utoipa::path(
    get,
    path = "/api/checkins",
    tag = "Checkins",
    security(("api_jwt" = [])),
    params(CheckinListQuery),
    responses(
        (status = 200, description = "Lista paginada de visitas", body = Page<Checkin>)
    )
)]
pub async fn list_checkins(
    State(app_state): State<AppState>,
    _staff: RequireRole<StaffOnly>,
    Query(query): Query<CheckinListQuery>,
) -> Result<Json<Page<Checkin>>, AppError> {
    let page = app_state.checkin_service.list(query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    delete,
    path = "/api/checkins/{id}",
    tag = "Checkins",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Visita removida"),
        (status = 404, description = "Visita não encontrada")
    )
)]
pub async fn delete_checkin(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.checkin_service.delete(id).await?;
    Ok(Json(json!({ "message": "Check-in deleted successfully" })))
}
