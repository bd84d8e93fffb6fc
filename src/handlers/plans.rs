// src/handlers/plans.rs

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
    middleware::rbac::{AdminOnly, RequireRole},
    models::plan::{CreatePlanPayload, MembershipPlan, PlanListQuery, UpdatePlanPayload},
};

#[utoipa::path(
    get,
    path = "/api/plans",
    tag = "Plans",
    params(PlanListQuery),
    responses(
        (status = 200, description = "Lista os planos do catálogo", body = Vec<MembershipPlan>)
    )
)]
pub async fn list_plans(
    State(app_state): State<AppState>,
    Query(query): Query<PlanListQuery>,
) -> Result<Json<Vec<MembershipPlan>>, AppError> {
    let plans = app_state.plan_service.list(query.active).await?;
    Ok(Json(plans))
}

#[utoipa::path(
    get,
    path = "/api/plans/{id}",
    tag = "Plans",
    responses(
        (status = 200, description = "Detalhe do plano", body = MembershipPlan),
        (status = 404, description = "Plano não encontrado")
    )
)]
pub async fn get_plan(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MembershipPlan>, AppError> {
    let plan = app_state.plan_service.get(id).await?;
    Ok(Json(plan))
}

#[utoipa::path(
    post,
    path = "/api/plans",
    tag = "Plans",
    security(("api_jwt" = [])),
    request_body = CreatePlanPayload,
    responses(
        (status = 201, description = "Plano criado", body = MembershipPlan),
        (status = 409, description = "Nome de plano já existe")
    )
)]
pub async fn create_plan(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _admin: RequireRole<AdminOnly>,
    Json(payload): Json<CreatePlanPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let plan = app_state.plan_service.create(payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[utoipa::path(
    put,
    path = "/api/plans/{id}",
    tag = "Plans",
    security(("api_jwt" = [])),
    request_body = UpdatePlanPayload,
    responses(
        (status = 200, description = "Plano atualizado", body = MembershipPlan),
        (status = 404, description = "Plano não encontrado")
    )
)]
pub async fn update_plan(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanPayload>,
) -> Result<Json<MembershipPlan>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let plan = app_state.plan_service.update(id, payload, &actor).await?;
    Ok(Json(plan))
}

#[utoipa::path(
    delete,
    path = "/api/plans/{id}",
    tag = "Plans",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Plano removido"),
        (status = 409, description = "Plano possui matrículas ativas")
    )
)]
pub async fn delete_plan(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.plan_service.delete(id).await?;
    Ok(Json(json!({ "message": "Plan deleted successfully" })))
}
