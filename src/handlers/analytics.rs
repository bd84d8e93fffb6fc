// src/handlers/analytics.rs
//
// Rotas de análise: somente leitura, restritas a admin, com exceção da
// lista de vencimentos próximos, que a recepção também consulta.

use axum::{Json, extract::State};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole, StaffOnly},
    models::{
        analytics::{
            ChurnResponse, DailyCheckinEntry, DashboardStats, HourlyCheckinEntry, MrrResponse,
            NewMembersEntry, PlanRevenueEntry, RevenueForecast, RevenueSummary, TrailingRevenue,
            WeekdayCheckinEntry,
        },
        membership::MembershipWithUser,
    },
};

#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Contadores do painel", body = DashboardStats))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(app_state.analytics_service.dashboard_stats().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/weekly-checkins",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Check-ins por dia nos últimos 7 dias", body = Vec<DailyCheckinEntry>))
)]
pub async fn weekly_checkins(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<Vec<DailyCheckinEntry>>, AppError> {
    Ok(Json(app_state.analytics_service.weekly_checkins().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/peak-hours",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Check-ins por hora do dia", body = Vec<HourlyCheckinEntry>))
)]
pub async fn peak_hours(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<Vec<HourlyCheckinEntry>>, AppError> {
    Ok(Json(app_state.analytics_service.peak_hours().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/day-of-week",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Check-ins por dia da semana", body = Vec<WeekdayCheckinEntry>))
)]
pub async fn day_of_week(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<Vec<WeekdayCheckinEntry>>, AppError> {
    Ok(Json(app_state.analytics_service.day_of_week().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/expiring",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Matrículas que vencem nos próximos 7 dias", body = Vec<MembershipWithUser>))
)]
pub async fn expiring(
    State(app_state): State<AppState>,
    _staff: RequireRole<StaffOnly>,
) -> Result<Json<Vec<MembershipWithUser>>, AppError> {
    Ok(Json(
        app_state.analytics_service.expiring_memberships().await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/analytics/revenue",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Receita total paga", body = RevenueSummary))
)]
pub async fn revenue(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<RevenueSummary>, AppError> {
    Ok(Json(app_state.analytics_service.revenue_summary().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/revenue-by-plan",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Receita paga agrupada por plano", body = Vec<PlanRevenueEntry>))
)]
pub async fn revenue_by_plan(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<Vec<PlanRevenueEntry>>, AppError> {
    Ok(Json(app_state.analytics_service.revenue_by_plan().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/mrr",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Receita recorrente mensal normalizada", body = MrrResponse))
)]
pub async fn mrr(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<MrrResponse>, AppError> {
    Ok(Json(app_state.analytics_service.mrr().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/revenue-30d",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Receita paga dos últimos 30 dias", body = TrailingRevenue))
)]
pub async fn revenue_30d(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<TrailingRevenue>, AppError> {
    Ok(Json(
        app_state.analytics_service.revenue_last_30_days().await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/analytics/new-members-30d",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Novos cadastros dos últimos 30 dias", body = NewMembersEntry))
)]
pub async fn new_members_30d(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<NewMembersEntry>, AppError> {
    Ok(Json(
        app_state
            .analytics_service
            .new_members_last_30_days()
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/analytics/churn",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Taxa de evasão na janela de 30 dias", body = ChurnResponse))
)]
pub async fn churn(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<ChurnResponse>, AppError> {
    Ok(Json(app_state.analytics_service.churn().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/forecast",
    tag = "Analytics",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Projeção de receita do próximo mês", body = RevenueForecast))
)]
pub async fn forecast(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<RevenueForecast>, AppError> {
    Ok(Json(app_state.analytics_service.revenue_forecast().await?))
}
