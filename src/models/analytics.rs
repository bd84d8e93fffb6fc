// src/models/analytics.rs
//
// Formas de resposta da camada de agregação. Todos os buckets de
// data/hora usam UTC.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Os cards do topo do painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_memberships: i64,
    pub total_checkins: i64,
    pub active_memberships: i64,
}

// Check-ins agrupados por dia (YYYY-MM-DD, UTC)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyCheckinEntry {
    pub date: Option<String>,
    pub total: Option<i64>,
}

// Check-ins por hora do dia (0-23, UTC)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCheckinEntry {
    pub hour: Option<i32>,
    pub total: Option<i64>,
}

// Check-ins por dia da semana (0 = domingo, convenção do EXTRACT(DOW))
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayCheckinEntry {
    pub weekday: Option<i32>,
    pub total: Option<i64>,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    #[schema(example = "360.00")]
    pub total_revenue: Decimal,
    pub paid_count: i64,
    pub avg_price: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRevenueEntry {
    pub membership_type: String,
    pub total_revenue: Option<Decimal>,
    pub memberships: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MrrResponse {
    #[schema(example = "55.00")]
    pub mrr: Decimal,
    pub active_paid_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChurnResponse {
    // expirados na janela de 30 dias / (expirados + ativos); 0 se vazio
    pub churn_rate: f64,
    pub expired_last_30_days: i64,
    pub active_memberships: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrailingRevenue {
    pub total_revenue: Decimal,
    pub memberships: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMembersEntry {
    pub new_members: i64,
}

// Bucket mensal usado pela regressão (YYYY-MM, UTC)
#[derive(Debug, Clone, FromRow)]
pub struct MonthlyRevenueRow {
    pub month: Option<String>,
    pub total: Option<Decimal>,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueForecast {
    // Projeção do próximo mês, nunca negativa
    pub projected_next_month: f64,
    // Inclinação normalizada pela média; 0 se inclinação <= 0 ou dados insuficientes
    pub growth_rate: f64,
    pub months_used: usize,
}
