// src/models/plan.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Entidade (catálogo de planos) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlan {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "monthly")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = "30.00")]
    pub price: Decimal,

    // Duração em dias; planos com nome monthly/quarterly/annual usam
    // aritmética de calendário em vez deste campo.
    #[schema(example = 30)]
    pub duration_days: i32,

    #[schema(example = 1)]
    pub allowed_users: i32,

    pub is_active: bool,
    pub sort_order: i32,

    #[schema(ignore)]
    pub created_by: Option<Uuid>,
    #[schema(ignore)]
    pub updated_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanPayload {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "quarterly")]
    pub name: String,

    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,

    #[schema(example = "80.00")]
    pub price: Decimal,

    #[validate(range(min = 1, message = "Duration must be at least 1 day"))]
    #[schema(example = 90)]
    pub duration_days: i32,

    #[validate(range(min = 1, message = "Must allow at least 1 user"))]
    pub allowed_users: Option<i32>,

    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanPayload {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    pub description: Option<String>,

    pub price: Option<Decimal>,

    #[validate(range(min = 1, message = "Duration must be at least 1 day"))]
    pub duration_days: Option<i32>,

    #[validate(range(min = 1, message = "Must allow at least 1 user"))]
    pub allowed_users: Option<i32>,

    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PlanListQuery {
    // Quando presente, filtra por flag de ativo; o público vê só os ativos.
    pub active: Option<bool>,
}
