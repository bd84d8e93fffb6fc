// src/models/checkin.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Uma visita: criada na entrada, fechada (no máximo uma vez) na saída.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: Uuid,

    // Visitantes não cadastrados não têm user_id; nome/e-mail são o
    // snapshot de identidade registrado na portaria.
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,

    pub checkin_time: DateTime<Utc>,
    pub checkout_time: Option<DateTime<Utc>>,

    // Snapshot no momento da entrada; nunca recalculado depois.
    pub is_member: bool,

    #[schema(ignore)]
    pub created_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinPayload {
    pub user_id: Option<Uuid>,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "client@gym.test")]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Name cannot be empty"))]
    #[schema(example = "Maria Silva")]
    pub name: Option<String>,
}

impl CheckinPayload {
    /// Pelo menos um campo de identidade precisa estar presente.
    pub fn has_identity(&self) -> bool {
        self.user_id.is_some()
            || self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
            || self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinResponse {
    #[schema(example = "Member checked in!")]
    pub message: String,
    pub checkin: Checkin,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CheckinListQuery {
    // true = só sessões abertas; false = só fechadas; ausente = todas
    pub open: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_identity_is_rejected() {
        let p = CheckinPayload::default();
        assert!(!p.has_identity());
    }

    #[test]
    fn blank_fields_do_not_count_as_identity() {
        let p = CheckinPayload {
            email: Some("  ".to_string()),
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(!p.has_identity());
    }

    #[test]
    fn any_single_field_is_enough() {
        let by_name = CheckinPayload {
            name: Some("Maria Silva".to_string()),
            ..Default::default()
        };
        assert!(by_name.has_identity());

        let by_user = CheckinPayload {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(by_user.has_identity());
    }
}
