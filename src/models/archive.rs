// src/models/archive.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "archive_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Membership,
    Checkin,
}

// Pacote anual de armazenamento frio, um por (ano, tipo)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Archive {
    pub id: Uuid,
    pub year: i32,
    pub kind: ArchiveKind,

    // Registros serializados como foram arquivados (JSONB)
    pub data: Value,

    pub archived_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
