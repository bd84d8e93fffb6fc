// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Taxonomia: validação (4xx corrigível pelo cliente), não-encontrado,
// conflito (invariante violada), autorização e infraestrutura.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Regras de campo fora do alcance do derive (ex.: "email ou nome")
    #[error("{0}")]
    InvalidInput(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Nome de plano já existe")]
    PlanNameAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("E-mail não verificado")]
    EmailNotVerified,

    #[error("Cargo insuficiente")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Plano não encontrado")]
    PlanNotFound,

    #[error("Matrícula não encontrada")]
    MembershipNotFound,

    #[error("Check-in não encontrado")]
    CheckinNotFound,

    #[error("Plano inativo")]
    PlanInactive,

    #[error("Plano em uso por matrículas ativas")]
    PlanInUse,

    // Política escolhida: matrícula ativa duplicada é rejeitada, nunca
    // substituída silenciosamente.
    #[error("Usuário já possui matrícula ativa até {ends_at}")]
    ActiveMembershipExists { ends_at: DateTime<Utc> },

    #[error("Identidade já possui sessão aberta desde {since}")]
    AlreadyCheckedIn { since: DateTime<Utc> },

    #[error("Check-in já encerrado")]
    AlreadyCheckedOut,

    #[error("Matrícula não está ativa")]
    MembershipNotActive,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidInput(message) => {
                let body = Json(json!({ "error": message }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ActiveMembershipExists { ends_at } => {
                let body = Json(json!({
                    "error": "User already has an active membership",
                    "currentMembershipEndDate": ends_at,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::AlreadyCheckedIn { since } => {
                let body = Json(json!({
                    "error": "Already checked in",
                    "openSessionSince": since,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Email already exists"),
            AppError::PlanNameAlreadyExists => (StatusCode::CONFLICT, "Plan name already exists"),
            AppError::AlreadyCheckedOut => (StatusCode::CONFLICT, "Checkin is already closed"),
            AppError::MembershipNotActive => {
                (StatusCode::CONFLICT, "Membership is not active")
            }
            AppError::PlanInUse => (
                StatusCode::CONFLICT,
                "Cannot delete plan - it is used by active memberships. Deactivate the plan instead.",
            ),

            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Not authorized, token missing or invalid")
            }
            AppError::EmailNotVerified => {
                (StatusCode::FORBIDDEN, "Please verify your email first")
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden - insufficient role"),

            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AppError::PlanNotFound => (StatusCode::NOT_FOUND, "Membership plan not found"),
            AppError::MembershipNotFound => (StatusCode::NOT_FOUND, "Membership not found"),
            AppError::CheckinNotFound => (StatusCode::NOT_FOUND, "Checkin not found"),

            AppError::PlanInactive => (StatusCode::BAD_REQUEST, "Membership plan is not active"),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe só o rótulo.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
