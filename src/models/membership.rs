// src/models/membership.rs

use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Expired,
    Cancelled,
}

// --- Termo do plano ---

/// Termos com aritmética de calendário (mês/trimestre/ano, dia ajustado
/// para o fim do mês quando necessário). Planos fora desta tabela usam a
/// duração em dias do catálogo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipTerm {
    Monthly,
    Quarterly,
    Annual,
}

impl MembershipTerm {
    /// Divisor da tabela fixa de normalização do MRR.
    pub fn monthly_divisor(&self) -> Decimal {
        match self {
            MembershipTerm::Monthly => Decimal::from(1),
            MembershipTerm::Quarterly => Decimal::from(3),
            MembershipTerm::Annual => Decimal::from(12),
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            MembershipTerm::Monthly => 1,
            MembershipTerm::Quarterly => 3,
            MembershipTerm::Annual => 12,
        }
    }
}

impl FromStr for MembershipTerm {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(MembershipTerm::Monthly),
            "quarterly" => Ok(MembershipTerm::Quarterly),
            "annual" => Ok(MembershipTerm::Annual),
            _ => Err(()),
        }
    }
}

/// Calcula a data de término de uma matrícula. Termos conhecidos somam
/// meses de calendário; qualquer outro tipo soma `duration_days` corridos.
/// Retorna `None` apenas se a soma estourar o intervalo do chrono.
pub fn compute_end_date(
    start: DateTime<Utc>,
    membership_type: &str,
    duration_days: i64,
) -> Option<DateTime<Utc>> {
    match MembershipTerm::from_str(membership_type) {
        Ok(term) => start.checked_add_months(Months::new(term.months())),
        Err(()) => start.checked_add_signed(Duration::days(duration_days)),
    }
}

// --- Entidade ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,

    // Nome do plano/termo no momento da compra (denormalizado para exibição)
    #[schema(example = "monthly")]
    pub membership_type: String,

    // Snapshot do preço; alterações futuras do plano não o afetam.
    #[schema(example = "30.00")]
    pub price: Decimal,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    pub payment_status: PaymentStatus,
    pub status: MembershipStatus,

    // Última transição de status (expiração ou cancelamento)
    #[serde(skip_serializing)]
    pub status_changed_at: Option<DateTime<Utc>>,

    #[schema(ignore)]
    pub created_by: Option<Uuid>,
    #[schema(ignore)]
    pub updated_by: Option<Uuid>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// O predicado de atividade, único em todo o sistema: status ativo e
    /// data de término ainda não passou no instante consultado.
    pub fn is_active_at(&self, as_of: DateTime<Utc>) -> bool {
        self.status == MembershipStatus::Active && self.end_date >= as_of
    }
}

// Matrícula enriquecida com os dados do usuário (listagens e notificações)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub membership: Membership,

    pub user_email: String,
    pub user_first_name: String,
    pub user_last_name: String,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembershipPayload {
    #[validate(email(message = "Valid user email required"))]
    #[schema(example = "client@gym.test")]
    pub email: String,

    // Ou o plano do catálogo...
    pub plan_id: Option<Uuid>,

    // ...ou termo explícito (monthly | quarterly | annual) com preço.
    #[schema(example = "monthly")]
    pub membership_type: Option<String>,
    pub price: Option<Decimal>,

    pub payment_status: Option<PaymentStatus>,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipPayload {
    pub membership_type: Option<String>,
    pub price: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<MembershipStatus>,
    pub start_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn monthly_term_adds_one_calendar_month() {
        let end = compute_end_date(utc(2024, 1, 1), "monthly", 30).unwrap();
        assert_eq!(end, utc(2024, 2, 1));
    }

    #[test]
    fn quarterly_term_adds_three_months() {
        let end = compute_end_date(utc(2024, 1, 15), "quarterly", 90).unwrap();
        assert_eq!(end, utc(2024, 4, 15));
    }

    #[test]
    fn annual_term_adds_one_year() {
        let end = compute_end_date(utc(2024, 3, 10), "annual", 365).unwrap();
        assert_eq!(end, utc(2025, 3, 10));
    }

    #[test]
    fn month_addition_clamps_to_end_of_month() {
        // 31 de janeiro + 1 mês cai no último dia de fevereiro
        let end = compute_end_date(utc(2024, 1, 31), "monthly", 30).unwrap();
        assert_eq!(end, utc(2024, 2, 29));
    }

    #[test]
    fn unknown_type_falls_back_to_duration_days() {
        let end = compute_end_date(utc(2024, 1, 1), "day-pass", 1).unwrap();
        assert_eq!(end, utc(2024, 1, 2));
    }

    #[test]
    fn term_parsing_is_case_insensitive() {
        assert_eq!("Monthly".parse::<MembershipTerm>(), Ok(MembershipTerm::Monthly));
        assert!("weekly".parse::<MembershipTerm>().is_err());
    }

    fn membership(status: MembershipStatus, end: DateTime<Utc>) -> Membership {
        Membership {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: None,
            membership_type: "monthly".to_string(),
            price: Decimal::from(30),
            start_date: utc(2024, 1, 1),
            end_date: end,
            payment_status: PaymentStatus::Paid,
            status,
            status_changed_at: None,
            created_by: None,
            updated_by: None,
            deleted_at: None,
            created_at: utc(2024, 1, 1),
            updated_at: utc(2024, 1, 1),
        }
    }

    #[test]
    fn active_membership_is_active_until_end_date() {
        let m = membership(MembershipStatus::Active, utc(2024, 2, 1));
        assert!(m.is_active_at(utc(2024, 1, 15)));
        assert!(m.is_active_at(utc(2024, 2, 1)));
        assert!(!m.is_active_at(utc(2024, 2, 2)));
    }

    #[test]
    fn cancelled_membership_is_never_active() {
        let m = membership(MembershipStatus::Cancelled, utc(2099, 1, 1));
        assert!(!m.is_active_at(utc(2024, 1, 15)));
    }
}
