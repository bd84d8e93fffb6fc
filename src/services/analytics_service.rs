// src/services/analytics_service.rs
//
// Camada de agregação: derivações somente-leitura sobre matrículas e
// check-ins. Janelas e buckets sempre em UTC; conjuntos vazios produzem
// zeros documentados, nunca erro.

use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::AnalyticsRepository,
    models::{
        analytics::{
            ChurnResponse, DailyCheckinEntry, DashboardStats, HourlyCheckinEntry, MrrResponse,
            NewMembersEntry, PlanRevenueEntry, RevenueForecast, RevenueSummary, TrailingRevenue,
            WeekdayCheckinEntry,
        },
        membership::{MembershipTerm, MembershipWithUser},
    },
    services::membership_service::MembershipService,
};

const CHURN_WINDOW_DAYS: i64 = 30;
const TRAILING_WINDOW_DAYS: i64 = 30;
const EXPIRING_WINDOW_DAYS: i64 = 7;
const FORECAST_MONTHS: u32 = 3;

// --- Funções puras (a matemática fica testável sem banco) ---

/// Resumo de receita; conjunto vazio vira {0, 0, 0}.
pub fn summarize_revenue(total: Decimal, paid_count: i64) -> RevenueSummary {
    let avg_price = if paid_count > 0 {
        total / Decimal::from(paid_count)
    } else {
        Decimal::ZERO
    };
    RevenueSummary {
        total_revenue: total,
        paid_count,
        avg_price,
    }
}

/// Contribuição mensal de uma matrícula para o MRR. Termos fora da tabela
/// fixa {monthly:1, quarterly:3, annual:12} usam divisor 1 — aproximação
/// documentada, não rateio.
pub fn monthly_contribution(membership_type: &str, price: Decimal) -> Decimal {
    match MembershipTerm::from_str(membership_type) {
        Ok(term) => price / term.monthly_divisor(),
        Err(()) => price,
    }
}

/// Churn instantâneo: expiradas na janela / (expiradas + ativas agora);
/// 0 quando o denominador é 0. Não é análise de coorte.
pub fn churn_rate(expired_in_window: i64, active_now: i64) -> f64 {
    let denominator = expired_in_window + active_now;
    if denominator == 0 {
        return 0.0;
    }
    expired_in_window as f64 / denominator as f64
}

/// Expande os buckets (YYYY-MM, total) em uma janela de meses de
/// calendário consecutivos a partir de `start`. Meses sem receita viram
/// 0.0 — sem isso, a regressão trataria buckets não adjacentes como
/// pontos consecutivos e inflaria a tendência.
pub fn fill_monthly_window(start: NaiveDate, months: u32, buckets: &[(String, f64)]) -> Vec<f64> {
    (0..months)
        .filter_map(|offset| start.checked_add_months(Months::new(offset)))
        .map(|month| {
            let label = month.format("%Y-%m").to_string();
            buckets
                .iter()
                .find(|(bucket, _)| *bucket == label)
                .map_or(0.0, |(_, total)| *total)
        })
        .collect()
}

/// Regressão linear por mínimos quadrados sobre os buckets mensais
/// (índice do mês no eixo x). Projeta o próximo mês, nunca abaixo de 0;
/// growth_rate é a inclinação normalizada pela média, 0 para inclinação
/// não positiva ou menos de 2 pontos.
pub fn forecast_revenue(monthly_totals: &[f64]) -> RevenueForecast {
    let n = monthly_totals.len();
    if n < 2 {
        let projected = monthly_totals.first().copied().unwrap_or(0.0).max(0.0);
        return RevenueForecast {
            projected_next_month: projected,
            growth_rate: 0.0,
            months_used: n,
        };
    }

    let n_f = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = monthly_totals.iter().sum();
    let sum_xy: f64 = monthly_totals
        .iter()
        .enumerate()
        .map(|(i, y)| i as f64 * y)
        .sum();
    let sum_x2: f64 = (0..n).map(|i| (i as f64) * (i as f64)).sum();

    let denominator = n_f * sum_x2 - sum_x * sum_x;
    let slope = (n_f * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n_f;

    let projected = (intercept + slope * n_f).max(0.0);
    let mean = sum_y / n_f;
    let growth_rate = if slope > 0.0 && mean > 0.0 {
        slope / mean
    } else {
        0.0
    };

    RevenueForecast {
        projected_next_month: projected,
        growth_rate,
        months_used: n,
    }
}

// --- Serviço ---

#[derive(Clone)]
pub struct AnalyticsService {
    repo: AnalyticsRepository,
    membership_service: MembershipService,
    pool: PgPool,
}

impl AnalyticsService {
    pub fn new(
        repo: AnalyticsRepository,
        membership_service: MembershipService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            membership_service,
            pool,
        }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        self.repo.dashboard_stats(&self.pool, Utc::now()).await
    }

    pub async fn weekly_checkins(&self) -> Result<Vec<DailyCheckinEntry>, AppError> {
        let since = Utc::now() - Duration::days(7);
        self.repo.checkins_per_day(since).await
    }

    pub async fn peak_hours(&self) -> Result<Vec<HourlyCheckinEntry>, AppError> {
        self.repo.checkins_per_hour().await
    }

    pub async fn day_of_week(&self) -> Result<Vec<WeekdayCheckinEntry>, AppError> {
        self.repo.checkins_per_weekday().await
    }

    pub async fn expiring_memberships(&self) -> Result<Vec<MembershipWithUser>, AppError> {
        let now = Utc::now();
        self.membership_service
            .expiring_within(now, now + Duration::days(EXPIRING_WINDOW_DAYS))
            .await
    }

    pub async fn revenue_summary(&self) -> Result<RevenueSummary, AppError> {
        let (total, count) = self.repo.paid_revenue_totals().await?;
        Ok(summarize_revenue(total, count))
    }

    pub async fn revenue_by_plan(&self) -> Result<Vec<PlanRevenueEntry>, AppError> {
        self.repo.revenue_by_plan().await
    }

    pub async fn mrr(&self) -> Result<MrrResponse, AppError> {
        let rows = self.repo.active_paid_memberships(Utc::now()).await?;
        let active_paid_count = rows.len() as i64;
        let mrr = rows
            .iter()
            .map(|(membership_type, price)| monthly_contribution(membership_type, *price))
            .sum();

        Ok(MrrResponse {
            mrr,
            active_paid_count,
        })
    }

    pub async fn churn(&self) -> Result<ChurnResponse, AppError> {
        let now = Utc::now();
        let window_start = now - Duration::days(CHURN_WINDOW_DAYS);
        let (expired, active) = self.repo.churn_counts(window_start, now).await?;

        Ok(ChurnResponse {
            churn_rate: churn_rate(expired, active),
            expired_last_30_days: expired,
            active_memberships: active,
        })
    }

    pub async fn revenue_last_30_days(&self) -> Result<TrailingRevenue, AppError> {
        let since = Utc::now() - Duration::days(TRAILING_WINDOW_DAYS);
        let (total, count) = self.repo.paid_revenue_since(since).await?;

        Ok(TrailingRevenue {
            total_revenue: total,
            memberships: count,
        })
    }

    pub async fn new_members_last_30_days(&self) -> Result<NewMembersEntry, AppError> {
        let since = Utc::now() - Duration::days(TRAILING_WINDOW_DAYS);
        let new_members = self.repo.new_members_since(since).await?;
        Ok(NewMembersEntry { new_members })
    }

    pub async fn revenue_forecast(&self) -> Result<RevenueForecast, AppError> {
        // Janela: os últimos 3 meses de calendário, contando o atual
        let now = Utc::now();
        let month_start = now
            .date_naive()
            .with_day(1)
            .and_then(|d| d.checked_sub_months(Months::new(FORECAST_MONTHS - 1)))
            .ok_or_else(|| anyhow::anyhow!("data fora do intervalo do calendário"))?;
        let since = Utc
            .from_local_datetime(&month_start.and_hms_opt(0, 0, 0).ok_or_else(|| {
                anyhow::anyhow!("meia-noite inválida para {month_start}")
            })?)
            .single()
            .ok_or_else(|| anyhow::anyhow!("instante UTC ambíguo"))?;

        let buckets: Vec<(String, f64)> = self
            .repo
            .monthly_revenue_since(since)
            .await?
            .into_iter()
            .filter_map(|row| match (row.month, row.total) {
                (Some(month), Some(total)) => total.to_f64().map(|t| (month, t)),
                _ => None,
            })
            .collect();

        let totals = fill_monthly_window(month_start, FORECAST_MONTHS, &buckets);
        Ok(forecast_revenue(&totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    use crate::{
        db::{MembershipRepository, UserRepository},
        models::{
            auth::Role,
            membership::{MembershipStatus, PaymentStatus},
        },
    };

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn empty_revenue_summary_is_all_zeros() {
        let summary = summarize_revenue(Decimal::ZERO, 0);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert_eq!(summary.paid_count, 0);
        assert_eq!(summary.avg_price, Decimal::ZERO);
    }

    #[test]
    fn revenue_summary_averages() {
        let summary = summarize_revenue(dec(90), 3);
        assert_eq!(summary.avg_price, dec(30));
    }

    #[test]
    fn mrr_normalizes_by_term_table() {
        // Mensal de 30 + anual de 300 = 30 + 25 = 55
        let monthly = monthly_contribution("monthly", dec(30));
        let annual = monthly_contribution("annual", dec(300));
        assert_eq!(monthly + annual, dec(55));

        assert_eq!(monthly_contribution("quarterly", dec(90)), dec(30));
    }

    #[test]
    fn unknown_plan_defaults_to_divisor_one() {
        assert_eq!(monthly_contribution("day-pass", dec(10)), dec(10));
    }

    #[test]
    fn churn_rate_handles_empty_denominator() {
        assert_eq!(churn_rate(0, 0), 0.0);
    }

    #[test]
    fn churn_rate_is_snapshot_ratio() {
        let rate = churn_rate(1, 3);
        assert!((rate - 0.25).abs() < 1e-12);
    }

    #[test]
    fn forecast_with_no_data_is_zero() {
        let f = forecast_revenue(&[]);
        assert_eq!(f.projected_next_month, 0.0);
        assert_eq!(f.growth_rate, 0.0);
        assert_eq!(f.months_used, 0);
    }

    #[test]
    fn forecast_with_single_month_carries_value_without_growth() {
        let f = forecast_revenue(&[120.0]);
        assert_eq!(f.projected_next_month, 120.0);
        assert_eq!(f.growth_rate, 0.0);
    }

    #[test]
    fn forecast_extends_linear_trend() {
        // 100, 110, 120 -> próximo mês 130, crescimento 10/110
        let f = forecast_revenue(&[100.0, 110.0, 120.0]);
        assert!((f.projected_next_month - 130.0).abs() < 1e-9);
        assert!((f.growth_rate - 10.0 / 110.0).abs() < 1e-9);
        assert_eq!(f.months_used, 3);
    }

    #[test]
    fn monthly_window_zero_fills_missing_months() {
        // Junho e agosto com receita, julho sem nenhuma matrícula paga
        let buckets = vec![
            ("2026-06".to_string(), 100.0),
            ("2026-08".to_string(), 120.0),
        ];
        let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(
            fill_monthly_window(start, 3, &buckets),
            vec![100.0, 0.0, 120.0]
        );
    }

    #[test]
    fn monthly_window_with_no_buckets_is_all_zeros() {
        let start = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        // A janela cruza a virada do ano
        assert_eq!(fill_monthly_window(start, 3, &[]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn forecast_never_projects_below_zero() {
        let f = forecast_revenue(&[100.0, 10.0]);
        assert_eq!(f.projected_next_month, 0.0);
        // Tendência de queda: crescimento zerado
        assert_eq!(f.growth_rate, 0.0);
    }

    // A janela do churn conta transições para expirado, não qualquer
    // UPDATE na linha: um acerto administrativo em matrícula expirada há
    // meses não a reinsere nos últimos 30 dias.
    #[sqlx::test]
    async fn churn_window_ignores_later_edits_to_old_expired_rows(pool: PgPool) {
        let user_repo = UserRepository::new(pool.clone());
        let client = user_repo
            .create_user("maria@gym.test", "Maria", "Silva", Role::Client, None, true, None, None)
            .await
            .unwrap();

        let membership_repo = MembershipRepository::new(pool.clone());
        let start = Utc::now() - Duration::days(120);
        let membership = membership_repo
            .insert(
                &pool,
                client.id,
                None,
                "monthly",
                dec(30),
                start,
                start + Duration::days(30),
                PaymentStatus::Paid,
                None,
            )
            .await
            .unwrap();

        // Expira e envelhece a transição para fora da janela de 30 dias
        membership_repo.expire_lapsed(Utc::now()).await.unwrap();
        sqlx::query("UPDATE memberships SET status_changed_at = $2 WHERE id = $1")
            .bind(membership.id)
            .bind(Utc::now() - Duration::days(60))
            .execute(&pool)
            .await
            .unwrap();

        // Acerto posterior do pagamento, sem mudança de status
        membership_repo
            .update(
                membership.id,
                "monthly",
                dec(30),
                start,
                start + Duration::days(30),
                PaymentStatus::Failed,
                MembershipStatus::Expired,
                None,
            )
            .await
            .unwrap();

        let repo = AnalyticsRepository::new(pool.clone());
        let (expired, active) = repo
            .churn_counts(Utc::now() - Duration::days(30), Utc::now())
            .await
            .unwrap();
        assert_eq!(expired, 0);
        assert_eq!(active, 0);
    }
}
