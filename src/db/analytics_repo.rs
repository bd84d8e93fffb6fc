// src/db/analytics_repo.rs
//
// Leituras agregadas sobre matrículas e check-ins. Nenhuma mutação aqui;
// todo o bucketing de data/hora é feito em UTC.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::analytics::{
        DailyCheckinEntry, DashboardStats, HourlyCheckinEntry, MonthlyRevenueRow,
        PlanRevenueEntry, WeekdayCheckinEntry,
    },
};

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Os contadores do painel saem de uma transação só (snapshot consistente)
    pub async fn dashboard_stats<'e, E>(
        &self,
        executor: E,
        now: DateTime<Utc>,
    ) -> Result<DashboardStats, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let total_users = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL",
        )
        .fetch_one(&mut *tx)
        .await?;

        let total_memberships = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM memberships WHERE deleted_at IS NULL",
        )
        .fetch_one(&mut *tx)
        .await?;

        let total_checkins = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM checkins")
            .fetch_one(&mut *tx)
            .await?;

        let active_memberships = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE status = 'active' AND end_date >= $1 AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardStats {
            total_users,
            total_memberships,
            total_checkins,
            active_memberships,
        })
    }

    // Check-ins por dia de calendário desde `since`
    pub async fn checkins_per_day(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCheckinEntry>, AppError> {
        let data = sqlx::query_as::<_, DailyCheckinEntry>(
            r#"
            SELECT to_char(checkin_time AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS date,
                   COUNT(*) AS total
            FROM checkins
            WHERE checkin_time >= $1
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // Distribuição por hora do dia (horários de pico)
    pub async fn checkins_per_hour(&self) -> Result<Vec<HourlyCheckinEntry>, AppError> {
        let data = sqlx::query_as::<_, HourlyCheckinEntry>(
            r#"
            SELECT EXTRACT(HOUR FROM checkin_time AT TIME ZONE 'UTC')::int AS hour,
                   COUNT(*) AS total
            FROM checkins
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // Distribuição por dia da semana (0 = domingo)
    pub async fn checkins_per_weekday(&self) -> Result<Vec<WeekdayCheckinEntry>, AppError> {
        let data = sqlx::query_as::<_, WeekdayCheckinEntry>(
            r#"
            SELECT EXTRACT(DOW FROM checkin_time AT TIME ZONE 'UTC')::int AS weekday,
                   COUNT(*) AS total
            FROM checkins
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // (total pago, quantidade) sobre todas as matrículas pagas
    pub async fn paid_revenue_totals(&self) -> Result<(Decimal, i64), AppError> {
        let row = sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(price), 0), COUNT(*)
            FROM memberships
            WHERE payment_status = 'paid' AND deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn revenue_by_plan(&self) -> Result<Vec<PlanRevenueEntry>, AppError> {
        let data = sqlx::query_as::<_, PlanRevenueEntry>(
            r#"
            SELECT membership_type,
                   SUM(price) AS total_revenue,
                   COUNT(*) AS memberships
            FROM memberships
            WHERE payment_status = 'paid' AND deleted_at IS NULL
            GROUP BY membership_type
            ORDER BY total_revenue DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // Pares (tipo, preço) das matrículas ativas e pagas; o serviço aplica
    // a tabela de divisores do MRR.
    pub async fn active_paid_memberships(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, Decimal)>, AppError> {
        let rows = sqlx::query_as::<_, (String, Decimal)>(
            r#"
            SELECT membership_type, price
            FROM memberships
            WHERE status = 'active' AND end_date >= $1
              AND payment_status = 'paid' AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // Contadores do churn: expiradas na janela móvel x ativas agora.
    // status_changed_at marca a transição para expirado (varredura ou
    // checagem lazy); edições administrativas posteriores não entram.
    pub async fn churn_counts(
        &self,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(i64, i64), AppError> {
        let expired = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE status = 'expired' AND status_changed_at >= $1
              AND deleted_at IS NULL
            "#,
        )
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        let active = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE status = 'active' AND end_date >= $1 AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok((expired, active))
    }

    // (total pago, quantidade) de matrículas criadas desde `since`
    pub async fn paid_revenue_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<(Decimal, i64), AppError> {
        let row = sqlx::query_as::<_, (Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(price), 0), COUNT(*)
            FROM memberships
            WHERE payment_status = 'paid' AND created_at >= $1 AND deleted_at IS NULL
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn new_members_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM memberships WHERE created_at >= $1 AND deleted_at IS NULL",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // Receita paga por mês de calendário (YYYY-MM) desde `since`
    pub async fn monthly_revenue_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthlyRevenueRow>, AppError> {
        let data = sqlx::query_as::<_, MonthlyRevenueRow>(
            r#"
            SELECT to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM') AS month,
                   SUM(price) AS total
            FROM memberships
            WHERE payment_status = 'paid' AND created_at >= $1 AND deleted_at IS NULL
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }
}
