// src/db/membership_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::membership::{Membership, MembershipStatus, MembershipWithUser, PaymentStatus},
};

// Repositório do ciclo de vida de matrículas. As mutações que dependem da
// invariante "uma ativa por usuário" recebem um executor para rodar dentro
// da transação do serviço; o índice parcial do banco cobre a corrida.
#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Membership>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    // A matrícula ativa do usuário, se houver (o índice parcial garante <= 1)
    pub async fn find_active_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Membership>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT * FROM memberships
            WHERE user_id = $1 AND status = 'active' AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    // Expira matrículas do usuário cujo prazo já passou mas a varredura
    // ainda não alcançou; libera o índice parcial para uma renovação.
    pub async fn expire_lapsed_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET status = 'expired', status_changed_at = NOW(), updated_at = NOW()
            WHERE user_id = $1 AND status = 'active' AND end_date < $2
              AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        plan_id: Option<Uuid>,
        membership_type: &str,
        price: Decimal,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        payment_status: PaymentStatus,
        created_by: Option<Uuid>,
    ) -> Result<Membership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships
                (user_id, plan_id, membership_type, price, start_date, end_date,
                 payment_status, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .bind(membership_type)
        .bind(price)
        .bind(start_date)
        .bind(end_date)
        .bind(payment_status)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    // Varredura global: todas as ativas vencidas viram expiradas.
    // Idempotente; retorna as linhas afetadas para as notificações.
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<Vec<Membership>, AppError> {
        let expired = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET status = 'expired', status_changed_at = NOW(), updated_at = NOW()
            WHERE status = 'active' AND end_date < $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(expired)
    }

    pub async fn list_with_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MembershipWithUser>, AppError> {
        let memberships = sqlx::query_as::<_, MembershipWithUser>(
            r#"
            SELECT m.*,
                   u.email AS user_email,
                   u.first_name AS user_first_name,
                   u.last_name AS user_last_name
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.deleted_at IS NULL
            ORDER BY m.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    pub async fn count_all(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM memberships WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // Atualização explícita: o serviço já resolveu o que muda e recalculou
    // end_date quando termo/início mudaram.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        membership_type: &str,
        price: Decimal,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        payment_status: PaymentStatus,
        status: MembershipStatus,
        updated_by: Option<Uuid>,
    ) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships SET
                membership_type = $2,
                price = $3,
                start_date = $4,
                end_date = $5,
                payment_status = $6,
                status_changed_at = CASE
                    WHEN status IS DISTINCT FROM $7 THEN NOW()
                    ELSE status_changed_at
                END,
                status = $7,
                updated_by = $8,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(membership_type)
        .bind(price)
        .bind(start_date)
        .bind(end_date)
        .bind(payment_status)
        .bind(status)
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    // Só uma matrícula ativa pode ser cancelada; estados finais não voltam.
    pub async fn cancel(
        &self,
        id: Uuid,
        updated_by: Option<Uuid>,
    ) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET status = 'cancelled', status_changed_at = NOW(),
                updated_by = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active' AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    pub async fn soft_delete(&self, id: Uuid, deleted_by: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET deleted_at = NOW(), updated_by = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(deleted_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // Ativas vencendo na janela [from, to] (lembretes e painel)
    pub async fn expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MembershipWithUser>, AppError> {
        let memberships = sqlx::query_as::<_, MembershipWithUser>(
            r#"
            SELECT m.*,
                   u.email AS user_email,
                   u.first_name AS user_first_name,
                   u.last_name AS user_last_name
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.status = 'active'
              AND m.end_date >= $1 AND m.end_date <= $2
              AND m.deleted_at IS NULL
            ORDER BY m.end_date ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    // Matrículas encerradas até o corte (arquivamento anual)
    pub async fn ended_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Membership>, AppError> {
        let memberships = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE end_date <= $1 AND deleted_at IS NULL",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }
}
