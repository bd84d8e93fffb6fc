// src/db/plan_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::plan::MembershipPlan};

#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<MembershipPlan>, AppError> {
        self.find_by_id(&self.pool, id).await
    }

    // Variante que aceita executor, para lookup dentro de uma transação
    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<MembershipPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, MembershipPlan>(
            "SELECT * FROM membership_plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(plan)
    }

    // Catálogo ordenado por sort_order e nome; filtro opcional por ativo
    pub async fn list(
        &self,
        active_only: Option<bool>,
    ) -> Result<Vec<MembershipPlan>, AppError> {
        let plans = sqlx::query_as::<_, MembershipPlan>(
            r#"
            SELECT * FROM membership_plans
            WHERE ($1::boolean IS NULL OR is_active = $1)
            ORDER BY sort_order ASC, name ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        price: Decimal,
        duration_days: i32,
        allowed_users: i32,
        sort_order: i32,
        created_by: Option<Uuid>,
    ) -> Result<MembershipPlan, AppError> {
        sqlx::query_as::<_, MembershipPlan>(
            r#"
            INSERT INTO membership_plans
                (name, description, price, duration_days, allowed_users, sort_order, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(duration_days)
        .bind(allowed_users)
        .bind(sort_order)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::PlanNameAlreadyExists;
                }
            }
            AppError::DatabaseError(e)
        })
    }

    // Atualização parcial; mudança de preço nunca toca snapshots de matrículas
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        price: Option<Decimal>,
        duration_days: Option<i32>,
        allowed_users: Option<i32>,
        is_active: Option<bool>,
        sort_order: Option<i32>,
        updated_by: Option<Uuid>,
    ) -> Result<Option<MembershipPlan>, AppError> {
        sqlx::query_as::<_, MembershipPlan>(
            r#"
            UPDATE membership_plans SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                duration_days = COALESCE($5, duration_days),
                allowed_users = COALESCE($6, allowed_users),
                is_active = COALESCE($7, is_active),
                sort_order = COALESCE($8, sort_order),
                updated_by = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(duration_days)
        .bind(allowed_users)
        .bind(is_active)
        .bind(sort_order)
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::PlanNameAlreadyExists;
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM membership_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Matrículas ativas ainda apontando para o plano bloqueiam a exclusão
    pub async fn count_active_memberships(&self, plan_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE plan_id = $1 AND status = 'active' AND deleted_at IS NULL
            "#,
        )
        .bind(plan_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
