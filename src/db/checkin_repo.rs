// src/db/checkin_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::checkin::Checkin};

#[derive(Clone)]
pub struct CheckinRepository {
    pool: PgPool,
}

impl CheckinRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Checkin>, AppError> {
        let checkin = sqlx::query_as::<_, Checkin>("SELECT * FROM checkins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(checkin)
    }

    // Sessão aberta casando com QUALQUER um dos campos de identidade. A
    // mesma pessoa física pode aparecer por id, por e-mail ou só pelo nome
    // cadastrado na portaria; todas contam como a mesma sessão.
    pub async fn find_open_session<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<Checkin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let checkin = sqlx::query_as::<_, Checkin>(
            r#"
            SELECT * FROM checkins
            WHERE checkout_time IS NULL
              AND (
                    ($1::uuid IS NOT NULL AND user_id = $1)
                 OR ($2::text IS NOT NULL AND LOWER(email) = LOWER($2))
                 OR ($3::text IS NOT NULL AND LOWER(name) = LOWER($3))
              )
            ORDER BY checkin_time ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(checkin)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        name: Option<&str>,
        email: Option<&str>,
        is_member: bool,
        created_by: Option<Uuid>,
    ) -> Result<Checkin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let checkin = sqlx::query_as::<_, Checkin>(
            r#"
            INSERT INTO checkins (user_id, name, email, is_member, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(is_member)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(checkin)
    }

    // UPDATE condicional: só fecha se ainda estiver aberta. O perdedor de
    // uma corrida de checkout recebe zero linhas, nunca sobrescreve.
    pub async fn close(&self, id: Uuid) -> Result<Option<Checkin>, AppError> {
        let checkin = sqlx::query_as::<_, Checkin>(
            r#"
            UPDATE checkins
            SET checkout_time = NOW(), updated_at = NOW()
            WHERE id = $1 AND checkout_time IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(checkin)
    }

    pub async fn list(
        &self,
        open: Option<bool>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Checkin>, AppError> {
        let checkins = sqlx::query_as::<_, Checkin>(
            r#"
            SELECT * FROM checkins
            WHERE ($1::boolean IS NULL
                   OR ($1 = TRUE AND checkout_time IS NULL)
                   OR ($1 = FALSE AND checkout_time IS NOT NULL))
              AND ($2::timestamptz IS NULL OR checkin_time >= $2)
              AND ($3::timestamptz IS NULL OR checkin_time <= $3)
            ORDER BY checkin_time DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(open)
        .bind(from)
        .bind(to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkins)
    }

    pub async fn count(
        &self,
        open: Option<bool>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM checkins
            WHERE ($1::boolean IS NULL
                   OR ($1 = TRUE AND checkout_time IS NULL)
                   OR ($1 = FALSE AND checkout_time IS NOT NULL))
              AND ($2::timestamptz IS NULL OR checkin_time >= $2)
              AND ($3::timestamptz IS NULL OR checkin_time <= $3)
            "#,
        )
        .bind(open)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM checkins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Visitas antigas para o arquivamento anual
    pub async fn before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Checkin>, AppError> {
        let checkins = sqlx::query_as::<_, Checkin>(
            "SELECT * FROM checkins WHERE checkin_time <= $1",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkins)
    }
}
