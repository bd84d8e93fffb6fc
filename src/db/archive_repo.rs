// src/db/archive_repo.rs

use serde_json::Value;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::archive::{Archive, ArchiveKind},
};

#[derive(Clone)]
pub struct ArchiveRepository {
    pool: PgPool,
}

impl ArchiveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Insere o pacote do ano; (ano, tipo) é único, então re-executar o job
    // para o mesmo período é um no-op e devolve None.
    pub async fn insert_bundle(
        &self,
        year: i32,
        kind: ArchiveKind,
        data: &Value,
    ) -> Result<Option<Archive>, AppError> {
        let archive = sqlx::query_as::<_, Archive>(
            r#"
            INSERT INTO archives (year, kind, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (year, kind) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(year)
        .bind(kind)
        .bind(data)
        .fetch_optional(&self.pool)
        .await?;

        Ok(archive)
    }

    pub async fn exists(&self, year: i32, kind: ArchiveKind) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM archives WHERE year = $1 AND kind = $2",
        )
        .bind(year)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    // Política de retenção: pacotes com mais de dois anos são descartados
    pub async fn delete_older_than(&self, year: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM archives WHERE year <= $1")
            .bind(year)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
