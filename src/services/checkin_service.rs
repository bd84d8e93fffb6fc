// src/services/checkin_service.rs
//
// Motor de presença: registra entradas e saídas e congela o snapshot de
// associação no momento da entrada.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CheckinRepository, UserRepository},
    models::{
        auth::User,
        checkin::{Checkin, CheckinListQuery, CheckinPayload},
        pagination::{Page, PaginationQuery},
    },
    services::membership_service::MembershipService,
};

#[derive(Clone)]
pub struct CheckinService {
    repo: CheckinRepository,
    user_repo: UserRepository,
    membership_service: MembershipService,
    pool: PgPool,
}

impl CheckinService {
    pub fn new(
        repo: CheckinRepository,
        user_repo: UserRepository,
        membership_service: MembershipService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            user_repo,
            membership_service,
            pool,
        }
    }

    // Registra uma visita. A busca por sessão aberta cobre todos os campos
    // pelos quais a pessoa é conhecida (id, e-mail, nome), para que um
    // cadastrado não entre de novo como walk-in com outro registro.
    pub async fn record_checkin(
        &self,
        payload: CheckinPayload,
        actor: Option<&User>,
    ) -> Result<Checkin, AppError> {
        if !payload.has_identity() {
            return Err(AppError::InvalidInput("email or name is required".into()));
        }

        let now = Utc::now();

        // Resolve o usuário cadastrado, se a identidade permitir
        let user = match payload.user_id {
            Some(id) => Some(
                self.user_repo
                    .find_by_id(id)
                    .await?
                    .ok_or(AppError::UserNotFound)?,
            ),
            None => match payload.email.as_deref() {
                Some(email) => self.user_repo.find_by_email(email).await?,
                None => None,
            },
        };

        // Identidade efetiva gravada no evento (snapshot denormalizado)
        let user_id = user.as_ref().map(|u| u.id);
        let email = payload
            .email
            .clone()
            .or_else(|| user.as_ref().map(|u| u.email.clone()));
        let name = payload
            .name
            .clone()
            .or_else(|| user.as_ref().map(|u| u.full_name()));

        // Snapshot: calculado uma vez na entrada, nunca recalculado depois
        let is_member = match user_id {
            Some(id) => self.membership_service.is_member(id, now).await?,
            None => false,
        };

        let mut tx = self.pool.begin().await?;

        if let Some(open) = self
            .repo
            .find_open_session(&mut *tx, user_id, email.as_deref(), name.as_deref())
            .await?
        {
            return Err(AppError::AlreadyCheckedIn {
                since: open.checkin_time,
            });
        }

        let created = match self
            .repo
            .insert(
                &mut *tx,
                user_id,
                name.as_deref(),
                email.as_deref(),
                is_member,
                actor.map(|a| a.id),
            )
            .await
        {
            Ok(checkin) => checkin,
            // O índice parcial de sessão aberta decide a corrida
            Err(AppError::DatabaseError(e))
                if e.as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation()) =>
            {
                let since = self
                    .repo
                    .find_open_session(&self.pool, user_id, email.as_deref(), name.as_deref())
                    .await?
                    .map(|open| open.checkin_time)
                    .unwrap_or(now);
                return Err(AppError::AlreadyCheckedIn { since });
            }
            Err(e) => return Err(e),
        };

        tx.commit().await?;

        Ok(created)
    }

    pub async fn checkout(&self, id: Uuid) -> Result<Checkin, AppError> {
        match self.repo.close(id).await? {
            Some(checkin) => Ok(checkin),
            // Nenhuma linha fechada: já encerrado ou inexistente
            None => match self.repo.find_by_id(id).await? {
                Some(_) => Err(AppError::AlreadyCheckedOut),
                None => Err(AppError::CheckinNotFound),
            },
        }
    }

    pub async fn list(&self, query: CheckinListQuery) -> Result<Page<Checkin>, AppError> {
        let pagination = PaginationQuery {
            page: query.page,
            limit: query.limit,
        };

        let items = self
            .repo
            .list(
                query.open,
                query.from,
                query.to,
                i64::from(pagination.limit()),
                pagination.offset(),
            )
            .await?;
        let total = self.repo.count(query.open, query.from, query.to).await?;

        Ok(Page::new(items, total, &pagination))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::CheckinNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sqlx::PgPool;

    use crate::{
        db::{MembershipRepository, PlanRepository},
        services::notifier::LogNotifier,
    };

    fn service(pool: &PgPool) -> CheckinService {
        let membership_service = MembershipService::new(
            MembershipRepository::new(pool.clone()),
            PlanRepository::new(pool.clone()),
            UserRepository::new(pool.clone()),
            Arc::new(LogNotifier),
            pool.clone(),
        );
        CheckinService::new(
            CheckinRepository::new(pool.clone()),
            UserRepository::new(pool.clone()),
            membership_service,
            pool.clone(),
        )
    }

    fn walkin(name: &str) -> CheckinPayload {
        CheckinPayload {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[sqlx::test]
    async fn open_session_blocks_a_second_checkin(pool: PgPool) {
        let svc = service(&pool);

        svc.record_checkin(walkin("Maria Silva"), None).await.unwrap();

        // Capitalização diferente é a mesma identidade
        let err = svc
            .record_checkin(walkin("maria silva"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedIn { .. }));
    }

    #[sqlx::test]
    async fn checkout_frees_the_identity_for_a_new_visit(pool: PgPool) {
        let svc = service(&pool);

        let first = svc.record_checkin(walkin("Maria Silva"), None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let closed = svc.checkout(first.id).await.unwrap();
        assert!(closed.checkout_time.is_some());

        let second = svc.record_checkin(walkin("Maria Silva"), None).await.unwrap();
        assert_ne!(second.id, first.id);
        assert!(second.checkout_time.is_none());
    }

    #[sqlx::test]
    async fn closed_session_cannot_be_closed_again(pool: PgPool) {
        let svc = service(&pool);

        let visit = svc.record_checkin(walkin("Maria Silva"), None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        svc.checkout(visit.id).await.unwrap();

        let err = svc.checkout(visit.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedOut));
    }
}
