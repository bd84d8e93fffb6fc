// src/services/membership_service.rs
//
// O motor de ciclo de vida: criação/renovação, expiração, cancelamento e
// a invariante de no máximo uma matrícula ativa por usuário.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{MembershipRepository, PlanRepository, UserRepository},
    models::{
        auth::User,
        membership::{
            CreateMembershipPayload, Membership, MembershipStatus, MembershipTerm,
            MembershipWithUser, PaymentStatus, UpdateMembershipPayload, compute_end_date,
        },
        pagination::{Page, PaginationQuery},
    },
    services::notifier::{self, Notifier},
};

#[derive(Clone)]
pub struct MembershipService {
    repo: MembershipRepository,
    plan_repo: PlanRepository,
    user_repo: UserRepository,
    notifier: Arc<dyn Notifier>,
    pool: PgPool,
}

impl MembershipService {
    pub fn new(
        repo: MembershipRepository,
        plan_repo: PlanRepository,
        user_repo: UserRepository,
        notifier: Arc<dyn Notifier>,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            plan_repo,
            user_repo,
            notifier,
            pool,
        }
    }

    // Cria (ou renova, depois do vencimento) a matrícula de um usuário.
    //
    // Política: matrícula ativa duplicada é REJEITADA com conflito, nunca
    // substituída em silêncio. Matrículas vencidas que a varredura ainda
    // não pegou são expiradas dentro da mesma transação, para não
    // bloquearem uma renovação legítima.
    pub async fn create(
        &self,
        payload: CreateMembershipPayload,
        actor: &User,
    ) -> Result<Membership, AppError> {
        let now = Utc::now();

        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // Ou o plano do catálogo resolve tipo/preço/duração, ou o chamador
        // manda um termo explícito com preço.
        let (plan_id, membership_type, price, duration_days) = match payload.plan_id {
            Some(plan_id) => {
                let plan = self
                    .plan_repo
                    .get(plan_id)
                    .await?
                    .ok_or(AppError::PlanNotFound)?;
                if !plan.is_active {
                    return Err(AppError::PlanInactive);
                }
                (Some(plan.id), plan.name, plan.price, plan.duration_days)
            }
            None => {
                let membership_type = payload.membership_type.ok_or_else(|| {
                    AppError::InvalidInput("planId or membershipType is required".into())
                })?;
                if MembershipTerm::from_str(&membership_type).is_err() {
                    return Err(AppError::InvalidInput(
                        "membershipType must be one of monthly, quarterly, annual".into(),
                    ));
                }
                let price = payload.price.ok_or_else(|| {
                    AppError::InvalidInput("price is required with membershipType".into())
                })?;
                (None, membership_type, price, 0)
            }
        };

        if price < Decimal::ZERO {
            return Err(AppError::InvalidInput("Price cannot be negative".into()));
        }

        let start_date = payload.start_date.unwrap_or(now);
        let end_date = compute_end_date(start_date, &membership_type, i64::from(duration_days))
            .ok_or_else(|| AppError::InvalidInput("Invalid start date".into()))?;
        let payment_status = payload.payment_status.unwrap_or(PaymentStatus::Paid);

        let mut tx = self.pool.begin().await?;

        self.repo
            .expire_lapsed_for_user(&mut *tx, user.id, now)
            .await?;

        if let Some(current) = self.repo.find_active_for_user(&mut *tx, user.id).await? {
            return Err(AppError::ActiveMembershipExists {
                ends_at: current.end_date,
            });
        }

        let created = match self
            .repo
            .insert(
                &mut *tx,
                user.id,
                plan_id,
                &membership_type,
                price,
                start_date,
                end_date,
                payment_status,
                Some(actor.id),
            )
            .await
        {
            Ok(membership) => membership,
            // Corrida perdida no check-then-act: o índice parcial segura a
            // segunda linha ativa e a resposta vira o mesmo conflito.
            Err(AppError::DatabaseError(e))
                if e.as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation()) =>
            {
                let ends_at = self
                    .repo
                    .find_active_for_user(&self.pool, user.id)
                    .await?
                    .map(|m| m.end_date)
                    .unwrap_or(now);
                return Err(AppError::ActiveMembershipExists { ends_at });
            }
            Err(e) => return Err(e),
        };

        tx.commit().await?;

        Ok(created)
    }

    // Listagem com checagem lazy: vencidas viram expiradas antes da leitura
    pub async fn list(
        &self,
        query: &PaginationQuery,
    ) -> Result<Page<MembershipWithUser>, AppError> {
        self.expire_lapsed().await?;

        let items = self
            .repo
            .list_with_users(i64::from(query.limit()), query.offset())
            .await?;
        let total = self.repo.count_all().await?;

        Ok(Page::new(items, total, query))
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: UpdateMembershipPayload,
        actor: &User,
    ) -> Result<Membership, AppError> {
        let current = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::MembershipNotFound)?;

        if let Some(ref membership_type) = payload.membership_type {
            if MembershipTerm::from_str(membership_type).is_err() {
                return Err(AppError::InvalidInput(
                    "membershipType must be one of monthly, quarterly, annual".into(),
                ));
            }
        }

        if let Some(price) = payload.price {
            if price < Decimal::ZERO {
                return Err(AppError::InvalidInput("Price cannot be negative".into()));
            }
        }

        // Estados finais não voltam para ativo
        if payload.status == Some(MembershipStatus::Active)
            && current.status != MembershipStatus::Active
        {
            return Err(AppError::MembershipNotActive);
        }

        let membership_type = payload
            .membership_type
            .unwrap_or_else(|| current.membership_type.clone());
        let start_date = payload.start_date.unwrap_or(current.start_date);

        // end_date só é recalculada quando termo ou início mudam; fora
        // isso, a data derivada na criação permanece intocada.
        let end_date = if membership_type != current.membership_type
            || start_date != current.start_date
        {
            let fallback_days = self.duration_fallback_days(&current).await?;
            compute_end_date(start_date, &membership_type, fallback_days)
                .ok_or_else(|| AppError::InvalidInput("Invalid start date".into()))?
        } else {
            current.end_date
        };

        self.repo
            .update(
                id,
                &membership_type,
                payload.price.unwrap_or(current.price),
                start_date,
                end_date,
                payload.payment_status.unwrap_or(current.payment_status),
                payload.status.unwrap_or(current.status),
                Some(actor.id),
            )
            .await?
            .ok_or(AppError::MembershipNotFound)
    }

    pub async fn cancel(&self, id: Uuid, actor: &User) -> Result<Membership, AppError> {
        let current = self
            .repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::MembershipNotFound)?;

        if current.status != MembershipStatus::Active {
            return Err(AppError::MembershipNotActive);
        }

        // UPDATE condicional: se outra requisição cancelou/expirou antes,
        // nenhuma linha casa e o conflito é reportado.
        self.repo
            .cancel(id, Some(actor.id))
            .await?
            .ok_or(AppError::MembershipNotActive)
    }

    pub async fn delete(&self, id: Uuid, actor: &User) -> Result<(), AppError> {
        if !self.repo.soft_delete(id, actor.id).await? {
            return Err(AppError::MembershipNotFound);
        }
        Ok(())
    }

    /// Varredura de expiração. Idempotente: rodar duas vezes seguidas
    /// produz o mesmo estado final. Notificações são disparadas em
    /// background e nunca afetam o resultado.
    pub async fn expire_lapsed(&self) -> Result<u64, AppError> {
        let expired = self.repo.expire_lapsed(Utc::now()).await?;

        for membership in &expired {
            if let Some(user) = self.user_repo.find_by_id(membership.user_id).await? {
                notifier::dispatch(
                    self.notifier.clone(),
                    user.email.clone(),
                    "Membership Expired".to_string(),
                    format!(
                        "<p>Hi {},</p>\
                         <p>Your gym membership expired on <b>{}</b>.</p>\
                         <p>Please renew your membership to continue your training.</p>",
                        user.first_name,
                        membership.end_date.format("%Y-%m-%d")
                    ),
                );
            }
        }

        Ok(expired.len() as u64)
    }

    /// Snapshot de associação usado pelo motor de presença: existe
    /// matrícula ativa cujo prazo cobre `as_of`?
    pub async fn is_member(&self, user_id: Uuid, as_of: DateTime<Utc>) -> Result<bool, AppError> {
        let active = self.repo.find_active_for_user(&self.pool, user_id).await?;
        Ok(active.is_some_and(|m| m.is_active_at(as_of)))
    }

    pub async fn expiring_within(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MembershipWithUser>, AppError> {
        self.repo.expiring_between(from, to).await
    }

    // Termo desconhecido (plano custom) mantém a janela original em dias
    // quando o início muda.
    async fn duration_fallback_days(&self, current: &Membership) -> Result<i64, AppError> {
        if let Some(plan_id) = current.plan_id {
            if let Some(plan) = self.plan_repo.get(plan_id).await? {
                return Ok(i64::from(plan.duration_days));
            }
        }
        Ok((current.end_date - current.start_date).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::PgPool;

    use crate::{models::auth::Role, services::notifier::LogNotifier};

    async fn fixture(pool: &PgPool) -> (MembershipService, User, User) {
        let user_repo = UserRepository::new(pool.clone());
        let admin = user_repo
            .create_user("admin@gym.test", "Ana", "Souza", Role::Admin, None, true, None, None)
            .await
            .unwrap();
        let client = user_repo
            .create_user("maria@gym.test", "Maria", "Silva", Role::Client, None, true, None, None)
            .await
            .unwrap();

        let service = MembershipService::new(
            MembershipRepository::new(pool.clone()),
            PlanRepository::new(pool.clone()),
            user_repo,
            Arc::new(LogNotifier),
            pool.clone(),
        );

        (service, admin, client)
    }

    fn monthly_payload(email: &str, start: Option<DateTime<Utc>>) -> CreateMembershipPayload {
        CreateMembershipPayload {
            email: email.to_string(),
            plan_id: None,
            membership_type: Some("monthly".to_string()),
            price: Some(Decimal::from(30)),
            payment_status: None,
            start_date: start,
        }
    }

    #[sqlx::test]
    async fn second_active_membership_is_rejected_with_conflict(pool: PgPool) {
        let (service, admin, client) = fixture(&pool).await;

        service
            .create(monthly_payload(&client.email, None), &admin)
            .await
            .unwrap();

        let err = service
            .create(monthly_payload(&client.email, None), &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ActiveMembershipExists { .. }));
    }

    #[sqlx::test]
    async fn renewal_succeeds_after_previous_term_lapses(pool: PgPool) {
        let (service, admin, client) = fixture(&pool).await;

        // Termo mensal iniciado há dois meses: já venceu, mas a varredura
        // ainda não passou por ele
        let stale_start = Utc::now() - Duration::days(62);
        service
            .create(monthly_payload(&client.email, Some(stale_start)), &admin)
            .await
            .unwrap();

        let renewed = service
            .create(monthly_payload(&client.email, None), &admin)
            .await
            .unwrap();
        assert_eq!(renewed.status, MembershipStatus::Active);
    }

    #[sqlx::test]
    async fn expire_lapsed_runs_are_equivalent(pool: PgPool) {
        let (service, admin, client) = fixture(&pool).await;

        let stale_start = Utc::now() - Duration::days(62);
        service
            .create(monthly_payload(&client.email, Some(stale_start)), &admin)
            .await
            .unwrap();

        assert_eq!(service.expire_lapsed().await.unwrap(), 1);
        assert_eq!(service.expire_lapsed().await.unwrap(), 0);
    }
}
