// src/services/plan_service.rs

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PlanRepository,
    models::{
        auth::User,
        plan::{CreatePlanPayload, MembershipPlan, UpdatePlanPayload},
    },
};

#[derive(Clone)]
pub struct PlanService {
    repo: PlanRepository,
}

impl PlanService {
    pub fn new(repo: PlanRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, active_only: Option<bool>) -> Result<Vec<MembershipPlan>, AppError> {
        self.repo.list(active_only).await
    }

    pub async fn get(&self, id: Uuid) -> Result<MembershipPlan, AppError> {
        self.repo.get(id).await?.ok_or(AppError::PlanNotFound)
    }

    pub async fn create(
        &self,
        payload: CreatePlanPayload,
        actor: &User,
    ) -> Result<MembershipPlan, AppError> {
        if payload.price < Decimal::ZERO {
            return Err(AppError::InvalidInput("Price cannot be negative".into()));
        }

        self.repo
            .create(
                &payload.name,
                payload.description.as_deref(),
                payload.price,
                payload.duration_days,
                payload.allowed_users.unwrap_or(1),
                payload.sort_order.unwrap_or(0),
                Some(actor.id),
            )
            .await
    }

    // Mudanças no catálogo só valem para matrículas futuras; snapshots de
    // preço existentes nunca são retroativamente alterados.
    pub async fn update(
        &self,
        id: Uuid,
        payload: UpdatePlanPayload,
        actor: &User,
    ) -> Result<MembershipPlan, AppError> {
        if let Some(price) = payload.price {
            if price < Decimal::ZERO {
                return Err(AppError::InvalidInput("Price cannot be negative".into()));
            }
        }

        self.repo
            .update(
                id,
                payload.name.as_deref(),
                payload.description.as_deref(),
                payload.price,
                payload.duration_days,
                payload.allowed_users,
                payload.is_active,
                payload.sort_order,
                Some(actor.id),
            )
            .await?
            .ok_or(AppError::PlanNotFound)
    }

    // Plano referenciado por matrícula ativa não pode ser excluído;
    // desativar é o caminho.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.get(id).await?.ok_or(AppError::PlanNotFound)?;

        if self.repo.count_active_memberships(id).await? > 0 {
            return Err(AppError::PlanInUse);
        }

        if !self.repo.delete(id).await? {
            return Err(AppError::PlanNotFound);
        }
        Ok(())
    }
}
