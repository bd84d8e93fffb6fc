// src/services/maintenance.rs
//
// Varreduras periódicas: expiração de matrículas vencidas, lembretes e o
// arquivamento anual. Rodam em tasks próprias, desacopladas das
// requisições, e são seguras para re-execução no mesmo período.

use std::sync::Arc;

use chrono::{Datelike, Duration, TimeZone, Utc};

use crate::{
    common::error::AppError,
    db::{ArchiveRepository, CheckinRepository, MembershipRepository, UserRepository},
    models::archive::ArchiveKind,
    services::{
        membership_service::MembershipService,
        notifier::{self, Notifier},
    },
};

const DAILY_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);
const EXPIRY_REMINDER_DAYS: i64 = 30;
const UNVERIFIED_REMINDER_MONTHS: i32 = 11;
const ARCHIVE_RETENTION_YEARS: i32 = 2;

#[derive(Clone)]
pub struct MaintenanceService {
    membership_service: MembershipService,
    membership_repo: MembershipRepository,
    checkin_repo: CheckinRepository,
    archive_repo: ArchiveRepository,
    user_repo: UserRepository,
    notifier: Arc<dyn Notifier>,
}

impl MaintenanceService {
    pub fn new(
        membership_service: MembershipService,
        membership_repo: MembershipRepository,
        checkin_repo: CheckinRepository,
        archive_repo: ArchiveRepository,
        user_repo: UserRepository,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            membership_service,
            membership_repo,
            checkin_repo,
            archive_repo,
            user_repo,
            notifier,
        }
    }

    // Dispara os loops em background. Erros de uma rodada são logados e a
    // próxima rodada tenta de novo; nada aqui propaga para requisições.
    pub fn spawn(self) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(DAILY_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_daily().await {
                    tracing::error!("🔥 Falha na varredura diária: {}", e);
                }
                if let Err(e) = self.run_yearly_archival().await {
                    tracing::error!("🔥 Falha no arquivamento anual: {}", e);
                }
            }
        });
    }

    /// Rodada diária: expira vencidas e manda os lembretes. Idempotente —
    /// rodar duas vezes no mesmo dia não muda o estado final.
    pub async fn run_daily(&self) -> Result<(), AppError> {
        tracing::info!("Rodando a varredura diária de manutenção...");

        let expired = self.membership_service.expire_lapsed().await?;
        if expired > 0 {
            tracing::info!("{} matrículas expiradas pela varredura", expired);
        }

        let now = Utc::now();

        // Lembrete de vencimento próximo
        let expiring = self
            .membership_service
            .expiring_within(now, now + Duration::days(EXPIRY_REMINDER_DAYS))
            .await?;
        for m in &expiring {
            notifier::dispatch(
                self.notifier.clone(),
                m.user_email.clone(),
                "Membership Expiry Reminder".to_string(),
                format!(
                    "<p>Hi {},</p>\
                     <p>Your gym membership is expiring soon on <b>{}</b>.</p>\
                     <p>Please renew your membership to continue your training.</p>",
                    m.user_first_name,
                    m.membership.end_date.format("%Y-%m-%d")
                ),
            );
        }

        // Aviso de arquivamento para contas nunca verificadas
        let cutoff = now
            .checked_sub_months(chrono::Months::new(UNVERIFIED_REMINDER_MONTHS as u32))
            .unwrap_or(now);
        let stale_accounts = self.user_repo.list_unverified_before(cutoff).await?;
        for user in &stale_accounts {
            notifier::dispatch(
                self.notifier.clone(),
                user.email.clone(),
                "Account Archival Reminder".to_string(),
                format!(
                    "<p>Hi {},</p>\
                     <p>Your account will be archived soon due to inactivity.</p>\
                     <p>Please log in or verify your email to keep it active.</p>",
                    user.first_name
                ),
            );
        }

        tracing::info!(
            "Varredura diária concluída: {} lembretes de vencimento, {} avisos de conta",
            expiring.len(),
            stale_accounts.len()
        );
        Ok(())
    }

    /// Arquiva o ano anterior em pacotes (ano, tipo) e aplica a retenção.
    /// Os dois pacotes são gravados SEMPRE, mesmo vazios: as linhas
    /// (ano, tipo) são o marcador de que o ano foi processado, e o índice
    /// único torna a re-execução (inclusive o tick diário seguinte) um
    /// no-op. Devolve `true` quando esta chamada efetivamente arquivou.
    pub async fn run_yearly_archival(&self) -> Result<bool, AppError> {
        let now = Utc::now();
        let last_year = now.year() - 1;

        let already_done = self
            .archive_repo
            .exists(last_year, ArchiveKind::Membership)
            .await?
            && self.archive_repo.exists(last_year, ArchiveKind::Checkin).await?;
        if already_done {
            return Ok(false);
        }

        tracing::info!("Arquivando dados do ano {}...", last_year);

        let cutoff = Utc
            .with_ymd_and_hms(last_year, 12, 31, 23, 59, 59)
            .single()
            .ok_or_else(|| anyhow::anyhow!("corte de arquivamento inválido para {last_year}"))?;

        let old_memberships = self.membership_repo.ended_before(cutoff).await?;
        let old_checkins = self.checkin_repo.before(cutoff).await?;

        let membership_data = serde_json::to_value(&old_memberships)
            .map_err(|e| anyhow::anyhow!("serialização do arquivo de matrículas: {e}"))?;
        let checkin_data = serde_json::to_value(&old_checkins)
            .map_err(|e| anyhow::anyhow!("serialização do arquivo de check-ins: {e}"))?;

        let archived_memberships = self
            .archive_repo
            .insert_bundle(last_year, ArchiveKind::Membership, &membership_data)
            .await?;
        let archived_checkins = self
            .archive_repo
            .insert_bundle(last_year, ArchiveKind::Checkin, &checkin_data)
            .await?;

        // Outra instância venceu a corrida: nada a notificar daqui
        if archived_memberships.is_none() && archived_checkins.is_none() {
            return Ok(false);
        }

        tracing::info!(
            "Arquivadas {} matrículas e {} check-ins de {}",
            old_memberships.len(),
            old_checkins.len(),
            last_year
        );

        // Avisa a equipe administrativa
        let staff = self.user_repo.list_staff().await?;
        for admin in &staff {
            notifier::dispatch(
                self.notifier.clone(),
                admin.email.clone(),
                format!("InkedInLIFT Data Archived for {last_year}"),
                format!(
                    "<p>Data from {last_year} has been archived successfully.</p>\
                     <p>Memberships: {}<br>Check-ins: {}</p>",
                    old_memberships.len(),
                    old_checkins.len()
                ),
            );
        }

        // Retenção: pacotes com mais de dois anos são descartados
        let pruned = self
            .archive_repo
            .delete_older_than(now.year() - ARCHIVE_RETENTION_YEARS)
            .await?;
        if pruned > 0 {
            tracing::info!("🧹 {} pacotes de arquivo antigos removidos", pruned);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    use crate::db::PlanRepository;
    use crate::services::notifier::LogNotifier;

    fn service(pool: &PgPool) -> MaintenanceService {
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let membership_service = MembershipService::new(
            MembershipRepository::new(pool.clone()),
            PlanRepository::new(pool.clone()),
            UserRepository::new(pool.clone()),
            notifier.clone(),
            pool.clone(),
        );
        MaintenanceService::new(
            membership_service,
            MembershipRepository::new(pool.clone()),
            CheckinRepository::new(pool.clone()),
            ArchiveRepository::new(pool.clone()),
            UserRepository::new(pool.clone()),
            notifier,
        )
    }

    // Ano sem registros: os marcadores entram mesmo assim e o tick diário
    // seguinte vira no-op em vez de rearquivar e renotificar.
    #[sqlx::test]
    async fn yearly_archival_on_empty_year_marks_the_year_once(pool: PgPool) {
        let svc = service(&pool);
        let last_year = Utc::now().year() - 1;

        assert!(svc.run_yearly_archival().await.unwrap());

        let archive_repo = ArchiveRepository::new(pool.clone());
        assert!(archive_repo
            .exists(last_year, ArchiveKind::Membership)
            .await
            .unwrap());
        assert!(archive_repo
            .exists(last_year, ArchiveKind::Checkin)
            .await
            .unwrap());

        assert!(!svc.run_yearly_archival().await.unwrap());
        assert!(!svc.run_yearly_archival().await.unwrap());
    }
}
