// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{
        AnalyticsRepository, ArchiveRepository, CheckinRepository, MembershipRepository,
        PlanRepository, UserRepository,
    },
    services::{
        analytics_service::AnalyticsService,
        auth::AuthService,
        checkin_service::CheckinService,
        maintenance::MaintenanceService,
        membership_service::MembershipService,
        notifier::{LogNotifier, Notifier},
        plan_service::PlanService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub plan_service: PlanService,
    pub membership_service: MembershipService,
    pub checkin_service: CheckinService,
    pub analytics_service: AnalyticsService,
    pub maintenance_service: MaintenanceService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

        let user_repo = UserRepository::new(db_pool.clone());
        let plan_repo = PlanRepository::new(db_pool.clone());
        let membership_repo = MembershipRepository::new(db_pool.clone());
        let checkin_repo = CheckinRepository::new(db_pool.clone());
        let analytics_repo = AnalyticsRepository::new(db_pool.clone());
        let archive_repo = ArchiveRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            notifier.clone(),
            jwt_secret,
            base_url,
        );
        let plan_service = PlanService::new(plan_repo.clone());
        let membership_service = MembershipService::new(
            membership_repo.clone(),
            plan_repo,
            user_repo.clone(),
            notifier.clone(),
            db_pool.clone(),
        );
        let checkin_service = CheckinService::new(
            checkin_repo.clone(),
            user_repo.clone(),
            membership_service.clone(),
            db_pool.clone(),
        );
        let analytics_service = AnalyticsService::new(
            analytics_repo,
            membership_service.clone(),
            db_pool.clone(),
        );
        let maintenance_service = MaintenanceService::new(
            membership_service.clone(),
            membership_repo,
            checkin_repo,
            archive_repo,
            user_repo,
            notifier,
        );

        Ok(Self {
            db_pool,
            auth_service,
            plan_service,
            membership_service,
            checkin_service,
            analytics_service,
            maintenance_service,
        })
    }
}
