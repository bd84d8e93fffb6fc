//src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::{auth_guard, maybe_auth_guard};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Tarefas de fundo: varredura diária de vencimentos e arquivamento anual
    app_state.maintenance_service.clone().spawn();

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/verify/{token}", get(handlers::auth::verify_email))
        .route("/forgot", post(handlers::auth::forgot_password))
        .route("/reset/{token}", post(handlers::auth::reset_password));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/{id}",
            axum::routing::put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Catálogo: leitura pública, escrita só para admin. A guarda leniente
    // anexa o usuário quando há token; o extrator de cargo barra o resto.
    let plan_routes = Router::new()
        .route(
            "/",
            get(handlers::plans::list_plans).post(handlers::plans::create_plan),
        )
        .route(
            "/{id}",
            get(handlers::plans::get_plan)
                .put(handlers::plans::update_plan)
                .delete(handlers::plans::delete_plan),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            maybe_auth_guard,
        ));

    let membership_routes = Router::new()
        .route(
            "/",
            post(handlers::memberships::create_membership)
                .get(handlers::memberships::list_memberships),
        )
        .route(
            "/{id}",
            axum::routing::put(handlers::memberships::update_membership)
                .delete(handlers::memberships::delete_membership),
        )
        .route("/{id}/cancel", post(handlers::memberships::cancel_membership))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Entrada e saída são públicas (totem); o token, quando presente, grava
    // o registrador. Listagem e remoção ficam atrás do extrator de cargo.
    let checkin_routes = Router::new()
        .route(
            "/",
            post(handlers::checkins::record_checkin).get(handlers::checkins::list_checkins),
        )
        .route("/{id}", axum::routing::delete(handlers::checkins::delete_checkin))
        .route("/{id}/checkout", post(handlers::checkins::checkout))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            maybe_auth_guard,
        ));

    let analytics_routes = Router::new()
        .route("/dashboard", get(handlers::analytics::dashboard))
        .route("/weekly-checkins", get(handlers::analytics::weekly_checkins))
        .route("/peak-hours", get(handlers::analytics::peak_hours))
        .route("/day-of-week", get(handlers::analytics::day_of_week))
        .route("/expiring", get(handlers::analytics::expiring))
        .route("/revenue", get(handlers::analytics::revenue))
        .route("/revenue-by-plan", get(handlers::analytics::revenue_by_plan))
        .route("/mrr", get(handlers::analytics::mrr))
        .route("/revenue-30d", get(handlers::analytics::revenue_30d))
        .route("/new-members-30d", get(handlers::analytics::new_members_30d))
        .route("/churn", get(handlers::analytics::churn))
        .route("/forecast", get(handlers::analytics::forecast))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/plans", plan_routes)
        .nest("/api/memberships", membership_routes)
        .nest("/api/checkins", checkin_routes)
        .nest("/api/analytics", analytics_routes)
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
