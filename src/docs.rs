// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Plans ---
        handlers::plans::list_plans,
        handlers::plans::get_plan,
        handlers::plans::create_plan,
        handlers::plans::update_plan,
        handlers::plans::delete_plan,

        // --- Memberships ---
        handlers::memberships::create_membership,
        handlers::memberships::list_memberships,
        handlers::memberships::update_membership,
        handlers::memberships::cancel_membership,
        handlers::memberships::delete_membership,

        // --- Checkins ---
        handlers::checkins::record_checkin,
        handlers::checkins::checkout,
        handlers::checkins::list_checkins,
        handlers::checkins::delete_checkin,

        // --- Analytics ---
        handlers::analytics::dashboard,
        handlers::analytics::weekly_checkins,
        handlers::analytics::peak_hours,
        handlers::analytics::day_of_week,
        handlers::analytics::expiring,
        handlers::analytics::revenue,
        handlers::analytics::revenue_by_plan,
        handlers::analytics::mrr,
        handlers::analytics::revenue_30d,
        handlers::analytics::new_members_30d,
        handlers::analytics::churn,
        handlers::analytics::forecast,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::LoginUserPayload,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthResponse,
            models::auth::AuthUserSummary,

            // --- Plans ---
            models::plan::MembershipPlan,
            models::plan::CreatePlanPayload,
            models::plan::UpdatePlanPayload,

            // --- Memberships ---
            models::membership::PaymentStatus,
            models::membership::MembershipStatus,
            models::membership::Membership,
            models::membership::MembershipWithUser,
            models::membership::CreateMembershipPayload,
            models::membership::UpdateMembershipPayload,

            // --- Checkins ---
            models::checkin::Checkin,
            models::checkin::CheckinPayload,
            models::checkin::CheckinResponse,

            // --- Analytics ---
            models::analytics::DashboardStats,
            models::analytics::DailyCheckinEntry,
            models::analytics::HourlyCheckinEntry,
            models::analytics::WeekdayCheckinEntry,
            models::analytics::RevenueSummary,
            models::analytics::PlanRevenueEntry,
            models::analytics::MrrResponse,
            models::analytics::ChurnResponse,
            models::analytics::TrailingRevenue,
            models::analytics::NewMembersEntry,
            models::analytics::RevenueForecast,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, verificação de e-mail e senha"),
        (name = "Users", description = "Gestão de usuários (equipe)"),
        (name = "Plans", description = "Catálogo de planos de matrícula"),
        (name = "Memberships", description = "Ciclo de vida das matrículas"),
        (name = "Checkins", description = "Registro de entrada e saída"),
        (name = "Analytics", description = "Indicadores e relatórios gerenciais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
