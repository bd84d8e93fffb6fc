pub mod analytics_service;
pub mod auth;
pub mod checkin_service;
pub mod maintenance;
pub mod membership_service;
pub mod notifier;
pub mod plan_service;
