pub mod analytics;
pub mod archive;
pub mod auth;
pub mod checkin;
pub mod membership;
pub mod pagination;
pub mod plan;
