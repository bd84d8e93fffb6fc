// src/handlers.rs

pub mod analytics;
pub mod auth;
pub mod checkins;
pub mod memberships;
pub mod plans;
pub mod users;
