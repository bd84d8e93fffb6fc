pub mod user_repo;
pub use user_repo::UserRepository;
pub mod plan_repo;
pub use plan_repo::PlanRepository;
pub mod membership_repo;
pub use membership_repo::MembershipRepository;
pub mod checkin_repo;
pub use checkin_repo::CheckinRepository;
pub mod analytics_repo;
pub use analytics_repo::AnalyticsRepository;
pub mod archive_repo;
pub use archive_repo::ArchiveRepository;
