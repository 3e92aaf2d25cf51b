//! Repository layer: one zero-sized struct per table.
//!
//! Functions take any `PgExecutor`, so callers pass either `&PgPool` or
//! `&mut *tx` when a step must share a transaction with others.

pub mod access_code_repo;
pub mod client_action_repo;
pub mod deliverable_repo;
pub mod milestone_repo;
pub mod payment_event_repo;
pub mod project_repo;
pub mod quote_repo;
pub mod quote_version_repo;
pub mod user_repo;

pub use access_code_repo::AccessCodeRepo;
pub use client_action_repo::ClientActionRepo;
pub use deliverable_repo::DeliverableRepo;
pub use milestone_repo::MilestoneRepo;
pub use payment_event_repo::PaymentEventRepo;
pub use project_repo::ProjectRepo;
pub use quote_repo::QuoteRepo;
pub use quote_version_repo::QuoteVersionRepo;
pub use user_repo::UserRepo;
