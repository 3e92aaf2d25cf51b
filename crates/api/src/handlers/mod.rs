pub mod auth;
pub mod client;
pub mod deliverables;
pub mod milestones;
pub mod quotes;
pub mod versions;
pub mod webhooks;
