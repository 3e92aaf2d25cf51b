//! Delivery status of deliverables and milestones.
//!
//! Tracks progress on the work itself. It never affects pricing and is
//! unrelated to the quote's own status.

pub const WORK_DRAFT: &str = "draft";
pub const WORK_PLANNED: &str = "planned";
pub const WORK_IN_PROGRESS: &str = "in_progress";
pub const WORK_COMPLETED: &str = "completed";
pub const WORK_CANCELLED: &str = "cancelled";

/// All valid work status values. Mirrored by the CHECK constraints on
/// `deliverables.status` and `milestones.status`.
pub const VALID_WORK_STATUSES: &[&str] = &[
    WORK_DRAFT,
    WORK_PLANNED,
    WORK_IN_PROGRESS,
    WORK_COMPLETED,
    WORK_CANCELLED,
];

pub fn validate_work_status(status: &str) -> Result<(), String> {
    if VALID_WORK_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_WORK_STATUSES.join(", ")
        ))
    }
}
