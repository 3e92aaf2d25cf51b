//! Quote status machine and client action kinds.
//!
//! ```text
//! draft ──publish──▶ published ──approve──▶ approved
//!                     │   ▲     ──reject───▶ rejected
//!                     └───┘ republish (rotates the access code)
//! ```
//!
//! `approved` and `rejected` are terminal.

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

/// All valid quote status values.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_DRAFT,
    STATUS_PUBLISHED,
    STATUS_APPROVED,
    STATUS_REJECTED,
];

pub const ACTION_VIEWED: &str = "viewed";
pub const ACTION_NOTED: &str = "noted";
pub const ACTION_APPROVED: &str = "approved";
pub const ACTION_REJECTED: &str = "rejected";

/// All valid client action values.
pub const VALID_ACTIONS: &[&str] = &[ACTION_VIEWED, ACTION_NOTED, ACTION_APPROVED, ACTION_REJECTED];

/// Maximum length of a client note.
pub const MAX_NOTE_LENGTH: usize = 4000;

/// Whether a quote in this status can no longer change.
pub fn is_terminal(status: &str) -> bool {
    status == STATUS_APPROVED || status == STATUS_REJECTED
}

/// Whether an administrator may still edit the quote's current version.
pub fn is_editable(status: &str) -> bool {
    !is_terminal(status)
}

/// Validate a status transition.
pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
    let allowed = matches!(
        (from, to),
        (STATUS_DRAFT, STATUS_PUBLISHED)
            | (STATUS_PUBLISHED, STATUS_PUBLISHED)
            | (STATUS_PUBLISHED, STATUS_APPROVED)
            | (STATUS_PUBLISHED, STATUS_REJECTED)
    );
    if allowed {
        Ok(())
    } else {
        Err(format!("Cannot move a quote from '{from}' to '{to}'"))
    }
}

/// Map a client request verb (`approve`, `reject`, `note`, `viewed`) to the
/// action recorded in the log.
pub fn action_for_request(request: &str) -> Option<&'static str> {
    match request {
        "approve" | ACTION_APPROVED => Some(ACTION_APPROVED),
        "reject" | ACTION_REJECTED => Some(ACTION_REJECTED),
        "note" | ACTION_NOTED => Some(ACTION_NOTED),
        "view" | ACTION_VIEWED => Some(ACTION_VIEWED),
        _ => None,
    }
}

/// The quote status a client action moves the quote to, if any.
pub fn status_after_action(action: &str) -> Option<&'static str> {
    match action {
        ACTION_APPROVED => Some(STATUS_APPROVED),
        ACTION_REJECTED => Some(STATUS_REJECTED),
        _ => None,
    }
}

/// Validate the fields of a client action before it is recorded.
///
/// Decisions must carry the client's name; notes must carry a note.
pub fn validate_client_action(
    action: &str,
    client_name: Option<&str>,
    note: Option<&str>,
) -> Result<(), String> {
    if !VALID_ACTIONS.contains(&action) {
        return Err(format!(
            "Invalid action '{action}'. Must be one of: approve, reject, note, viewed"
        ));
    }

    let has_name = client_name.is_some_and(|n| !n.trim().is_empty());
    if status_after_action(action).is_some() && !has_name {
        return Err("Your name is required to approve or reject a quote".to_string());
    }

    let note_text = note.map(str::trim).unwrap_or_default();
    if action == ACTION_NOTED && note_text.is_empty() {
        return Err("A note cannot be empty".to_string());
    }
    if note_text.len() > MAX_NOTE_LENGTH {
        return Err(format!("Notes are limited to {MAX_NOTE_LENGTH} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_from_draft_allowed() {
        assert!(validate_transition(STATUS_DRAFT, STATUS_PUBLISHED).is_ok());
    }

    #[test]
    fn republish_allowed() {
        assert!(validate_transition(STATUS_PUBLISHED, STATUS_PUBLISHED).is_ok());
    }

    #[test]
    fn decisions_only_from_published() {
        assert!(validate_transition(STATUS_PUBLISHED, STATUS_APPROVED).is_ok());
        assert!(validate_transition(STATUS_PUBLISHED, STATUS_REJECTED).is_ok());
        assert!(validate_transition(STATUS_DRAFT, STATUS_APPROVED).is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [STATUS_APPROVED, STATUS_REJECTED] {
            assert!(is_terminal(terminal));
            assert!(!is_editable(terminal));
            for to in VALID_STATUSES {
                assert!(validate_transition(terminal, to).is_err());
            }
        }
        assert!(is_editable(STATUS_DRAFT));
        assert!(is_editable(STATUS_PUBLISHED));
    }

    #[test]
    fn request_verbs_map_to_actions() {
        assert_eq!(action_for_request("approve"), Some(ACTION_APPROVED));
        assert_eq!(action_for_request("reject"), Some(ACTION_REJECTED));
        assert_eq!(action_for_request("note"), Some(ACTION_NOTED));
        assert_eq!(action_for_request("viewed"), Some(ACTION_VIEWED));
        assert_eq!(action_for_request("delete"), None);
    }

    #[test]
    fn only_decisions_change_status() {
        assert_eq!(status_after_action(ACTION_APPROVED), Some(STATUS_APPROVED));
        assert_eq!(status_after_action(ACTION_REJECTED), Some(STATUS_REJECTED));
        assert_eq!(status_after_action(ACTION_NOTED), None);
        assert_eq!(status_after_action(ACTION_VIEWED), None);
    }

    #[test]
    fn decision_requires_name() {
        let err = validate_client_action(ACTION_APPROVED, None, None).unwrap_err();
        assert!(err.contains("name is required"));
        assert!(validate_client_action(ACTION_REJECTED, Some("  "), None).is_err());
        assert!(validate_client_action(ACTION_APPROVED, Some("Dana"), None).is_ok());
    }

    #[test]
    fn note_requires_text() {
        assert!(validate_client_action(ACTION_NOTED, Some("Dana"), Some("")).is_err());
        assert!(validate_client_action(ACTION_NOTED, None, Some("Looks good")).is_ok());
    }

    #[test]
    fn overlong_note_rejected() {
        let long = "x".repeat(MAX_NOTE_LENGTH + 1);
        assert!(validate_client_action(ACTION_NOTED, None, Some(&long)).is_err());
    }

    #[test]
    fn view_needs_nothing() {
        assert!(validate_client_action(ACTION_VIEWED, None, None).is_ok());
    }
}
