//! Outbound notifications for quoteflow.
//!
//! - [`email`] -- rendering and SMTP delivery of access-code emails.
//!
//! Delivery never gates a state change: callers log and continue when a
//! send fails.

pub mod email;

pub use email::{AccessCodeEmail, EmailConfig, EmailError, Mailer, SmtpMailer};
