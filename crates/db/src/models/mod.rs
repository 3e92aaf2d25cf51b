//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod access_code;
pub mod client_action;
pub mod deliverable;
pub mod milestone;
pub mod payment_event;
pub mod project;
pub mod quote;
pub mod quote_version;
pub mod user;
