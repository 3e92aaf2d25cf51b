//! Quoteflow domain logic.
//!
//! Everything in this crate is free of I/O so it can be exercised directly
//! by unit tests and shared by the database and API layers.

pub mod access_code;
pub mod error;
pub mod hashing;
pub mod pricing;
pub mod quote_status;
pub mod rate_limit;
pub mod roles;
pub mod session;
pub mod types;
pub mod versioning;
pub mod webhook;
pub mod work_status;
