//! Back-office sign-in: [`password`] storage and [`jwt`] bearer tokens.

pub mod jwt;
pub mod password;
