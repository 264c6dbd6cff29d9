//! Shared types for cql-user.
//!
//! - [`PrincipalRequest`]: what a login should look like
//! - [`PrincipalRecord`]: what the cluster reports
//! - [`Error`] / [`ErrorKind`]: the failure taxonomy surfaced to callers

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod error;
pub mod principal;

pub use error::{Error, ErrorKind, Result};
pub use principal::{Password, PasswordPolicy, Presence, PrincipalRecord, PrincipalRequest};
