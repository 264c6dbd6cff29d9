//! Desired-vs-actual reconciliation for a single Cassandra login.
//!
//! - **Desired State**: a [`cql_user_core::PrincipalRequest`]
//! - **Actual State**: the principals `LIST USERS` reports
//! - **Diff**: at most one [`ReconcileAction`]
//! - **Action**: exactly one statement, issued through a
//!   [`cql_user_gateway::Gateway`]
//!
//! # Actions
//!
//! | found | presence | policy      | action                                     |
//! |-------|----------|-------------|--------------------------------------------|
//! | no    | present  | any         | `CreateUser` ("User created")               |
//! | no    | absent   | any         | none                                       |
//! | yes   | absent   | any         | `DropUser` ("User deleted")                 |
//! | yes   | present  | `always`    | `AlterPasswordAndSuperuser`                |
//! | yes   | present  | `on_create` | `SetSuperuser` if the flag differs         |
//!
//! Under `always` an existing principal is reported as changed on every run:
//! the store cannot say whether the new password equals the old one. This is
//! expected behavior.
//!
//! # Example
//!
//! ```ignore
//! use cql_user_core::PrincipalRequest;
//! use cql_user_gateway::{InMemoryGateway, ServerCapabilities};
//! use cql_user_reconciler::ReconcilerBuilder;
//!
//! let gateway = InMemoryGateway::new();
//! let reconciler = ReconcilerBuilder::new()
//!     .with_capabilities(ServerCapabilities::default())
//!     .build()?;
//! let request = PrincipalRequest::new("testuser")?.with_password("test");
//! let result = reconciler.run(&gateway, &request).await;
//! assert!(result.changed);
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod reconciler;
pub mod types;

// Re-export main types
pub use reconciler::{Reconciler, ReconcilerBuilder, ReconcilerConfig};
pub use types::{
    LIST_USERS, Message, ObservedPrincipals, ReconcileAction, ReconciliationResult,
    superuser_keyword,
};
