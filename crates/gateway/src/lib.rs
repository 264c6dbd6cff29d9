//! Session gateway for cql-user.
//!
//! Opens one connection to one contact point and executes statements at an
//! explicit consistency level:
//!
//! - [`CassandraSession`]: the `scylla`-backed session
//! - [`Gateway`]: the execute seam the reconciler depends on
//! - [`InMemoryGateway`]: an in-process principal table behind the same seam
//! - [`ServerCapabilities`]: what the connected server supports, probed once
//!
//! # Example
//!
//! ```ignore
//! use cql_user_gateway::{CassandraSession, Gateway, GatewayConfig, Statement};
//!
//! let session = CassandraSession::connect(&GatewayConfig::default()).await?;
//! let users = session.execute(&Statement::new("LIST USERS")).await;
//! session.close();
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod capabilities;
pub mod config;
pub mod memory;
pub mod row;
pub mod session;
pub mod statement;

pub use capabilities::ServerCapabilities;
pub use config::{Credentials, GatewayConfig, ProtocolVersion};
pub use memory::{ExecutedStatement, InMemoryGateway};
pub use row::{CqlField, Row, RowSequence};
pub use session::{CassandraSession, Gateway};
pub use statement::{Consistency, Statement, quote_literal};
