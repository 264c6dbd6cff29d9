//! CLI definition using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use cql_user_core::{PasswordPolicy, Presence, PrincipalRequest, Result};
use cql_user_gateway::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT};
use cql_user_gateway::{Credentials, GatewayConfig, ProtocolVersion};

/// cql-user - converge one Cassandra login onto its desired state
#[derive(Parser, Debug, Clone)]
#[command(name = "cql-user")]
#[command(version)]
#[command(about = "Create, update or remove a Cassandra user so it matches the requested state")]
#[command(
    long_about = "Creates, updates or removes a single Cassandra user. Prints one JSON object \
    describing what changed and exits non-zero on failure."
)]
pub struct Cli {
    /// Login used to connect
    #[arg(long, env = "CQL_USER_DB_USER")]
    pub db_user: Option<String>,

    /// Password for --db-user
    #[arg(long, env = "CQL_USER_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Contact point host
    #[arg(long, env = "CQL_USER_DB_HOST", default_value = DEFAULT_HOST)]
    pub db_host: String,

    /// Native transport port
    #[arg(long, env = "CQL_USER_DB_PORT", default_value_t = DEFAULT_PORT)]
    pub db_port: u16,

    /// Native protocol version, 1-4
    #[arg(
        long,
        env = "CQL_USER_PROTOCOL_VERSION",
        default_value_t = ProtocolVersion::DEFAULT.get(),
        value_parser = clap::value_parser!(u8).range(1..=4)
    )]
    pub protocol_version: u8,

    /// Connection timeout in seconds
    #[arg(
        long,
        env = "CQL_USER_CONNECT_TIMEOUT",
        default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs()
    )]
    pub connect_timeout: u64,

    /// Name of the user to manage
    #[arg(long)]
    pub name: String,

    /// Password to set
    #[arg(long, env = "CQL_USER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Whether the user is a superuser (yes/no, true/false, on/off, 1/0)
    #[arg(
        long,
        action = ArgAction::Set,
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub superuser: bool,

    /// Whether the user should exist
    #[arg(long, default_value = "present", value_parser = ["present", "absent"])]
    pub state: String,

    /// Rewrite the password on every run, or only when creating the user
    #[arg(long, default_value = "always", value_parser = ["always", "on_create"])]
    pub update_password: String,

    /// Report what would change without changing it
    #[arg(long, default_value_t = false)]
    pub check: bool,
}

impl Cli {
    /// The desired state described by the arguments.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name or an unknown choice.
    pub fn request(&self) -> Result<PrincipalRequest> {
        Ok(PrincipalRequest::new(self.name.as_str())?
            .with_optional_password(self.password.clone())
            .superuser(self.superuser)
            .presence(self.state.parse::<Presence>()?)
            .password_policy(self.update_password.parse::<PasswordPolicy>()?))
    }

    /// Connection settings for the gateway.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a half-set login or a protocol version
    /// outside 1-4.
    pub fn gateway_config(&self) -> Result<GatewayConfig> {
        let config = GatewayConfig::default()
            .host(self.db_host.as_str())
            .port(self.db_port)
            .protocol_version(ProtocolVersion::new(self.protocol_version)?)
            .connect_timeout(Duration::from_secs(self.connect_timeout));

        Ok(
            match Credentials::from_parts(self.db_user.clone(), self.db_password.clone())? {
                Some(credentials) => config.credentials(credentials),
                None => config,
            },
        )
    }
}
