//! The session gateway: one authenticated connection, one execute operation.

use async_trait::async_trait;
use cql_user_core::{Error, Result};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::errors::{
    ConnectionError, ConnectionPoolError, ConnectionSetupRequestErrorKind, DbError, MetadataError,
    NewSessionError,
};
use scylla::statement::Consistency as DriverConsistency;
use scylla::statement::unprepared::Statement as DriverStatement;
use scylla::value::{CqlValue, Row as DriverRow};
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::row::{CqlField, Row, RowSequence};
use crate::statement::{Consistency, Statement};

/// Statement execution against a cluster.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Execute `statement` at its consistency level.
    ///
    /// # Errors
    ///
    /// Returns an execution error wrapping the driver's cause.
    async fn execute(&self, statement: &Statement) -> Result<RowSequence>;
}

/// A live connection to one contact point.
///
/// Released by [`CassandraSession::close`], which consumes the session, or by
/// dropping it.
pub struct CassandraSession {
    session: Session,
    contact_point: String,
}

impl CassandraSession {
    /// Connects to the contact point in `config`.
    ///
    /// Without credentials no authenticator is offered; whether the cluster
    /// accepts that is for the cluster to decide.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if the login is rejected, and a
    /// connection error if no node is reachable.
    pub async fn connect(config: &GatewayConfig) -> Result<Self> {
        let contact_point = config.contact_point();
        debug!(
            contact_point = %contact_point,
            protocol_version = config.protocol_version.get(),
            authenticated = config.credentials.is_some(),
            "Connecting to cluster"
        );

        let mut builder = SessionBuilder::new()
            .known_node(&contact_point)
            .connection_timeout(config.connect_timeout);

        if let Some(credentials) = &config.credentials {
            builder = builder.user(credentials.username.as_str(), credentials.password());
        }

        let session = builder
            .build()
            .await
            .map_err(|e| connect_error(&contact_point, &e))?;

        info!(contact_point = %contact_point, "Connected to cluster");

        Ok(Self {
            session,
            contact_point,
        })
    }

    #[must_use]
    pub fn contact_point(&self) -> &str {
        &self.contact_point
    }

    /// Release the connection.
    pub fn close(self) {
        debug!(contact_point = %self.contact_point, "Closing session");
        drop(self.session);
    }
}

#[async_trait]
impl Gateway for CassandraSession {
    async fn execute(&self, statement: &Statement) -> Result<RowSequence> {
        let template = statement.template();
        debug!(
            statement = %template,
            consistency = ?statement.consistency(),
            "Executing statement"
        );

        let mut query = DriverStatement::new(statement.render()?);
        query.set_consistency(driver_consistency(statement.consistency()));

        let result = self
            .session
            .query_unpaged(query, ())
            .await
            .map_err(|e| Error::execution_failed(template, e.to_string()))?;

        if !result.is_rows() {
            return Ok(RowSequence::empty());
        }

        let rows_result = result
            .into_rows_result()
            .map_err(|e| Error::unexpected_rows(template, e.to_string()))?;

        let names: Vec<String> = rows_result
            .column_specs()
            .iter()
            .map(|spec| spec.name().to_owned())
            .collect();

        let rows = rows_result
            .rows::<DriverRow>()
            .map_err(|e| Error::unexpected_rows(template, e.to_string()))?
            .map(|row| {
                row.map(|row| convert_row(&names, row))
                    .map_err(|e| Error::unexpected_rows(template, e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(statement = %template, rows = rows.len(), "Statement returned rows");
        Ok(RowSequence::from_rows(rows))
    }
}

fn convert_row(names: &[String], row: DriverRow) -> Row {
    Row::new(
        names
            .iter()
            .cloned()
            .zip(row.columns.into_iter().map(convert_value))
            .collect(),
    )
}

fn convert_value(value: Option<CqlValue>) -> CqlField {
    match value {
        None => CqlField::Null,
        Some(CqlValue::Text(text) | CqlValue::Ascii(text)) => CqlField::Text(text),
        Some(CqlValue::Boolean(flag)) => CqlField::Boolean(flag),
        Some(other) => CqlField::Other(format!("{other:?}")),
    }
}

const fn driver_consistency(consistency: Consistency) -> DriverConsistency {
    match consistency {
        Consistency::One => DriverConsistency::One,
        Consistency::Two => DriverConsistency::Two,
        Consistency::Three => DriverConsistency::Three,
        Consistency::Quorum => DriverConsistency::Quorum,
        Consistency::All => DriverConsistency::All,
        Consistency::LocalQuorum => DriverConsistency::LocalQuorum,
        Consistency::EachQuorum => DriverConsistency::EachQuorum,
        Consistency::LocalOne => DriverConsistency::LocalOne,
    }
}

/// Split driver connect failures into rejected logins and unreachable clusters.
///
/// The typed setup failure decides when the driver exposes one; otherwise
/// the message does.
fn connect_error(contact_point: &str, error: &NewSessionError) -> Error {
    let message = error.to_string();
    match setup_failure(error) {
        Some(kind) if is_auth_rejection(kind) => {
            Error::authentication_failed(contact_point, message)
        }
        Some(_) => Error::connection_failed(contact_point, message),
        None => classify_connect_error(contact_point, &message),
    }
}

/// The setup request failure behind a broken control connection, if any.
fn setup_failure(error: &NewSessionError) -> Option<&ConnectionSetupRequestErrorKind> {
    match error {
        NewSessionError::MetadataError(MetadataError::ConnectionPoolError(
            ConnectionPoolError::Broken {
                last_connection_error: ConnectionError::ConnectionSetupRequestError(setup),
                ..
            },
        )) => Some(setup.get_error()),
        _ => None,
    }
}

const fn is_auth_rejection(kind: &ConnectionSetupRequestErrorKind) -> bool {
    matches!(
        kind,
        ConnectionSetupRequestErrorKind::DbError(DbError::AuthenticationError, _)
            | ConnectionSetupRequestErrorKind::MissingAuthentication
            | ConnectionSetupRequestErrorKind::StartAuthSessionError(_)
            | ConnectionSetupRequestErrorKind::AuthChallengeEvaluationError(_)
            | ConnectionSetupRequestErrorKind::AuthFinishError(_)
    )
}

fn classify_connect_error(contact_point: &str, message: &str) -> Error {
    let lowered = message.to_lowercase();
    let rejected = ["authenticat", "credentials", "password", "unauthorized"]
        .iter()
        .any(|marker| lowered.contains(marker));

    if rejected {
        Error::authentication_failed(contact_point, message)
    } else {
        Error::connection_failed(contact_point, message)
    }
}

#[cfg(test)]
mod tests {
    use cql_user_core::ErrorKind;

    use super::*;

    #[test]
    fn test_bad_credentials_classified_as_authentication() {
        let err = classify_connect_error(
            "localhost:9042",
            "Authentication failed: Provided username cassandra and/or password are incorrect",
        );
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_refused_classified_as_connection() {
        let err = classify_connect_error(
            "localhost:9042",
            "Could not connect to any known node: Connection refused (os error 111)",
        );
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("localhost:9042"));
    }

    #[test]
    fn test_typed_auth_rejections() {
        assert!(is_auth_rejection(
            &ConnectionSetupRequestErrorKind::MissingAuthentication
        ));
        assert!(is_auth_rejection(&ConnectionSetupRequestErrorKind::DbError(
            DbError::AuthenticationError,
            "Provided username cassandra and/or password are incorrect".into(),
        )));
        assert!(!is_auth_rejection(
            &ConnectionSetupRequestErrorKind::UnableToAllocStreamId
        ));
    }

    #[test]
    fn test_untyped_session_error_falls_back_to_message() {
        let err = connect_error("localhost:9042", &NewSessionError::EmptyKnownNodesList);
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("Empty known nodes list"));
    }

    #[test]
    fn test_convert_value() {
        assert_eq!(
            convert_value(Some(CqlValue::Text("cassandra".into()))),
            CqlField::Text("cassandra".into())
        );
        assert_eq!(
            convert_value(Some(CqlValue::Boolean(true))),
            CqlField::Boolean(true)
        );
        assert_eq!(convert_value(None), CqlField::Null);
        assert!(matches!(
            convert_value(Some(CqlValue::Int(3))),
            CqlField::Other(_)
        ));
    }

    #[test]
    fn test_convert_row_pairs_names() {
        let names = vec!["name".to_string(), "super".to_string()];
        let row = convert_row(
            &names,
            DriverRow {
                columns: vec![
                    Some(CqlValue::Text("testuser".into())),
                    Some(CqlValue::Boolean(false)),
                ],
            },
        );
        assert_eq!(row.text("name"), Some("testuser"));
        assert_eq!(row.boolean("super"), Some(false));
    }
}
