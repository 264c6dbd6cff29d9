//! Core types for the reconciler.

use std::fmt;

use cql_user_core::{Error, ErrorKind, PrincipalRecord, PrincipalRequest, Result};
use cql_user_gateway::{RowSequence, Statement};
use serde::{Serialize, Serializer};

/// Enumerates every login known to the cluster.
pub const LIST_USERS: &str = "LIST USERS";

const PASSWORD_REQUIRED: &str = "Password is required in order to change password";

/// Summary of the action taken. Downstream automation matches these verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    UserCreated,
    UserDeleted,
    PasswordUpdated,
    PasswordAndSuperuserUpdated,
    SuperuserChanged,
}

impl Message {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserCreated => "User created",
            Self::UserDeleted => "User deleted",
            Self::PasswordUpdated => "Password updated",
            Self::PasswordAndSuperuserUpdated => "Password and/or superuser status updated",
            Self::SuperuserChanged => "Superuser status changed",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// `SUPERUSER` or `NOSUPERUSER`; there is no third rendering.
#[must_use]
pub const fn superuser_keyword(is_superuser: bool) -> &'static str {
    if is_superuser { "SUPERUSER" } else { "NOSUPERUSER" }
}

/// Actual state: every principal the cluster listed, in listing order.
///
/// Lookups scan linearly; account tables are administrative-scale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedPrincipals {
    records: Vec<PrincipalRecord>,
}

impl ObservedPrincipals {
    /// Build from the rows of [`LIST_USERS`] (`name`, `super`, extra columns ignored).
    ///
    /// # Errors
    ///
    /// Returns an execution error if a row lacks either column.
    pub fn from_rows(rows: RowSequence) -> Result<Self> {
        let records = rows
            .map(|row| -> Result<PrincipalRecord> {
                let name = row.text("name").ok_or_else(|| {
                    Error::unexpected_rows(LIST_USERS, "missing text column 'name'")
                })?;
                let is_superuser = row.boolean("super").ok_or_else(|| {
                    Error::unexpected_rows(LIST_USERS, "missing boolean column 'super'")
                })?;
                Ok(PrincipalRecord::new(name, is_superuser))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// First record named `name`; the store keeps names unique.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PrincipalRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Number of records named `name`.
    #[must_use]
    pub fn count_named(&self, name: &str) -> usize {
        self.records.iter().filter(|r| r.name == name).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The single corrective statement the reconciler can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// `CREATE USER` with password and superuser flag.
    CreateUser { is_superuser: bool },
    /// `ALTER USER` rewriting password and superuser flag together.
    AlterPasswordAndSuperuser { is_superuser: bool },
    /// `ALTER USER` rewriting only the password (own login).
    AlterPassword,
    /// `ALTER USER` toggling the superuser flag.
    SetSuperuser { is_superuser: bool },
    /// `DROP USER`, tolerant of a concurrent removal when `if_exists`.
    DropUser { if_exists: bool },
}

impl ReconcileAction {
    /// The statement implementing this action for `request`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the action sets a password and the
    /// request carries none.
    pub fn statement(&self, request: &PrincipalRequest) -> Result<Statement> {
        let name = request.name();
        let statement = match *self {
            Self::CreateUser { is_superuser } => Statement::new(format!(
                "CREATE USER ? WITH PASSWORD ? {}",
                superuser_keyword(is_superuser)
            ))
            .bind(name)
            .bind(request.require_password(PASSWORD_REQUIRED)?.expose()),
            Self::AlterPasswordAndSuperuser { is_superuser } => Statement::new(format!(
                "ALTER USER ? WITH PASSWORD ? {}",
                superuser_keyword(is_superuser)
            ))
            .bind(name)
            .bind(request.require_password(PASSWORD_REQUIRED)?.expose()),
            Self::AlterPassword => Statement::new("ALTER USER ? WITH PASSWORD ?")
                .bind(name)
                .bind(request.require_password(PASSWORD_REQUIRED)?.expose()),
            Self::SetSuperuser { is_superuser } => {
                Statement::new(format!("ALTER USER ? {}", superuser_keyword(is_superuser)))
                    .bind(name)
            }
            Self::DropUser { if_exists: true } => Statement::new("DROP USER IF EXISTS ?").bind(name),
            Self::DropUser { if_exists: false } => Statement::new("DROP USER ?").bind(name),
        };
        Ok(statement)
    }

    #[must_use]
    pub const fn message(&self) -> Message {
        match self {
            Self::CreateUser { .. } => Message::UserCreated,
            Self::AlterPasswordAndSuperuser { .. } => Message::PasswordAndSuperuserUpdated,
            Self::AlterPassword => Message::PasswordUpdated,
            Self::SetSuperuser { .. } => Message::SuperuserChanged,
            Self::DropUser { .. } => Message::UserDeleted,
        }
    }

    /// Get a description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::CreateUser { is_superuser } => {
                format!("create user ({})", superuser_keyword(*is_superuser))
            }
            Self::AlterPasswordAndSuperuser { is_superuser } => {
                format!("update password and superuser ({})", superuser_keyword(*is_superuser))
            }
            Self::AlterPassword => "update password".to_string(),
            Self::SetSuperuser { is_superuser } => {
                format!("set {}", superuser_keyword(*is_superuser))
            }
            Self::DropUser { .. } => "drop user".to_string(),
        }
    }
}

/// Outcome of one reconciliation, as reported to the caller.
///
/// `changed == false` means no mutating statement was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub changed: bool,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReconciliationResult {
    /// Nothing to do.
    pub fn unchanged(name: impl Into<String>) -> Self {
        Self {
            changed: false,
            name: name.into(),
            message: None,
            error_kind: None,
            error: None,
        }
    }

    /// An action was applied (or would be, in check mode).
    pub fn changed(name: impl Into<String>, message: Message) -> Self {
        Self {
            changed: true,
            name: name.into(),
            message: Some(message),
            error_kind: None,
            error: None,
        }
    }

    /// The run failed with `error`.
    pub fn failed(name: impl Into<String>, error: &Error) -> Self {
        Self {
            changed: false,
            name: name.into(),
            message: None,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error_kind.is_some()
    }
}

#[cfg(test)]
mod tests {
    use cql_user_gateway::{CqlField, Row};

    use super::*;

    #[test]
    fn test_messages_verbatim() {
        assert_eq!(Message::UserCreated.as_str(), "User created");
        assert_eq!(Message::UserDeleted.as_str(), "User deleted");
        assert_eq!(Message::PasswordUpdated.as_str(), "Password updated");
        assert_eq!(
            Message::PasswordAndSuperuserUpdated.as_str(),
            "Password and/or superuser status updated"
        );
        assert_eq!(Message::SuperuserChanged.as_str(), "Superuser status changed");
    }

    #[test]
    fn test_superuser_keyword() {
        assert_eq!(superuser_keyword(true), "SUPERUSER");
        assert_eq!(superuser_keyword(false), "NOSUPERUSER");
    }

    #[test]
    fn test_observed_from_rows_ignores_extra_columns() -> Result<()> {
        let rows = RowSequence::from_rows(vec![
            Row::default()
                .with("name", CqlField::Text("cassandra".into()))
                .with("super", CqlField::Boolean(true))
                .with("datacenters", CqlField::Text("ALL".into())),
        ]);
        let observed = ObservedPrincipals::from_rows(rows)?;
        assert_eq!(observed.len(), 1);
        assert_eq!(
            observed.find("cassandra"),
            Some(&PrincipalRecord::new("cassandra", true))
        );
        Ok(())
    }

    #[test]
    fn test_observed_from_rows_rejects_missing_super() {
        let rows = RowSequence::from_rows(vec![
            Row::default().with("name", CqlField::Text("cassandra".into())),
        ]);
        let err = ObservedPrincipals::from_rows(rows).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Execution));
    }

    #[test]
    fn test_create_statement_binds_name_and_password() -> Result<()> {
        let request = PrincipalRequest::new("testuser")?.with_password("test");
        let statement = ReconcileAction::CreateUser { is_superuser: false }.statement(&request)?;
        assert_eq!(statement.template(), "CREATE USER ? WITH PASSWORD ? NOSUPERUSER");
        assert_eq!(statement.params(), ["testuser".to_string(), "test".to_string()]);
        Ok(())
    }

    #[test]
    fn test_drop_statement_variants() -> Result<()> {
        let request = PrincipalRequest::new("testuser")?;
        let tolerant = ReconcileAction::DropUser { if_exists: true }.statement(&request)?;
        let plain = ReconcileAction::DropUser { if_exists: false }.statement(&request)?;
        assert_eq!(tolerant.template(), "DROP USER IF EXISTS ?");
        assert_eq!(plain.template(), "DROP USER ?");
        Ok(())
    }

    #[test]
    fn test_result_serialization_omits_empty_fields() -> std::result::Result<(), serde_json::Error> {
        let json = serde_json::to_value(ReconciliationResult::unchanged("testuser"))?;
        assert_eq!(json, serde_json::json!({"changed": false, "name": "testuser"}));

        let json = serde_json::to_value(ReconciliationResult::changed(
            "testuser",
            Message::UserCreated,
        ))?;
        assert_eq!(
            json,
            serde_json::json!({"changed": true, "name": "testuser", "message": "User created"})
        );
        Ok(())
    }

    #[test]
    fn test_failed_result_carries_kind() {
        let result = ReconciliationResult::failed("testuser", &Error::validation("nope"));
        assert!(result.is_failure());
        assert!(!result.changed);
        assert_eq!(result.error.as_deref(), Some("nope"));
    }
}
