//! In-process principal store speaking the account statements.
//!
//! Understands `LIST USERS`, `CREATE USER`, `ALTER USER`, `DROP USER` and the
//! release-version probe, with the same error behavior Cassandra shows for
//! each. Every executed statement is recorded so callers can check what was
//! (and was not) sent.

use async_trait::async_trait;
use cql_user_core::{Error, PrincipalRecord, Result};
use itertools::Itertools;
use tokio::sync::Mutex;
use tracing::debug;

use crate::capabilities::RELEASE_VERSION_QUERY;
use crate::row::{CqlField, Row, RowSequence};
use crate::session::Gateway;
use crate::statement::{Consistency, Statement};

/// A statement as seen by [`InMemoryGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStatement {
    pub template: String,
    pub consistency: Consistency,
    pub mutating: bool,
}

#[derive(Debug, Clone)]
struct StoredPrincipal {
    name: String,
    password: String,
    is_superuser: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    principals: Vec<StoredPrincipal>,
    executed: Vec<ExecutedStatement>,
    fail_next: Option<String>,
    release_version: Option<String>,
}

/// [`Gateway`] backed by an in-memory principal table.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
}

impl InMemoryGateway {
    /// An empty store reporting release `4.1.0`.
    #[must_use]
    pub fn new() -> Self {
        let mut gateway = Self::default();
        gateway.state.get_mut().release_version = Some("4.1.0".to_string());
        gateway
    }

    /// Seed a principal.
    #[must_use]
    pub fn with_principal(
        mut self,
        name: impl Into<String>,
        password: impl Into<String>,
        is_superuser: bool,
    ) -> Self {
        self.state.get_mut().principals.push(StoredPrincipal {
            name: name.into(),
            password: password.into(),
            is_superuser,
        });
        self
    }

    /// Report `version` from the release probe, or no row at all for `None`.
    #[must_use]
    pub fn with_release_version(mut self, version: Option<&str>) -> Self {
        self.state.get_mut().release_version = version.map(str::to_string);
        self
    }

    /// Make the next statement fail with `reason`.
    pub async fn fail_next(&self, reason: impl Into<String>) {
        self.state.lock().await.fail_next = Some(reason.into());
    }

    /// Whether `name` can log in with `password`.
    pub async fn authenticate(&self, name: &str, password: &str) -> bool {
        self.state
            .lock()
            .await
            .principals
            .iter()
            .any(|p| p.name == name && p.password == password)
    }

    /// Current principals, in creation order.
    pub async fn principals(&self) -> Vec<PrincipalRecord> {
        self.state
            .lock()
            .await
            .principals
            .iter()
            .map(|p| PrincipalRecord::new(p.name.clone(), p.is_superuser))
            .collect()
    }

    /// Every statement executed so far.
    pub async fn executed(&self) -> Vec<ExecutedStatement> {
        self.state.lock().await.executed.clone()
    }

    /// Statements that changed (or tried to change) the principal table.
    pub async fn mutations(&self) -> Vec<ExecutedStatement> {
        self.executed()
            .await
            .into_iter()
            .filter(|s| s.mutating)
            .collect()
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn execute(&self, statement: &Statement) -> Result<RowSequence> {
        // Same binding rules as the real session.
        statement.render()?;

        let template = statement.template();
        let tokens = template.split_whitespace().collect_vec();
        let command = tokens.iter().take(2).join(" ");
        let mutating = matches!(
            command.as_str(),
            "CREATE USER" | "ALTER USER" | "DROP USER"
        );

        let mut state = self.state.lock().await;
        state.executed.push(ExecutedStatement {
            template: template.to_string(),
            consistency: statement.consistency(),
            mutating,
        });

        if let Some(reason) = state.fail_next.take() {
            return Err(Error::execution_failed(template, reason));
        }

        debug!(statement = %template, "In-memory execute");

        let params = statement.params();
        let name = params.first().map(String::as_str);
        let superuser = match tokens.last() {
            Some(&"SUPERUSER") => Some(true),
            Some(&"NOSUPERUSER") => Some(false),
            _ => None,
        };

        match (command.as_str(), name) {
            ("LIST USERS", _) => Ok(list_users(&state.principals)),
            _ if template == RELEASE_VERSION_QUERY => Ok(release_rows(state.release_version.as_deref())),
            ("CREATE USER", Some(name)) => {
                if state.principals.iter().any(|p| p.name == name) {
                    return Err(Error::execution_failed(
                        template,
                        format!("User {name} already exists"),
                    ));
                }
                state.principals.push(StoredPrincipal {
                    name: name.to_string(),
                    password: params.get(1).cloned().unwrap_or_default(),
                    is_superuser: superuser.unwrap_or(false),
                });
                Ok(RowSequence::empty())
            }
            ("ALTER USER", Some(name)) => {
                let new_password = template
                    .contains("WITH PASSWORD")
                    .then(|| params.get(1).cloned())
                    .flatten();
                let principal = state
                    .principals
                    .iter_mut()
                    .find(|p| p.name == name)
                    .ok_or_else(|| {
                        Error::execution_failed(template, format!("User {name} doesn't exist"))
                    })?;
                if let Some(password) = new_password {
                    principal.password = password;
                }
                if let Some(flag) = superuser {
                    principal.is_superuser = flag;
                }
                Ok(RowSequence::empty())
            }
            ("DROP USER", Some(name)) => {
                let existed = state.principals.iter().any(|p| p.name == name);
                if !existed && !template.contains("IF EXISTS") {
                    return Err(Error::execution_failed(
                        template,
                        format!("User {name} doesn't exist"),
                    ));
                }
                state.principals.retain(|p| p.name != name);
                Ok(RowSequence::empty())
            }
            _ => Err(Error::execution_failed(template, "unsupported statement")),
        }
    }
}

fn list_users(principals: &[StoredPrincipal]) -> RowSequence {
    RowSequence::from_rows(
        principals
            .iter()
            .map(|p| {
                Row::default()
                    .with("name", CqlField::Text(p.name.clone()))
                    .with("super", CqlField::Boolean(p.is_superuser))
            })
            .collect(),
    )
}

fn release_rows(version: Option<&str>) -> RowSequence {
    version.map_or_else(RowSequence::empty, |version| {
        RowSequence::from_rows(vec![
            Row::default().with("release_version", CqlField::Text(version.to_string())),
        ])
    })
}
