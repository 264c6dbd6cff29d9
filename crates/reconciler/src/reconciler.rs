//! Reconciler implementation.

use cql_user_core::{Error, PasswordPolicy, Presence, PrincipalRecord, PrincipalRequest, Result};
use cql_user_gateway::{Gateway, ServerCapabilities, Statement};
use tracing::{debug, info, warn};

use crate::types::{LIST_USERS, ObservedPrincipals, ReconcileAction, ReconciliationResult};

const PASSWORD_REQUIRED_CREATE: &str = "Password is required in order to create a user";
const PASSWORD_REQUIRED_CHANGE: &str = "Password is required in order to change password";
const OWN_SUPERUSER_STATUS: &str = "Cannot change the superuser status of the connected user";

/// Configuration for the reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    /// What the connected server supports.
    pub capabilities: ServerCapabilities,
    /// Login the gateway is connected as, if any.
    pub login: Option<String>,
    /// Report the action without issuing it.
    pub check_mode: bool,
}

/// Converges one principal onto its requested state.
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler.
    #[must_use]
    pub const fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Enumerate the principals the cluster currently knows.
    ///
    /// # Errors
    ///
    /// Returns the gateway's execution error, or an execution error if the
    /// listing lacks the expected columns.
    pub async fn observe(&self, gateway: &dyn Gateway) -> Result<ObservedPrincipals> {
        let rows = gateway.execute(&Statement::new(LIST_USERS)).await?;
        ObservedPrincipals::from_rows(rows)
    }

    /// Core reconciliation: observe, diff, and apply at most one action.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the request lacks a password the
    /// chosen action needs, and execution errors from the gateway.
    pub async fn reconcile(
        &self,
        gateway: &dyn Gateway,
        request: &PrincipalRequest,
    ) -> Result<ReconciliationResult> {
        info!(
            name = %request.name(),
            presence = %request.desired_presence(),
            password_policy = %request.desired_password_policy(),
            superuser = request.is_superuser(),
            "Starting reconciliation"
        );

        let observed = self.observe(gateway).await?;
        debug!(principals = observed.len(), "Enumerated principals");

        if observed.count_named(request.name()) > 1 {
            warn!(name = %request.name(), "Principal listed more than once; using the first entry");
        }

        let Some(action) = self.diff(request, observed.find(request.name()))? else {
            info!(name = %request.name(), "Principal already converged");
            return Ok(ReconciliationResult::unchanged(request.name()));
        };

        if self.config.check_mode {
            info!(name = %request.name(), action = %action.description(), "Check mode, not applying");
            return Ok(ReconciliationResult::changed(request.name(), action.message()));
        }

        self.apply(gateway, request, action).await?;
        info!(name = %request.name(), action = %action.description(), "Reconciliation complete");
        Ok(ReconciliationResult::changed(request.name(), action.message()))
    }

    /// Like [`Self::reconcile`], with any failure folded into the result.
    pub async fn run(&self, gateway: &dyn Gateway, request: &PrincipalRequest) -> ReconciliationResult {
        match self.reconcile(gateway, request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(name = %request.name(), error = %e, "Reconciliation failed");
                ReconciliationResult::failed(request.name(), &e)
            }
        }
    }

    /// Decide the corrective action for `request` given what was found.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the action needs a password the
    /// request lacks, or would change the superuser flag of the own login.
    pub fn diff(
        &self,
        request: &PrincipalRequest,
        found: Option<&PrincipalRecord>,
    ) -> Result<Option<ReconcileAction>> {
        let desired_superuser = request.is_superuser();

        match (found, request.desired_presence()) {
            (None, Presence::Present) => {
                request.require_password(PASSWORD_REQUIRED_CREATE)?;
                Ok(Some(ReconcileAction::CreateUser {
                    is_superuser: desired_superuser,
                }))
            }
            (None, Presence::Absent) => Ok(None),
            (Some(_), Presence::Absent) => Ok(Some(ReconcileAction::DropUser {
                if_exists: self.config.capabilities.drop_if_exists,
            })),
            (Some(record), Presence::Present) => {
                let superuser_differs = record.is_superuser != desired_superuser;
                let own_login = self.config.login.as_deref() == Some(request.name());

                match request.desired_password_policy() {
                    PasswordPolicy::AlwaysUpdate => {
                        request.require_password(PASSWORD_REQUIRED_CHANGE)?;
                        if !own_login {
                            return Ok(Some(ReconcileAction::AlterPasswordAndSuperuser {
                                is_superuser: desired_superuser,
                            }));
                        }
                        if superuser_differs {
                            return Err(Error::validation(OWN_SUPERUSER_STATUS));
                        }
                        Ok(Some(ReconcileAction::AlterPassword))
                    }
                    PasswordPolicy::OnlyOnCreate if !superuser_differs => Ok(None),
                    PasswordPolicy::OnlyOnCreate if own_login => {
                        Err(Error::validation(OWN_SUPERUSER_STATUS))
                    }
                    PasswordPolicy::OnlyOnCreate => Ok(Some(ReconcileAction::SetSuperuser {
                        is_superuser: desired_superuser,
                    })),
                }
            }
        }
    }

    /// Issue the single statement implementing `action`.
    async fn apply(
        &self,
        gateway: &dyn Gateway,
        request: &PrincipalRequest,
        action: ReconcileAction,
    ) -> Result<()> {
        let statement = action.statement(request)?;
        debug!(action = ?action, statement = %statement.template(), "Applying action");
        gateway.execute(&statement).await.map(|_| ())
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}

/// Builder for Reconciler.
#[derive(Debug, Default)]
pub struct ReconcilerBuilder {
    capabilities: Option<ServerCapabilities>,
    login: Option<String>,
    check_mode: bool,
}

impl ReconcilerBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probed server capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: ServerCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Set the login the gateway is connected as.
    #[must_use]
    pub fn with_login(mut self, login: Option<impl Into<String>>) -> Self {
        self.login = login.map(Into::into);
        self
    }

    /// Enable/disable check mode.
    #[must_use]
    pub const fn check_mode(mut self, enabled: bool) -> Self {
        self.check_mode = enabled;
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no capabilities were supplied.
    pub fn build(self) -> Result<Reconciler> {
        let capabilities = self
            .capabilities
            .ok_or_else(|| Error::validation("server capabilities are required"))?;

        Ok(Reconciler::new(ReconcilerConfig {
            capabilities,
            login: self.login,
            check_mode: self.check_mode,
        }))
    }
}

#[cfg(test)]
mod tests {
    use cql_user_core::ErrorKind;

    use super::*;

    fn reconciler() -> Reconciler {
        Reconciler::new(ReconcilerConfig::default())
    }

    fn request(name: &str) -> Result<PrincipalRequest> {
        PrincipalRequest::new(name)
    }

    #[test]
    fn test_diff_creates_missing_principal() -> Result<()> {
        let req = request("testuser")?.with_password("test").superuser(true);
        let action = reconciler().diff(&req, None)?;
        assert_eq!(action, Some(ReconcileAction::CreateUser { is_superuser: true }));
        Ok(())
    }

    #[test]
    fn test_diff_create_without_password_is_validation_error() -> Result<()> {
        let req = request("testuser")?;
        let err = reconciler().diff(&req, None).err();
        assert_eq!(err.as_ref().map(Error::kind), Some(ErrorKind::Validation));
        assert_eq!(
            err.map(|e| e.to_string()),
            Some(PASSWORD_REQUIRED_CREATE.to_string())
        );
        Ok(())
    }

    #[test]
    fn test_diff_absent_and_missing_is_noop() -> Result<()> {
        let req = request("ghost")?.presence(Presence::Absent);
        assert_eq!(reconciler().diff(&req, None)?, None);
        Ok(())
    }

    #[test]
    fn test_diff_drop_follows_capabilities() -> Result<()> {
        let req = request("testuser")?.presence(Presence::Absent);
        let record = PrincipalRecord::new("testuser", false);

        let modern = reconciler().diff(&req, Some(&record))?;
        assert_eq!(modern, Some(ReconcileAction::DropUser { if_exists: true }));

        let legacy = Reconciler::new(ReconcilerConfig {
            capabilities: ServerCapabilities {
                release_version: Some("1.2.19".into()),
                drop_if_exists: false,
            },
            ..Default::default()
        });
        assert_eq!(
            legacy.diff(&req, Some(&record))?,
            Some(ReconcileAction::DropUser { if_exists: false })
        );
        Ok(())
    }

    #[test]
    fn test_diff_always_update_alters_even_when_equal() -> Result<()> {
        let req = request("testuser")?.with_password("test");
        let record = PrincipalRecord::new("testuser", false);
        assert_eq!(
            reconciler().diff(&req, Some(&record))?,
            Some(ReconcileAction::AlterPasswordAndSuperuser { is_superuser: false })
        );
        Ok(())
    }

    #[test]
    fn test_diff_always_update_requires_password() -> Result<()> {
        let req = request("testuser")?;
        let record = PrincipalRecord::new("testuser", false);
        let err = reconciler().diff(&req, Some(&record)).err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some(PASSWORD_REQUIRED_CHANGE.to_string())
        );
        Ok(())
    }

    #[test]
    fn test_diff_on_create_compares_superuser_only() -> Result<()> {
        let req = request("testuser")?.password_policy(PasswordPolicy::OnlyOnCreate);
        let plain = PrincipalRecord::new("testuser", false);
        let admin = PrincipalRecord::new("testuser", true);

        assert_eq!(reconciler().diff(&req, Some(&plain))?, None);
        assert_eq!(
            reconciler().diff(&req, Some(&admin))?,
            Some(ReconcileAction::SetSuperuser { is_superuser: false })
        );
        Ok(())
    }

    #[test]
    fn test_diff_own_login_skips_superuser_clause() -> Result<()> {
        let own = Reconciler::new(ReconcilerConfig {
            login: Some("cassandra".into()),
            ..Default::default()
        });
        let record = PrincipalRecord::new("cassandra", true);

        let req = request("cassandra")?.with_password("n3w").superuser(true);
        assert_eq!(own.diff(&req, Some(&record))?, Some(ReconcileAction::AlterPassword));

        let demote = request("cassandra")?.with_password("n3w");
        let err = own.diff(&demote, Some(&record)).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Validation));

        let demote_on_create = request("cassandra")?.password_policy(PasswordPolicy::OnlyOnCreate);
        assert!(own.diff(&demote_on_create, Some(&record)).is_err());
        Ok(())
    }

    #[test]
    fn test_builder() -> Result<()> {
        let reconciler = ReconcilerBuilder::new()
            .with_capabilities(ServerCapabilities::default())
            .with_login(Some("cassandra"))
            .check_mode(true)
            .build()?;

        assert!(reconciler.config().check_mode);
        assert_eq!(reconciler.config().login.as_deref(), Some("cassandra"));
        Ok(())
    }

    #[test]
    fn test_builder_requires_capabilities() {
        assert!(ReconcilerBuilder::new().build().is_err());
    }
}
