//! Desired and observed state of a single login principal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether the principal should exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

impl FromStr for Presence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(Error::validation(format!(
                "value of state must be one of: present, absent, got: {other}"
            ))),
        }
    }
}

/// When the password of an existing principal is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PasswordPolicy {
    /// Rewrite the password (and superuser flag) on every run.
    #[default]
    #[serde(rename = "always")]
    AlwaysUpdate,
    /// Set the password only when the principal is created.
    #[serde(rename = "on_create")]
    OnlyOnCreate,
}

impl fmt::Display for PasswordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysUpdate => f.write_str("always"),
            Self::OnlyOnCreate => f.write_str("on_create"),
        }
    }
}

impl FromStr for PasswordPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "always" => Ok(Self::AlwaysUpdate),
            "on_create" => Ok(Self::OnlyOnCreate),
            other => Err(Error::validation(format!(
                "value of update_password must be one of: always, on_create, got: {other}"
            ))),
        }
    }
}

/// A secret that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The plaintext, for binding into a statement.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// The desired state of one principal, fixed for the whole invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalRequest {
    name: String,
    password: Option<Password>,
    is_superuser: bool,
    presence: Presence,
    password_policy: PasswordPolicy,
}

impl PrincipalRequest {
    /// Start a request for `name` with every other field at its default.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::validation("user name must not be empty"));
        }
        Ok(Self {
            name,
            password: None,
            is_superuser: false,
            presence: Presence::default(),
            password_policy: PasswordPolicy::default(),
        })
    }

    /// Set the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Password::new(password));
        self
    }

    /// Set the password if one was supplied.
    #[must_use]
    pub fn with_optional_password(mut self, password: Option<String>) -> Self {
        self.password = password.map(Password::new);
        self
    }

    /// Set the superuser flag.
    #[must_use]
    pub const fn superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    /// Set the desired presence.
    #[must_use]
    pub const fn presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Set the password policy.
    #[must_use]
    pub const fn password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn password(&self) -> Option<&Password> {
        self.password.as_ref()
    }

    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    #[must_use]
    pub const fn desired_presence(&self) -> Presence {
        self.presence
    }

    #[must_use]
    pub const fn desired_password_policy(&self) -> PasswordPolicy {
        self.password_policy
    }

    /// The password, or a validation error carrying `reason`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no password was supplied.
    pub fn require_password(&self, reason: &str) -> Result<&Password> {
        self.password
            .as_ref()
            .ok_or_else(|| Error::validation(reason))
    }
}

/// A principal as enumerated from the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    pub name: String,
    pub is_superuser: bool,
}

impl PrincipalRecord {
    pub fn new(name: impl Into<String>, is_superuser: bool) -> Self {
        Self {
            name: name.into(),
            is_superuser,
        }
    }
}
