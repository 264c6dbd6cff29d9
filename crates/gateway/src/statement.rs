//! Statements with bound parameters and an explicit consistency level.
//!
//! Account DDL (`CREATE USER`, `ALTER USER`, `DROP USER`) does not accept
//! server-side bind markers, so parameters are bound on the client: every `?`
//! outside a quoted section is replaced by the next parameter rendered as a
//! CQL string literal.

use std::fmt;

use cql_user_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Replica acknowledgement required before a statement is considered done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    One,
    Two,
    Three,
    #[default]
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

/// A statement template plus the parameters bound to its `?` markers.
#[derive(Clone, PartialEq, Eq)]
pub struct Statement {
    template: String,
    params: Vec<String>,
    consistency: Consistency,
}

impl Statement {
    /// A statement with no parameters, at quorum.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            params: Vec::new(),
            consistency: Consistency::Quorum,
        }
    }

    /// Bind the next `?` marker.
    #[must_use]
    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    #[must_use]
    pub const fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    /// The template as written, with `?` markers. Safe to log.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub const fn consistency(&self) -> Consistency {
        self.consistency
    }

    /// Substitute every marker with its quoted parameter.
    ///
    /// The returned text may carry secrets and must not be logged.
    ///
    /// # Errors
    ///
    /// Returns an execution error when the number of markers and bound
    /// parameters differ.
    pub fn render(&self) -> Result<String> {
        let mut rendered = String::with_capacity(self.template.len());
        let mut params = self.params.iter();
        let mut in_literal = false;

        for ch in self.template.chars() {
            match ch {
                '\'' => {
                    in_literal = !in_literal;
                    rendered.push(ch);
                }
                '?' if !in_literal => {
                    let value = params.next().ok_or_else(|| {
                        Error::execution_failed(&self.template, "not enough bound parameters")
                    })?;
                    rendered.push_str(&quote_literal(value));
                }
                _ => rendered.push(ch),
            }
        }

        if params.next().is_some() {
            return Err(Error::execution_failed(
                &self.template,
                "more bound parameters than markers",
            ));
        }

        Ok(rendered)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("template", &self.template)
            .field("params", &self.params.len())
            .field("consistency", &self.consistency)
            .finish()
    }
}

/// Render `value` as a CQL string literal.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
