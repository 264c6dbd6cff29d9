//! Server feature probe, run once after connecting.

use cql_user_core::Result;
use tracing::debug;

use crate::config::ProtocolVersion;
use crate::session::Gateway;
use crate::statement::Statement;

pub const RELEASE_VERSION_QUERY: &str = "SELECT release_version FROM system.local";

/// What the connected server supports, as far as account DDL is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCapabilities {
    /// Reported `release_version`, if the probe found one.
    pub release_version: Option<String>,
    /// `DROP USER IF EXISTS` is understood.
    pub drop_if_exists: bool,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            release_version: None,
            drop_if_exists: true,
        }
    }
}

impl ServerCapabilities {
    /// Capabilities implied by a `major.minor[.patch]` release string.
    ///
    /// Unparsable versions are treated as current releases.
    #[must_use]
    pub fn from_release_version(version: &str) -> Self {
        let drop_if_exists = parse_major_minor(version).is_none_or(|release| release >= (2, 0));
        Self {
            release_version: Some(version.to_string()),
            drop_if_exists,
        }
    }

    /// Fallback when the server reports no release: protocol 1 means 1.2.
    #[must_use]
    pub fn from_protocol_version(version: ProtocolVersion) -> Self {
        Self {
            release_version: None,
            drop_if_exists: version.get() > 1,
        }
    }

    /// Read `release_version` from `system.local`.
    ///
    /// # Errors
    ///
    /// Returns the gateway's execution error if the probe statement fails.
    pub async fn probe(gateway: &dyn Gateway, fallback: ProtocolVersion) -> Result<Self> {
        let statement = Statement::new(RELEASE_VERSION_QUERY);

        let release = gateway
            .execute(&statement)
            .await?
            .find_map(|row| row.text("release_version").map(str::to_string));

        let capabilities = release.as_deref().map_or_else(
            || Self::from_protocol_version(fallback),
            Self::from_release_version,
        );

        debug!(
            release_version = ?capabilities.release_version,
            drop_if_exists = capabilities.drop_if_exists,
            "Probed server capabilities"
        );
        Ok(capabilities)
    }
}

fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts
        .next()
        .and_then(|minor| {
            minor
                .chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
                .parse()
                .ok()
        })
        .unwrap_or(0);
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use crate::memory::InMemoryGateway;
    use crate::statement::Consistency;

    use super::*;

    #[test]
    fn test_release_versions() {
        assert!(ServerCapabilities::from_release_version("4.1.3").drop_if_exists);
        assert!(ServerCapabilities::from_release_version("2.0.17").drop_if_exists);
        assert!(!ServerCapabilities::from_release_version("1.2.19").drop_if_exists);
        assert!(ServerCapabilities::from_release_version("5.0-beta1").drop_if_exists);
        assert!(ServerCapabilities::from_release_version("garbage").drop_if_exists);
    }

    #[test]
    fn test_protocol_fallback() -> Result<()> {
        assert!(!ServerCapabilities::from_protocol_version(ProtocolVersion::new(1)?).drop_if_exists);
        assert!(ServerCapabilities::from_protocol_version(ProtocolVersion::new(3)?).drop_if_exists);
        Ok(())
    }

    #[tokio::test]
    async fn test_probe_reads_release_at_quorum() -> Result<()> {
        let gateway = InMemoryGateway::new().with_release_version(Some("1.2.19"));

        let capabilities = ServerCapabilities::probe(&gateway, ProtocolVersion::default()).await?;

        assert!(!capabilities.drop_if_exists);
        assert_eq!(capabilities.release_version.as_deref(), Some("1.2.19"));
        let executed = gateway.executed().await;
        assert_eq!(executed.len(), 1);
        assert!(executed.iter().all(|s| s.consistency == Consistency::Quorum));
        Ok(())
    }

    #[tokio::test]
    async fn test_probe_without_release_uses_protocol() -> Result<()> {
        let gateway = InMemoryGateway::new().with_release_version(None);

        let capabilities = ServerCapabilities::probe(&gateway, ProtocolVersion::new(1)?).await?;

        assert_eq!(capabilities.release_version, None);
        assert!(!capabilities.drop_if_exists);
        Ok(())
    }

    #[test]
    fn test_parse_major_minor() {
        assert_eq!(parse_major_minor("3.11.16"), Some((3, 11)));
        assert_eq!(parse_major_minor("4"), Some((4, 0)));
        assert_eq!(parse_major_minor("5.0-rc1"), Some((5, 0)));
        assert_eq!(parse_major_minor("x.y"), None);
    }
}
