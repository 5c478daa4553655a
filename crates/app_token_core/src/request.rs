//! Request types for the token issue phase.

use crate::errors::CoreError;

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Everything the issue phase needs, assembled by the orchestration layer
/// from its configuration inputs and environment.
#[derive(Clone, Default)]
pub struct TokenRequest {
    /// The GitHub App id.
    pub application_id: String,
    /// The App's RSA private key, PEM or Base64 encoded PEM.
    pub private_key: String,
    /// Base API URL override, for GitHub Enterprise Server endpoints.
    pub base_api_url: Option<String>,
    /// Organization to resolve the installation on. Takes precedence over
    /// `repository` when set.
    pub organization: Option<String>,
    /// Repository in `owner/name` form, used when no organization is given.
    pub repository: Option<String>,
    /// Comma separated `name:level` permission request; blank means the
    /// App's maximal configured permissions.
    pub permissions: Option<String>,
    /// Explicit proxy URI for outbound API calls.
    pub proxy: Option<String>,
    /// Skip any proxy configured through the environment.
    pub ignore_environment_proxy: bool,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("application_id", &self.application_id)
            .field("private_key", &"REDACTED")
            .field("base_api_url", &self.base_api_url)
            .field("organization", &self.organization)
            .field("repository", &self.repository)
            .field("permissions", &self.permissions)
            .field("proxy", &self.proxy)
            .field("ignore_environment_proxy", &self.ignore_environment_proxy)
            .finish()
    }
}

/// A repository identifier split into its owner and name parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName {
    /// The owning user or organization.
    pub owner: String,
    /// The repository name.
    pub name: String,
}

impl RepositoryName {
    /// Parses an `owner/name` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRepository`] when the value does not have
    /// exactly an owner and a name.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidRepository {
            value: value.to_string(),
        };

        let (owner, name) = value.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
