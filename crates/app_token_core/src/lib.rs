//! Sequencing for the App token issue and revoke phases.
//!
//! The issue phase runs the full exchange in order: connect as the App,
//! resolve the installation on the configured organization or repository,
//! and request a scoped installation access token. The revoke phase runs in
//! a later, separate invocation with whatever token the orchestrator
//! persisted in between. Both phases surface the first failure immediately;
//! nothing is retried.
//!
//! The pipeline entry points (reading inputs, masking secrets, writing
//! outputs) live outside this crate and call these two functions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use github_app_client::models::parse_permission_request;
use github_app_client::{create_application, revoke_access_token, ApplicationConfig};
use secrecy::SecretString;
use tracing::{info, instrument};

pub mod errors;
pub use errors::CoreError;

mod request;
pub use request::{RepositoryName, TokenRequest};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// The outcome of a successful issue phase.
///
/// The token is the only value the orchestrator must persist (for the later
/// revoke phase) and must register as a masked secret before emitting it
/// anywhere. The permission map is what was actually granted, which can be a
/// superset of what was requested.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The installation access token.
    pub token: SecretString,
    /// The permissions actually granted to the token.
    pub permissions: HashMap<String, String>,
    /// When the token expires on its own.
    pub expires_at: DateTime<Utc>,
    /// The installation the token is scoped to.
    pub installation_id: u64,
}

/// Runs the issue phase: connect, resolve the installation, issue a token.
///
/// The installation is resolved on `request.organization` when one is set,
/// otherwise on `request.repository` in `owner/name` form.
///
/// # Errors
///
/// Returns [`CoreError::MissingTarget`] / [`CoreError::InvalidRepository`]
/// for unusable targets, and passes through every
/// [`github_app_client::Error`] from the underlying operations.
#[instrument(skip(request), fields(application_id = %request.application_id))]
pub async fn issue_token(request: &TokenRequest) -> Result<IssuedToken, CoreError> {
    let application = create_application(&ApplicationConfig {
        application_id: request.application_id.clone(),
        private_key: request.private_key.clone(),
        base_api_url: request.base_api_url.clone(),
        proxy: request.proxy.clone(),
        ignore_environment_proxy: request.ignore_environment_proxy,
        ..Default::default()
    })
    .await?;
    info!(application = ?application.name(), "connected as GitHub App");

    let installation = match non_blank(request.organization.as_deref()) {
        Some(organization) => {
            info!(organization, "obtaining application installation for organization");
            application.get_organization_installation(organization).await?
        }
        None => {
            let repository =
                non_blank(request.repository.as_deref()).ok_or(CoreError::MissingTarget)?;
            let repository = RepositoryName::parse(repository)?;
            info!(repository = %repository, "obtaining application installation for repository");
            application
                .get_repository_installation(&repository.owner, &repository.name)
                .await?
        }
    };

    let permissions = parse_permission_request(request.permissions.as_deref().unwrap_or(""))
        .map_err(CoreError::from)?;
    let token = application
        .get_installation_access_token(installation.id, &permissions)
        .await?;

    info!(
        installation_id = installation.id,
        "successfully generated an access token for the application"
    );
    Ok(IssuedToken {
        token: token.token,
        permissions: token.permissions,
        expires_at: token.expires_at,
        installation_id: installation.id,
    })
}

/// Runs the revoke phase with the token the issue phase recorded.
///
/// A missing or blank token is a no-op success (`Ok(false)`): nothing was
/// recorded, so there is nothing to revoke. With a token present the revoke
/// call is made and must succeed with 204; revoking an expired or already
/// revoked token fails like any other upstream rejection.
///
/// # Errors
///
/// Passes through [`github_app_client::Error::TokenRevocation`] from the
/// revoke call.
#[instrument(skip(token, proxy))]
pub async fn revoke_token(
    token: Option<&str>,
    base_api_url: Option<&str>,
    proxy: Option<&str>,
    ignore_environment_proxy: bool,
) -> Result<bool, CoreError> {
    let Some(token) = non_blank(token) else {
        info!("there is no valid token recorded for this run, nothing to revoke");
        return Ok(false);
    };

    let revoked =
        revoke_access_token(token, base_api_url, proxy, ignore_environment_proxy).await?;
    info!("token has been revoked");
    Ok(revoked)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
