//! GitHub App identity and token lifecycle operations.
//!
//! This module holds the App identity (id plus normalized private key) and
//! implements the full exchange: sign an RS256 JWT, connect as the App,
//! resolve the installation on a repository or organization, request a scoped
//! installation access token, and revoke it again once the pipeline step is
//! done.
//!
//! ## Authentication flow
//!
//! 1. [`GitHubApplication::connect`] signs a short-lived JWT and verifies the
//!    credentials against `GET /app`.
//! 2. [`GitHubApplication::get_repository_installation`] or
//!    [`GitHubApplication::get_organization_installation`] resolves where the
//!    App is installed.
//! 3. [`GitHubApplication::get_installation_access_token`] exchanges the
//!    installation id (plus an optional permission subset) for a bearer token.
//! 4. [`revoke_access_token`] invalidates the token, authenticated as the
//!    token itself rather than the App JWT.
//!
//! Every network call is attempted exactly once; failures abort the sequence.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::client::{api_base_url, ApiClient, ApiFailure};
use crate::models::{ApplicationMetadata, Installation, InstallationAccessToken};
use crate::private_key::PrivateKey;
use crate::proxy::{resolve_proxy, ProxyEnvironment};
use crate::Error;

#[cfg(test)]
#[path = "application_tests.rs"]
mod tests;

/// Default validity window for the App JWT, in seconds.
///
/// The JWT only needs to survive the connect round trip; a fresh one is
/// signed on every [`GitHubApplication::connect`].
pub const DEFAULT_JWT_VALID_SECONDS: u64 = 60;

/// Everything needed to construct and connect an App in one call.
#[derive(Clone, Default)]
pub struct ApplicationConfig {
    /// The GitHub App id, as shown on the App settings page.
    pub application_id: String,
    /// The App's RSA private key, PEM or Base64 encoded PEM.
    pub private_key: String,
    /// Base API URL override, for GitHub Enterprise Server endpoints.
    pub base_api_url: Option<String>,
    /// JWT validity window; defaults to [`DEFAULT_JWT_VALID_SECONDS`].
    pub valid_seconds: Option<u64>,
    /// Explicit proxy URI for outbound API calls.
    pub proxy: Option<String>,
    /// Skip any proxy configured through the environment.
    pub ignore_environment_proxy: bool,
}

impl std::fmt::Debug for ApplicationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationConfig")
            .field("application_id", &self.application_id)
            .field("private_key", &"REDACTED")
            .field("base_api_url", &self.base_api_url)
            .field("valid_seconds", &self.valid_seconds)
            .field("proxy", &self.proxy)
            .field("ignore_environment_proxy", &self.ignore_environment_proxy)
            .finish()
    }
}

/// Creates an application identity from `config` and connects it.
///
/// # Errors
///
/// Propagates validation errors from [`GitHubApplication::new`] and
/// connection errors from [`GitHubApplication::connect`].
pub async fn create_application(config: &ApplicationConfig) -> Result<GitHubApplication, Error> {
    let mut application = GitHubApplication::new(
        &config.private_key,
        &config.application_id,
        config.base_api_url.as_deref(),
    )?;
    application
        .connect(
            config.valid_seconds.unwrap_or(DEFAULT_JWT_VALID_SECONDS),
            config.proxy.as_deref(),
            config.ignore_environment_proxy,
        )
        .await?;
    Ok(application)
}

/// A GitHub App identity and, once connected, its authenticated API client.
#[derive(Debug)]
pub struct GitHubApplication {
    id: String,
    private_key: PrivateKey,
    api_url: String,
    client: Option<ApiClient>,
    metadata: Option<ApplicationMetadata>,
}

#[derive(Serialize)]
struct JwtClaims {
    iat: u64,
    exp: u64,
    iss: String,
}

impl GitHubApplication {
    /// Builds an unconnected identity from the raw inputs.
    ///
    /// Both values are trimmed and must be non-empty; the key must normalize
    /// to RSA PEM.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingValue`] for an empty id or key and
    /// [`Error::InvalidKeyFormat`] for unusable key material.
    pub fn new(
        private_key: &str,
        application_id: &str,
        base_api_url: Option<&str>,
    ) -> Result<Self, Error> {
        let key_data = validate_value("privateKey", private_key)?;
        let id = validate_value("applicationId", application_id)?;

        Ok(Self {
            id,
            private_key: PrivateKey::new(&key_data)?,
            api_url: api_base_url(base_api_url),
            client: None,
            metadata: None,
        })
    }

    /// Signs a fresh JWT and verifies the credentials against `GET /app`.
    ///
    /// On success the App metadata is stored and returned. On failure the
    /// metadata stays unset and the identity remains not-connected; calling
    /// `connect` again signs a new JWT, so a failed attempt is never resumed
    /// on a possibly expired assertion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectFailure`] carrying the upstream status and
    /// message on any non-200 response or transport failure.
    #[instrument(skip(self, proxy), fields(application_id = %self.id))]
    pub async fn connect(
        &mut self,
        valid_seconds: u64,
        proxy: Option<&str>,
        ignore_environment_proxy: bool,
    ) -> Result<ApplicationMetadata, Error> {
        let jwt = self.sign_jwt(valid_seconds)?;

        let environment = ProxyEnvironment::from_env();
        let proxy_url = resolve_proxy(proxy, ignore_environment_proxy, &environment, &self.api_url)?;
        self.client = Some(ApiClient::new(&jwt, &self.api_url, proxy_url)?);
        let client = self.client.as_ref().ok_or(Error::NotConnected)?;

        debug!("attempting to fetch the GitHub App for the provided credentials");
        let metadata: ApplicationMetadata = read_json(client.get("/app").await, StatusCode::OK)
            .await
            .map_err(|failure| {
                error!(
                    status = ?failure.status,
                    message = %failure.message,
                    "failure connecting as the application"
                );
                Error::ConnectFailure {
                    status: failure.status,
                    message: failure.message,
                }
            })?;

        info!(
            application = %metadata.name,
            application_id = metadata.id,
            "GitHub App resolved"
        );
        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    /// The configured App id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The base API URL this identity talks to.
    pub fn api_base_url(&self) -> &str {
        &self.api_url
    }

    /// Metadata fetched during connect, unset until a connect succeeded.
    pub fn metadata(&self) -> Option<&ApplicationMetadata> {
        self.metadata.as_ref()
    }

    /// The App's display name, when connected.
    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref().map(|metadata| metadata.name.as_str())
    }

    /// The authenticated client for App-level calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] unless a [`connect`](Self::connect)
    /// call has succeeded on this identity.
    pub fn client(&self) -> Result<&ApiClient, Error> {
        match (&self.client, &self.metadata) {
            (Some(client), Some(_)) => Ok(client),
            _ => Err(Error::NotConnected),
        }
    }

    /// Lists every installation of the App.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before a successful connect, and
    /// [`Error::InstallationLookup`] on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_application_installations(&self) -> Result<Vec<Installation>, Error> {
        let client = self.client()?;

        read_json(client.get("/app/installations").await, StatusCode::OK)
            .await
            .map_err(|failure| lookup_error(format!("application {}", self.id), failure))
    }

    /// Resolves the App installation on `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before a successful connect, and
    /// [`Error::InstallationLookup`] naming the repository on any upstream
    /// failure, including the App not being installed there.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn get_repository_installation(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Installation, Error> {
        let client = self.client()?;
        let path = format!("/repos/{owner}/{repo}/installation");

        read_json(client.get(&path).await, StatusCode::OK)
            .await
            .map_err(|failure| lookup_error(format!("repository {owner}/{repo}"), failure))
    }

    /// Resolves the App installation on an organization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before a successful connect, and
    /// [`Error::InstallationLookup`] naming the organization on any upstream
    /// failure.
    #[instrument(skip(self), fields(org = %org))]
    pub async fn get_organization_installation(&self, org: &str) -> Result<Installation, Error> {
        let client = self.client()?;
        let path = format!("/orgs/{org}/installation");

        read_json(client.get(&path).await, StatusCode::OK)
            .await
            .map_err(|failure| lookup_error(format!("organization {org}"), failure))
    }

    /// Requests an installation access token, optionally scoped to a subset
    /// of the installation's permissions.
    ///
    /// An empty permission map requests the App's maximal configured
    /// permissions. The granted set in the returned token is authoritative:
    /// the API adds implicit permissions such as `metadata: read`, so callers
    /// must read the result rather than echo the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInstallationId`] for a zero id,
    /// [`Error::NotConnected`] before a successful connect, and
    /// [`Error::TokenIssuance`] on any response other than 201.
    #[instrument(skip(self, permissions), fields(installation_id = installation_id))]
    pub async fn get_installation_access_token(
        &self,
        installation_id: u64,
        permissions: &HashMap<String, String>,
    ) -> Result<InstallationAccessToken, Error> {
        if installation_id == 0 {
            return Err(Error::MissingInstallationId);
        }
        let client = self.client()?;

        let body = if permissions.is_empty() {
            serde_json::json!({})
        } else {
            info!(permissions = ?permissions, "requesting limitation on App permissions");
            serde_json::json!({ "permissions": permissions })
        };

        let path = format!("/app/installations/{installation_id}/access_tokens");
        let token: InstallationAccessToken =
            read_json(client.post(&path, &body).await, StatusCode::CREATED)
                .await
                .map_err(|failure| {
                    error!(
                        installation_id,
                        status = ?failure.status,
                        message = %failure.message,
                        "failed to get access token for application installation"
                    );
                    Error::TokenIssuance {
                        status: failure.status,
                        message: failure.message,
                    }
                })?;

        info!(
            installation_id,
            granted = ?token.permissions.keys().collect::<Vec<_>>(),
            expires_at = %token.expires_at,
            "issued installation access token"
        );
        Ok(token)
    }

    fn sign_jwt(&self, valid_seconds: u64) -> Result<String, Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = JwtClaims {
            iat: now,
            exp: now + valid_seconds,
            iss: self.id.clone(),
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.key().as_bytes())
            .map_err(|_| Error::InvalidKeyFormat)?;

        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| Error::ConnectFailure {
            status: None,
            message: format!("failed to sign the application JWT: {e}"),
        })
    }
}

/// Revokes an installation access token.
///
/// The client authenticates as the token being revoked, not as the App JWT.
/// Success is exactly HTTP 204. Revoking an already revoked or expired token
/// fails like any other upstream rejection.
///
/// # Errors
///
/// Returns [`Error::TokenRevocation`] on any response other than 204 or on a
/// transport failure.
#[instrument(skip(token, proxy))]
pub async fn revoke_access_token(
    token: &str,
    base_url: Option<&str>,
    proxy: Option<&str>,
    ignore_environment_proxy: bool,
) -> Result<bool, Error> {
    let base = api_base_url(base_url);
    let environment = ProxyEnvironment::from_env();
    let proxy_url = resolve_proxy(proxy, ignore_environment_proxy, &environment, &base)?;
    let client = ApiClient::new(token, &base, proxy_url)?;

    match client.delete("/installation/token").await {
        Ok(response) if response.status() == StatusCode::NO_CONTENT => {
            info!("installation access token revoked");
            Ok(true)
        }
        Ok(response) => {
            let failure = ApiFailure::from_response(response).await;
            error!(status = ?failure.status, message = %failure.message, "failed to revoke token");
            Err(Error::TokenRevocation {
                status: failure.status,
                message: failure.message,
            })
        }
        Err(err) => {
            let failure = ApiFailure::from(err);
            error!(message = %failure.message, "failed to revoke token");
            Err(Error::TokenRevocation {
                status: failure.status,
                message: failure.message,
            })
        }
    }
}

fn lookup_error(target: String, failure: ApiFailure) -> Error {
    error!(
        target = %target,
        status = ?failure.status,
        message = %failure.message,
        "failed to resolve installation"
    );
    Error::InstallationLookup {
        target,
        status: failure.status,
        message: failure.message,
    }
}

async fn read_json<T>(
    result: Result<reqwest::Response, reqwest::Error>,
    expected: StatusCode,
) -> Result<T, ApiFailure>
where
    T: serde::de::DeserializeOwned,
{
    let response = result.map_err(ApiFailure::from)?;
    if response.status() != expected {
        return Err(ApiFailure::from_response(response).await);
    }
    response.json::<T>().await.map_err(ApiFailure::from)
}

fn validate_value(name: &str, value: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingValue {
            name: name.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
