//! Authenticated HTTP client for the GitHub REST API.
//!
//! Builds a `reqwest` client pinned to a base API URL, a bearer credential
//! (App JWT or installation token), the GitHub API version header, and the
//! proxy decision from [`crate::proxy`]. Every request carries a fixed
//! deadline; a request that exceeds it is a transport failure.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// The public GitHub API endpoint, used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The GitHub REST API version every request is pinned to.
pub const API_VERSION: &str = "2022-11-28";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves the effective base API URL.
///
/// An explicit non-blank override wins, then the `GITHUB_API_URL` value the
/// pipeline environment provides, then the public endpoint.
pub fn api_base_url(url: Option<&str>) -> String {
    url.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var("GITHUB_API_URL").ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// An HTTP client bound to a base API URL and a single bearer credential.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client authenticated with `bearer`, routed through `proxy`
    /// when one was resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientBuild`] when the underlying HTTP client cannot
    /// be constructed, for example on a malformed credential.
    pub(crate) fn new(bearer: &str, base_url: &str, proxy: Option<Url>) -> Result<Self, Error> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {bearer}")).map_err(|_| Error::ClientBuild {
                message: "bearer credential contains invalid header characters".to_string(),
            })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static("github_app_client"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT);

        // The proxy decision was already made by the resolver, including the
        // environment variables; reqwest must not second-guess it.
        builder = match proxy {
            Some(proxy_url) => {
                builder.proxy(reqwest::Proxy::all(proxy_url).map_err(|e| Error::ClientBuild {
                    message: format!("invalid proxy configuration: {e}"),
                })?)
            }
            None => builder.no_proxy(),
        };

        let http = builder.build().map_err(|e| Error::ClientBuild {
            message: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base API URL this client is bound to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.http.get(self.url(path)).send().await
    }

    pub(crate) async fn post<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        B: Serialize + ?Sized,
    {
        self.http.post(self.url(path)).json(body).send().await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.http.delete(self.url(path)).send().await
    }

    // Plain concatenation: Url::join would drop a GitHub Enterprise style
    // `/api/v3` prefix from the base URL.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Status and message extracted from a failed API call, used to build the
/// operation specific error variant at the call site.
#[derive(Debug)]
pub(crate) struct ApiFailure {
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiFailure {
    /// Extracts the upstream status and the `message` field of the GitHub
    /// error body, when one is present.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_default();

        let message = if detail.is_empty() {
            format!("status code: {}", status.as_u16())
        } else {
            format!("status code: {}; {}", status.as_u16(), detail)
        };

        Self {
            status: Some(status.as_u16()),
            message,
        }
    }
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|status| status.as_u16()),
            message: err.to_string(),
        }
    }
}
