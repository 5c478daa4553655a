//! Outbound proxy resolution for GitHub API calls.
//!
//! Decides which HTTP proxy (if any) to route API traffic through. An
//! explicitly configured proxy always wins; otherwise the conventional
//! `http_proxy`/`https_proxy` environment variables are consulted, subject to
//! an opt-out flag and to `no_proxy` host exclusions. The environment is
//! captured once into a [`ProxyEnvironment`] so the resolution itself is a
//! pure function.

use tracing::{debug, info};
use url::Url;

use crate::Error;

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;

/// Proxy-related environment variables, captured at a single point in time.
///
/// Lowercase variables take precedence over their uppercase counterparts,
/// matching the behavior of most HTTP tooling.
#[derive(Debug, Clone, Default)]
pub struct ProxyEnvironment {
    /// Value of `http_proxy` / `HTTP_PROXY`.
    pub http_proxy: Option<String>,
    /// Value of `https_proxy` / `HTTPS_PROXY`.
    pub https_proxy: Option<String>,
    /// Value of `no_proxy` / `NO_PROXY`.
    pub no_proxy: Option<String>,
}

impl ProxyEnvironment {
    /// Captures the proxy variables from the process environment.
    pub fn from_env() -> Self {
        Self {
            http_proxy: env_var("http_proxy").or_else(|| env_var("HTTP_PROXY")),
            https_proxy: env_var("https_proxy").or_else(|| env_var("HTTPS_PROXY")),
            no_proxy: env_var("no_proxy").or_else(|| env_var("NO_PROXY")),
        }
    }

    /// The effective environment proxy, preferring `http_proxy` over
    /// `https_proxy`.
    fn proxy(&self) -> Option<&str> {
        self.http_proxy
            .as_deref()
            .or(self.https_proxy.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Resolves the proxy to use for requests against `base_url`.
///
/// Priority order:
/// 1. An explicit, non-blank `proxy` value is used unconditionally.
/// 2. With `ignore_environment_proxy` set, no proxy is used.
/// 3. Without an environment proxy, no proxy is used.
/// 4. With `no_proxy` listing the base URL's host, no proxy is used;
///    otherwise the environment proxy applies.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when the base API URL or the selected proxy
/// URI cannot be parsed.
pub fn resolve_proxy(
    proxy: Option<&str>,
    ignore_environment_proxy: bool,
    environment: &ProxyEnvironment,
    base_url: &str,
) -> Result<Option<Url>, Error> {
    if let Some(explicit) = proxy.map(str::trim).filter(|value| !value.is_empty()) {
        info!(proxy = explicit, "explicit proxy specified");
        return parse_proxy_uri(explicit).map(Some);
    }

    if ignore_environment_proxy {
        info!("configured to ignore any environment proxy, going direct for GitHub API calls");
        return Ok(None);
    }

    let Some(env_proxy) = environment.proxy() else {
        debug!("no proxy configured in the environment");
        return Ok(None);
    };
    info!(proxy = env_proxy, "environment proxy specified");

    let Some(no_proxy) = environment.no_proxy.as_deref() else {
        info!(proxy = env_proxy, "using environment proxy for GitHub API calls");
        return parse_proxy_uri(env_proxy).map(Some);
    };

    info!(no_proxy = no_proxy, "environment no_proxy set");
    if proxy_excluded(no_proxy, base_url)? {
        info!("environment proxy excluded by no_proxy settings");
        Ok(None)
    } else {
        info!(proxy = env_proxy, "using environment proxy for GitHub API calls");
        parse_proxy_uri(env_proxy).map(Some)
    }
}

/// Whether the host of `base_url` is listed in the comma separated `no_proxy`
/// value. Entries are compared against both the bare host and `host:port`.
fn proxy_excluded(no_proxy: &str, base_url: &str) -> Result<bool, Error> {
    let parsed = Url::parse(base_url).map_err(|_| Error::InvalidUrl {
        url: base_url.to_string(),
    })?;

    let Some(host) = parsed.host_str() else {
        return Ok(false);
    };
    let host_with_port = parsed
        .port()
        .map(|port| format!("{}:{}", host, port));

    let excluded = no_proxy
        .split(',')
        .map(str::trim)
        .any(|entry| entry == host || Some(entry) == host_with_port.as_deref());

    debug!(
        host = host,
        excluded = excluded,
        "checked base URL host against no_proxy entries"
    );
    Ok(excluded)
}

fn parse_proxy_uri(uri: &str) -> Result<Url, Error> {
    Url::parse(uri).map_err(|_| Error::InvalidUrl {
        url: uri.to_string(),
    })
}
