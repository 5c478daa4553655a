//! GitHub App domain types.
//!
//! Wire models for the App metadata, installation, and installation access
//! token payloads, plus parsing of the `name:level` permission request
//! format. Only the fields the token flow depends on are typed; everything
//! else the API returns is kept in an open extras bag.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::Error;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Metadata describing the GitHub App, as returned by `GET /app`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApplicationMetadata {
    /// The numeric id of the App registration.
    pub id: u64,
    /// The display name of the App.
    pub name: String,
    /// The OAuth client id of the App, when the endpoint provides one.
    pub client_id: Option<String>,
}

/// An installation of the App on a repository or organization.
///
/// The API returns many more fields than the token flow needs; `id` and
/// `permissions` are required, the rest is preserved untyped in `extra`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Installation {
    /// The unique id of the installation.
    pub id: u64,
    /// The permissions configured for the installation.
    #[serde(default)]
    pub permissions: HashMap<String, String>,
    /// Provider specific fields the core does not depend on.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A short-lived installation access token.
///
/// The token value is a secret from the moment it is deserialized; the Debug
/// representation redacts it and callers must register it as a maskable
/// value before emitting it anywhere.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationAccessToken {
    /// The bearer token value.
    pub token: SecretString,
    /// When the token stops being valid, typically one hour after issuance.
    pub expires_at: DateTime<Utc>,
    /// The permissions actually granted. The API may add implicit entries
    /// (such as `metadata: read`), so this is the ground truth rather than
    /// whatever was requested.
    #[serde(default)]
    pub permissions: HashMap<String, String>,
}

/// Parses a comma separated `name:level` permission request string.
///
/// A blank input yields an empty map, which means "grant the App's maximal
/// configured permissions".
///
/// # Errors
///
/// Returns [`Error::InvalidPermissionRequest`] for any entry that does not
/// have a `name:level` shape.
pub fn parse_permission_request(input: &str) -> Result<HashMap<String, String>, Error> {
    let mut permissions = HashMap::new();

    if input.trim().is_empty() {
        return Ok(permissions);
    }

    for entry in input.split(',') {
        let (name, level) = entry.split_once(':').ok_or(Error::InvalidPermissionRequest {
            entry: entry.to_string(),
        })?;

        let name = name.trim();
        let level = level.trim();
        if name.is_empty() || level.is_empty() {
            return Err(Error::InvalidPermissionRequest {
                entry: entry.to_string(),
            });
        }

        permissions.insert(name.to_string(), level.to_string());
    }

    Ok(permissions)
}
