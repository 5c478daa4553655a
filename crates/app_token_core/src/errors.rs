//! Error types for the token issue and revoke phases.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors surfaced by the issue/revoke sequencing.
///
/// Client errors pass through unchanged so the orchestrator sees the same
/// upstream status and message the core operation produced; the remaining
/// variants cover request shapes that can be rejected before connecting.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An underlying App client operation failed.
    #[error(transparent)]
    Client(#[from] github_app_client::Error),

    /// Neither an organization nor a usable repository was provided.
    ///
    /// The pipeline environment normally supplies the repository in
    /// `owner/name` form when no organization is configured explicitly.
    #[error("A target repository in 'owner/name' form or an organization must be provided")]
    MissingTarget,

    /// The repository identifier was not in `owner/name` form.
    #[error("Invalid repository identifier '{value}', expected 'owner/name'")]
    InvalidRepository {
        /// The value that failed to parse.
        value: String,
    },
}
