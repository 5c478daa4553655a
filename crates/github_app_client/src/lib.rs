//! Crate for issuing short-lived GitHub App installation access tokens.
//!
//! This crate authenticates as a GitHub App using a signed JWT, resolves the
//! App's installation on a repository or organization, exchanges it for a
//! scoped installation access token, and can revoke that token again at the
//! end of a pipeline run. Outbound calls honor explicit and environment
//! proxy configuration, including `no_proxy` exclusions.
//!
//! ```rust,no_run
//! use github_app_client::{ApplicationConfig, create_application};
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), github_app_client::Error> {
//! let app = create_application(&ApplicationConfig {
//!     application_id: "12345".to_string(),
//!     private_key: std::fs::read_to_string("app-key.pem").unwrap(),
//!     ..Default::default()
//! })
//! .await?;
//!
//! let installation = app.get_repository_installation("octo-org", "octo-repo").await?;
//! let token = app
//!     .get_installation_access_token(installation.id, &HashMap::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub use errors::Error;

pub mod models;

mod application;
pub use application::{
    create_application, revoke_access_token, ApplicationConfig, GitHubApplication,
    DEFAULT_JWT_VALID_SECONDS,
};

mod client;
pub use client::{api_base_url, ApiClient, API_VERSION, DEFAULT_API_URL};

mod private_key;
pub use private_key::PrivateKey;

pub mod proxy;
