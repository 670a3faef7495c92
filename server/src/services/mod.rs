// server/src/services/mod.rs

//! Clients for the collaborators the backend delegates to.

pub mod geocoding;
pub mod nutritionix;
pub mod payment_gateway;
pub mod webhook_signature;

use crate::config::AppConfig;
use std::time::Duration;

/// One outbound HTTP client shared by every collaborator, with the configured timeout.
pub fn build_http_client(config: &AppConfig) -> reqwest::Result<reqwest::Client> {
  reqwest::Client::builder()
    .timeout(Duration::from_secs(config.http_client_timeout_secs))
    .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
    .build()
}
