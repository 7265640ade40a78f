//! HTTP clients for the services the timesheet run talks to.
//!
//! - Google Calendar (service account credentials)
//! - `PagerDuty` REST API v2
//! - Harvest API v2
//! - Joke and advice text for entry notes
//!
//! Each client implements the matching port trait from `hat-core`.

use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod google;
pub mod harvest;
pub mod notes;
pub mod pagerduty;

pub use google::{GoogleCalendarClient, ServiceAccountKey};
pub use harvest::HarvestClient;
pub use notes::NoteClient;
pub use pagerduty::PagerDutyClient;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Service client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required credential was missing or malformed.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// A base URL could not be used to build request URLs.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Response parsed but broke a domain invariant.
    #[error(transparent)]
    Payload(#[from] hat_core::PayloadError),
    /// Failed to sign the service account token request.
    #[error("failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    /// Failed to read a credentials file.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Builds the shared HTTP client with a request timeout.
fn http_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(ClientError::ClientBuild)
}

/// Rejects empty or whitespace-only secrets.
fn require_secret(value: String, name: &str) -> Result<String, ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidCredentials {
            reason: format!("{name} cannot be empty"),
        });
    }
    Ok(value)
}

/// Checks the status and returns the body text.
async fn response_text(
    service: &'static str,
    response: reqwest::Response,
) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Api {
            service,
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

/// Checks the status and decodes the JSON body.
async fn response_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let body = response_text(service, response).await?;
    serde_json::from_str(&body)
        .map_err(|err| ClientError::InvalidResponse(format!("{service}: {err}")))
}

/// Strips a trailing slash so paths can be appended with `/`.
fn trim_base(url: impl Into<String>) -> String {
    let mut url = url.into();
    while url.ends_with('/') {
        url.pop();
    }
    url
}
