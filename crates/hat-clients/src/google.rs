//! Google Calendar client authenticated with a service account.
//!
//! Access tokens come from the OAuth 2.0 JWT bearer grant: a claim set
//! naming the service account and the read-only calendar scope is signed
//! with the account's RSA key and exchanged at the key's `token_uri`.
//! Tokens are cached until shortly before they expire.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use hat_core::payload::{self, RawCalendarEvent};
use hat_core::{CalendarEvent, CalendarSource, SourceError};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{ClientError, http_client, response_json, trim_base};

const CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const SERVICE: &str = "Google Calendar";
const TOKEN_LIFETIME: TimeDelta = TimeDelta::hours(1);
const EXPIRY_MARGIN: TimeDelta = TimeDelta::minutes(1);

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service account JSON key that signing needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .field("private_key_id", &self.private_key_id)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parses a JSON key.
    ///
    /// # Errors
    /// Returns an error if the JSON lacks the required fields.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let key: Self =
            serde_json::from_str(json).map_err(|err| ClientError::InvalidCredentials {
                reason: format!("service account key: {err}"),
            })?;
        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(ClientError::InvalidCredentials {
                reason: "service account key has no client_email or private_key".to_string(),
            });
        }
        Ok(key)
    }

    /// Reads a JSON key file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ClientError> {
        let json = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Decodes a base64-encoded JSON key.
    ///
    /// # Errors
    /// Returns an error if the blob is not valid base64 or JSON.
    pub fn from_base64(blob: &str) -> Result<Self, ClientError> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|err| ClientError::InvalidCredentials {
                reason: format!("service account blob is not base64: {err}"),
            })?;
        let json = String::from_utf8(bytes).map_err(|err| ClientError::InvalidCredentials {
            reason: format!("service account blob is not UTF-8: {err}"),
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<RawCalendarEvent>,
    next_page_token: Option<String>,
}

/// Read-only Google Calendar client.
pub struct GoogleCalendarClient {
    client: reqwest::Client,
    base_url: String,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    token: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for GoogleCalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCalendarClient")
            .field("base_url", &self.base_url)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl GoogleCalendarClient {
    /// Creates a client for a service account.
    ///
    /// # Errors
    /// Returns an error if the private key is not an RSA PEM key or the
    /// HTTP client cannot be built.
    pub fn new(key: ServiceAccountKey) -> Result<Self, ClientError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            client: http_client()?,
            base_url: CALENDAR_API_URL.to_string(),
            key,
            signing_key,
            token: Mutex::new(None),
        })
    }

    /// Points the client at a different Calendar API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, ClientError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);
        let claims = Claims {
            iss: &self.key.client_email,
            scope: CALENDAR_READONLY_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + TOKEN_LIFETIME).timestamp(),
        };
        Ok(jsonwebtoken::encode(&header, &claims, &self.signing_key)?)
    }

    /// Returns a cached access token or exchanges a fresh assertion.
    async fn access_token(&self) -> Result<String, ClientError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at - EXPIRY_MARGIN > now) {
            return Ok(token.value.clone());
        }

        let assertion = self.signed_assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let body: TokenResponse = response_json(SERVICE, response).await?;
        let lifetime = body
            .expires_in
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TOKEN_LIFETIME);
        debug!(expires_in = lifetime.num_seconds(), "Obtained Google access token");

        let token = AccessToken {
            value: body.access_token,
            expires_at: now + lifetime,
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn events_url(&self, calendar_id: &str) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|err| ClientError::InvalidUrl(format!("{}: {err}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }

    /// Lists single (expanded) default-type events in a range, following
    /// page tokens.
    ///
    /// # Errors
    /// Returns an error if authentication or any page request fails, or if
    /// an event payload is malformed.
    pub async fn events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Tz>,
        time_max: DateTime<Tz>,
        tz: Tz,
    ) -> Result<Vec<CalendarEvent>, ClientError> {
        let url = self.events_url(calendar_id)?;
        let token = self.access_token().await?;
        let mut raw = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("timeZone", tz.name().to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("eventTypes", "default".to_string()),
            ];
            if let Some(page) = page_token.take() {
                query.push(("pageToken", page));
            }
            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&token)
                .query(&query)
                .send()
                .await?;
            let page: EventsPage = response_json(SERVICE, response).await?;
            raw.extend(page.items);
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        debug!(count = raw.len(), calendar = calendar_id, "Fetched calendar events");
        Ok(payload::calendar_events(raw)?)
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Tz>,
        time_max: DateTime<Tz>,
        tz: Tz,
    ) -> Result<Vec<CalendarEvent>, SourceError> {
        Ok(self.events(calendar_id, time_min, time_max, tz).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const TEST_KEY: &str = include_str!("../tests/data/service_account_key.pem");

    fn key_json() -> String {
        serde_json::json!({
            "type": "service_account",
            "client_email": "autofill@example.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
            "private_key_id": "key-1",
            "token_uri": "https://oauth2.example.com/token",
        })
        .to_string()
    }

    #[test]
    fn key_parses_from_json_and_base64() {
        let json = key_json();
        let from_json = ServiceAccountKey::from_json(&json).unwrap();
        let from_blob = ServiceAccountKey::from_base64(&STANDARD.encode(&json)).unwrap();
        assert_eq!(from_json.client_email, from_blob.client_email);
        assert_eq!(from_blob.private_key_id.as_deref(), Some("key-1"));
    }

    #[test]
    fn token_uri_defaults_to_google() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "a@b.c", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn invalid_blob_is_rejected() {
        let err = ServiceAccountKey::from_base64("not base64!").unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredentials { .. }));
    }

    #[test]
    fn debug_redacts_private_key() {
        let key = ServiceAccountKey::from_json(&key_json()).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("BEGIN RSA PRIVATE KEY"));
    }

    #[test]
    fn assertion_carries_readonly_scope() {
        let key = ServiceAccountKey::from_json(&key_json()).unwrap();
        let client = GoogleCalendarClient::new(key).unwrap();
        let now = Utc::now();
        let assertion = client.signed_assertion(now).unwrap();

        let header = jsonwebtoken::decode_header(&assertion).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("key-1"));

        let payload = assertion.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims["aud"], "https://oauth2.example.com/token");
        assert_eq!(claims["scope"], CALENDAR_READONLY_SCOPE);
        assert_eq!(claims["iss"], "autofill@example.iam.gserviceaccount.com");
        assert_eq!(claims["exp"], now.timestamp() + 3600);
    }

    #[test]
    fn events_url_escapes_calendar_id() {
        let key = ServiceAccountKey::from_json(&key_json()).unwrap();
        let client = GoogleCalendarClient::new(key)
            .unwrap()
            .with_base_url("http://127.0.0.1:9/calendar/v3/");

        let url = client
            .events_url("en.new_zealand#holiday@group.v.calendar.google.com")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/calendar/v3/calendars/en.new_zealand%23holiday@group.v.calendar.google.com/events"
        );

        let url = client.events_url("team/one").unwrap();
        assert_eq!(url.path(), "/calendar/v3/calendars/team%2Fone/events");
    }
}
