//! `PagerDuty` REST API v2 client.

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use hat_core::payload::{RawIncident, RawIncidentLog, RawReference};
use hat_core::{Incident, IncidentSource, SourceError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{ClientError, http_client, require_secret, response_json, trim_base};

const PAGERDUTY_API_URL: &str = "https://api.pagerduty.com";
const SERVICE: &str = "PagerDuty";
const ACCEPT: &str = "application/vnd.pagerduty+json;version=2";
const PAGE_LIMIT: usize = 100;

/// A `PagerDuty` user with the fields the incident search needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PagerDutyUser {
    pub id: String,
    pub time_zone: String,
    #[serde(default)]
    pub teams: Vec<RawReference>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: PagerDutyUser,
}

/// One page of a classic offset-paginated listing.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(alias = "incidents", alias = "log_entries")]
    items: Vec<T>,
    #[serde(default)]
    more: bool,
}

/// Client for resolved incidents and their log entries.
pub struct PagerDutyClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl std::fmt::Debug for PagerDutyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagerDutyClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl PagerDutyClient {
    /// Creates a client authenticated with a REST API token.
    ///
    /// # Errors
    /// Returns an error if the token is blank or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            base_url: PAGERDUTY_API_URL.to_string(),
            api_token: require_secret(api_token.into(), "PagerDuty API token")?,
        })
    }

    /// Points the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .header(reqwest::header::AUTHORIZATION, format!("Token token={}", self.api_token))
            .header(reqwest::header::ACCEPT, ACCEPT)
            .query(query)
            .send()
            .await?;
        response_json(SERVICE, response).await
    }

    /// Follows `more` until every item of a listing is collected.
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::new();
        loop {
            let mut params = query.to_vec();
            params.push(("limit", PAGE_LIMIT.to_string()));
            params.push(("offset", items.len().to_string()));
            let page: Page<T> = self.get(path, &params).await?;
            let fetched = page.items.len();
            items.extend(page.items);
            if !page.more || fetched == 0 {
                break;
            }
        }
        Ok(items)
    }

    /// Fetches a user with their teams and time zone.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is malformed.
    pub async fn user(&self, user_id: &str) -> Result<PagerDutyUser, ClientError> {
        let envelope: UserEnvelope = self.get(&format!("users/{user_id}"), &[]).await?;
        Ok(envelope.user)
    }

    /// Resolved incidents of the given teams within `[since, until)`.
    ///
    /// # Errors
    /// Returns an error if any page request fails or is malformed.
    pub async fn resolved_incidents(
        &self,
        team_ids: &[String],
        since: DateTime<Tz>,
        until: DateTime<Tz>,
        time_zone: &str,
    ) -> Result<Vec<RawIncident>, ClientError> {
        let mut query = vec![
            ("since", since.to_rfc3339()),
            ("until", until.to_rfc3339()),
            ("statuses[]", "resolved".to_string()),
            ("time_zone", time_zone.to_string()),
        ];
        query.extend(team_ids.iter().map(|id| ("team_ids[]", id.clone())));
        self.list_all("incidents", &query).await
    }

    /// Overview log entries of one incident.
    ///
    /// # Errors
    /// Returns an error if any page request fails or is malformed.
    pub async fn incident_logs(
        &self,
        incident_id: &str,
        time_zone: &str,
    ) -> Result<Vec<RawIncidentLog>, ClientError> {
        let query = [
            ("is_overview", "true".to_string()),
            ("time_zone", time_zone.to_string()),
        ];
        self.list_all(&format!("incidents/{incident_id}/log_entries"), &query)
            .await
    }

    /// Resolved incidents of the user's teams that the user acted on.
    ///
    /// # Errors
    /// Returns an error if any request fails or is malformed.
    pub async fn incidents_for_user(
        &self,
        user_id: &str,
        since: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> Result<Vec<Incident>, ClientError> {
        let user = self.user(user_id).await?;
        let team_ids: Vec<String> = user.teams.into_iter().map(|team| team.id).collect();
        let raw = self
            .resolved_incidents(&team_ids, since, until, &user.time_zone)
            .await?;
        debug!(count = raw.len(), teams = team_ids.len(), "Fetched resolved incidents");

        let mut incidents = Vec::new();
        for incident in raw {
            let logs = self.incident_logs(&incident.id, &user.time_zone).await?;
            let incident = incident.with_logs(logs);
            if incident.is_for_user(user_id) {
                incidents.push(incident);
            } else {
                debug!(incident = %incident.id, "Incident has no activity by user");
            }
        }
        Ok(incidents)
    }
}

#[async_trait]
impl IncidentSource for PagerDutyClient {
    async fn list_resolved_incidents(
        &self,
        user_id: &str,
        since: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> Result<Vec<Incident>, SourceError> {
        Ok(self.incidents_for_user(user_id, since, until).await?)
    }
}
