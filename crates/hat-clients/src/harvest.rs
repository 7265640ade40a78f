//! Harvest API v2 client.

use async_trait::async_trait;
use chrono::NaiveDate;
use hat_core::payload::RawTimeEntry;
use hat_core::{NewEntrySpec, SourceError, TimeEntry, Timesheet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ClientError, http_client, require_secret, response_json, response_text, trim_base};

const HARVEST_API_URL: &str = "https://api.harvestapp.com/v2";
const SERVICE: &str = "Harvest";
const PER_PAGE: u32 = 100;

/// The authenticated Harvest user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HarvestUser {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TimeEntryPage {
    time_entries: Vec<RawTimeEntry>,
    next_page: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CreateTimeEntry<'a> {
    project_id: u64,
    task_id: u64,
    spent_date: NaiveDate,
    hours: f64,
    notes: &'a str,
}

impl<'a> From<&'a NewEntrySpec> for CreateTimeEntry<'a> {
    fn from(entry: &'a NewEntrySpec) -> Self {
        Self {
            project_id: entry.project_id(),
            task_id: entry.task_id(),
            spent_date: entry.date,
            hours: entry.hours,
            notes: &entry.note,
        }
    }
}

/// Client for the Harvest time-tracking API.
pub struct HarvestClient {
    client: reqwest::Client,
    base_url: String,
    account_id: String,
    access_token: String,
}

impl std::fmt::Debug for HarvestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestClient")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HarvestClient {
    /// Creates a client for the given account.
    ///
    /// # Errors
    /// Returns an error if either credential is blank or the HTTP client
    /// cannot be built.
    pub fn new(
        account_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            base_url: HARVEST_API_URL.to_string(),
            account_id: require_secret(account_id.into(), "Harvest account id")?,
            access_token: require_secret(access_token.into(), "Harvest access token")?,
        })
    }

    /// Points the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{path}", self.base_url))
            .bearer_auth(&self.access_token)
            .header("Harvest-Account-ID", &self.account_id)
    }

    /// Fetches the user the access token belongs to.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is malformed.
    pub async fn current_user(&self) -> Result<HarvestUser, ClientError> {
        let response = self.request(reqwest::Method::GET, "users/me").send().await?;
        response_json(SERVICE, response).await
    }

    /// Lists every entry spent between `from` and `to`, following pages.
    ///
    /// # Errors
    /// Returns an error if any page request fails or is malformed.
    pub async fn time_entries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>, ClientError> {
        let mut entries = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .request(reqwest::Method::GET, "time_entries")
                .query(&[
                    ("from", from.to_string()),
                    ("to", to.to_string()),
                    ("page", page.to_string()),
                    ("per_page", PER_PAGE.to_string()),
                ])
                .send()
                .await?;
            let body: TimeEntryPage = response_json(SERVICE, response).await?;
            entries.extend(body.time_entries.into_iter().map(TimeEntry::from));
            match body.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }
        debug!(count = entries.len(), %from, %to, "Fetched Harvest time entries");
        Ok(entries)
    }

    /// Creates a single entry and returns it as recorded.
    ///
    /// # Errors
    /// Returns an error if Harvest rejects the entry.
    pub async fn create_entry(&self, entry: &NewEntrySpec) -> Result<TimeEntry, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "time_entries")
            .json(&CreateTimeEntry::from(entry))
            .send()
            .await?;
        let created: RawTimeEntry = response_json(SERVICE, response).await?;
        Ok(created.into())
    }

    /// Deletes an entry by id.
    ///
    /// # Errors
    /// Returns an error if Harvest rejects the deletion.
    pub async fn delete_entry(&self, id: u64) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("time_entries/{id}"))
            .send()
            .await?;
        response_text(SERVICE, response).await?;
        Ok(())
    }
}

#[async_trait]
impl Timesheet for HarvestClient {
    async fn list_time_entries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>, SourceError> {
        Ok(self.time_entries(from, to).await?)
    }

    async fn create_time_entry(&self, entry: &NewEntrySpec) -> Result<TimeEntry, SourceError> {
        Ok(self.create_entry(entry).await?)
    }

    async fn delete_time_entry(&self, id: u64) -> Result<(), SourceError> {
        Ok(self.delete_entry(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hat_core::Task;

    #[test]
    fn blank_token_is_rejected() {
        let err = HarvestClient::new("123", "  ").unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredentials { .. }));
    }

    #[test]
    fn debug_redacts_token() {
        let client = HarvestClient::new("123", "secret-token").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn create_body_uses_catalogue_ids() {
        let entry = NewEntrySpec::new(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            Task::InternalMeeting,
            0.5,
            "Standup",
        );
        let body = serde_json::to_value(CreateTimeEntry::from(&entry)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "project_id": Task::InternalMeeting.project().id(),
                "task_id": Task::InternalMeeting.id(),
                "spent_date": "2025-01-06",
                "hours": 0.5,
                "notes": "Standup",
            })
        );
    }
}
