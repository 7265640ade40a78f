//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use chrono_tz::Tz;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use hat_clients::ServiceAccountKey;
use hat_core::{MeetingRules, Subdivision};
use serde::{Deserialize, Deserializer, Serialize};

/// Unprefixed environment variables read as configuration keys.
const CREDENTIAL_VARS: [&str; 7] = [
    "HARVEST_ACCOUNT_ID",
    "HARVEST_ACCESS_TOKEN",
    "CALENDAR_ID",
    "SERVICE_ACCOUNT_FILE",
    "SERVICE_ACCOUNT_JSON_B64",
    "PAGERDUTY_USER_ID",
    "PAGERDUTY_API_TOKEN",
];

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "string_or_number")]
    pub harvest_account_id: Option<String>,
    pub harvest_access_token: Option<String>,
    /// Google calendar to read meetings from.
    pub calendar_id: Option<String>,
    /// Path to a service account JSON key.
    pub service_account_file: Option<PathBuf>,
    /// Base64-encoded service account JSON key. Wins over the file.
    pub service_account_json_b64: Option<String>,
    /// `PagerDuty` user whose incidents are booked. Unset skips incidents.
    pub pagerduty_user_id: Option<String>,
    pub pagerduty_api_token: Option<String>,
    /// Timezone that defines day boundaries.
    pub timezone: Tz,
    /// Regional anniversary day to include.
    pub holiday_subdivision: Option<Subdivision>,
    /// Additional non-working dates.
    pub extra_holidays: Vec<NaiveDate>,
    /// Meeting summaries containing any of these are booked as scrum.
    pub scrum_keywords: Vec<String>,
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[REDACTED]")
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("harvest_account_id", &self.harvest_account_id)
            .field("harvest_access_token", &redact(self.harvest_access_token.as_ref()))
            .field("calendar_id", &self.calendar_id)
            .field("service_account_file", &self.service_account_file)
            .field(
                "service_account_json_b64",
                &redact(self.service_account_json_b64.as_ref()),
            )
            .field("pagerduty_user_id", &self.pagerduty_user_id)
            .field("pagerduty_api_token", &redact(self.pagerduty_api_token.as_ref()))
            .field("timezone", &self.timezone)
            .field("holiday_subdivision", &self.holiday_subdivision)
            .field("extra_holidays", &self.extra_holidays)
            .field("scrum_keywords", &self.scrum_keywords)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            harvest_account_id: None,
            harvest_access_token: None,
            calendar_id: None,
            service_account_file: None,
            service_account_json_b64: None,
            pagerduty_user_id: None,
            pagerduty_api_token: None,
            timezone: chrono_tz::Pacific::Auckland,
            holiday_subdivision: Some(Subdivision::Auckland),
            extra_holidays: Vec::new(),
            scrum_keywords: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Credentials under their conventional names, then HAT_* overrides
        figment = figment
            .merge(Env::raw().only(&CREDENTIAL_VARS))
            .merge(Env::prefixed("HAT_"));

        figment.extract()
    }

    /// Harvest account id and access token.
    pub fn harvest_credentials(&self) -> Result<(&str, &str)> {
        Ok((
            required(self.harvest_account_id.as_deref(), "HARVEST_ACCOUNT_ID")?,
            required(self.harvest_access_token.as_deref(), "HARVEST_ACCESS_TOKEN")?,
        ))
    }

    pub fn calendar_id(&self) -> Result<&str> {
        required(self.calendar_id.as_deref(), "CALENDAR_ID")
    }

    /// The service account key, from the base64 blob or the key file.
    pub fn service_account_key(&self) -> Result<ServiceAccountKey> {
        if let Some(blob) = &self.service_account_json_b64 {
            return ServiceAccountKey::from_base64(blob)
                .context("failed to decode SERVICE_ACCOUNT_JSON_B64");
        }
        if let Some(path) = &self.service_account_file {
            return ServiceAccountKey::from_file(path)
                .with_context(|| format!("failed to load service account key {}", path.display()));
        }
        bail!("missing SERVICE_ACCOUNT_JSON_B64 or SERVICE_ACCOUNT_FILE")
    }

    /// `PagerDuty` user id and token, or `None` when incidents are not set up.
    pub fn pagerduty_credentials(&self) -> Result<Option<(&str, &str)>> {
        let Some(user_id) = self.pagerduty_user_id.as_deref() else {
            return Ok(None);
        };
        let token = required(self.pagerduty_api_token.as_deref(), "PAGERDUTY_API_TOKEN")?;
        Ok(Some((user_id, token)))
    }

    pub fn meeting_rules(&self) -> MeetingRules {
        MeetingRules {
            scrum_keywords: self.scrum_keywords.clone(),
        }
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("missing {name}: set it in the environment or the config file"),
    }
}

/// Accepts an id written either as a string or as a bare number.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
    }))
}

/// Returns the platform-specific config directory for hat.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hat"))
}
