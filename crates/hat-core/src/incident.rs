//! Resolved on-call incidents.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use chrono_tz::Tz;

/// Log entry type recorded when a responder acknowledges an incident.
pub const ACKNOWLEDGE_LOG: &str = "acknowledge_log_entry";

/// Log entry type recorded when an incident is resolved.
pub const RESOLVE_LOG: &str = "resolve_log_entry";

/// One entry in an incident's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentLog {
    pub id: String,
    pub kind: String,
    pub summary: String,
    /// User (or service) that performed the logged action.
    pub agent_id: String,
    pub created_at: DateTime<FixedOffset>,
}

/// A resolved incident with its log entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub html_url: String,
    pub resolved_at: DateTime<FixedOffset>,
    pub logs: Vec<IncidentLog>,
}

impl Incident {
    /// Whether `user_id` acted on the incident at any point.
    pub fn is_for_user(&self, user_id: &str) -> bool {
        self.logs.iter().any(|log| log.agent_id == user_id)
    }

    /// Timestamp of the first acknowledge log entry.
    pub fn acknowledged_at(&self) -> Option<DateTime<FixedOffset>> {
        self.first_log(ACKNOWLEDGE_LOG)
    }

    /// Timestamp of the first resolve log entry.
    pub fn resolve_logged_at(&self) -> Option<DateTime<FixedOffset>> {
        self.first_log(RESOLVE_LOG)
    }

    /// Time from acknowledgement to resolution, if both were logged.
    pub fn duration(&self) -> Option<TimeDelta> {
        Some(self.resolve_logged_at()? - self.acknowledged_at()?)
    }

    /// The day the incident was resolved, as seen in `tz`.
    pub fn resolved_date(&self, tz: Tz) -> NaiveDate {
        self.resolved_at.with_timezone(&tz).date_naive()
    }

    /// Timesheet note: the summary followed by the incident link.
    pub fn note(&self) -> String {
        format!("{} {}", self.summary, self.html_url)
    }

    fn first_log(&self, kind: &str) -> Option<DateTime<FixedOffset>> {
        self.logs
            .iter()
            .find(|log| log.kind == kind)
            .map(|log| log.created_at)
    }
}
