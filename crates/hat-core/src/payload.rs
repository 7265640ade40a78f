//! Wire shapes of collaborator payloads and their validation.
//!
//! Each raw struct mirrors the fields the services send. Conversion into the
//! domain types checks the invariants the engine relies on; a violation is a
//! [`PayloadError`] and aborts the run.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use crate::entry::TimeEntry;
use crate::event::{CalendarEvent, EventSpan};
use crate::incident::{Incident, IncidentLog};

/// Payloads that parse but break a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("event '{summary}' has neither a start date nor a start dateTime")]
    MissingStart { summary: String },

    #[error("event '{summary}' has a start dateTime but no end dateTime")]
    MissingEnd { summary: String },

    #[error("event '{summary}' ends before it starts")]
    EndBeforeStart { summary: String },
}

/// A calendar event boundary: either a bare date or an instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventBoundary {
    pub date: Option<NaiveDate>,
    #[serde(rename = "dateTime")]
    pub date_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawCalendarEvent {
    pub status: String,
    pub summary: String,
    pub start: EventBoundary,
    pub end: EventBoundary,
}

impl TryFrom<RawCalendarEvent> for CalendarEvent {
    type Error = PayloadError;

    fn try_from(raw: RawCalendarEvent) -> Result<Self, Self::Error> {
        let span = match (raw.start.date_time, raw.start.date) {
            (Some(start), _) => {
                let Some(end) = raw.end.date_time else {
                    return Err(PayloadError::MissingEnd {
                        summary: raw.summary,
                    });
                };
                if end < start {
                    return Err(PayloadError::EndBeforeStart {
                        summary: raw.summary,
                    });
                }
                EventSpan::Timed { start, end }
            }
            (None, Some(start)) => EventSpan::AllDay {
                start,
                end: raw.end.date,
            },
            (None, None) => {
                return Err(PayloadError::MissingStart {
                    summary: raw.summary,
                });
            }
        };

        Ok(Self {
            status: raw.status,
            summary: raw.summary,
            span,
        })
    }
}

/// Validates a page of raw events.
pub fn calendar_events(raw: Vec<RawCalendarEvent>) -> Result<Vec<CalendarEvent>, PayloadError> {
    raw.into_iter().map(CalendarEvent::try_from).collect()
}

/// Reference to another object by string id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawReference {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawIncident {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub html_url: String,
    pub resolved_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawIncidentLog {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub summary: String,
    pub agent: RawReference,
    pub created_at: DateTime<FixedOffset>,
}

impl From<RawIncidentLog> for IncidentLog {
    fn from(raw: RawIncidentLog) -> Self {
        Self {
            id: raw.id,
            kind: raw.kind,
            summary: raw.summary,
            agent_id: raw.agent.id,
            created_at: raw.created_at,
        }
    }
}

impl RawIncident {
    /// Attaches the incident's log entries.
    pub fn with_logs(self, logs: Vec<RawIncidentLog>) -> Incident {
        Incident {
            id: self.id,
            title: self.title,
            summary: self.summary,
            html_url: self.html_url,
            resolved_at: self.resolved_at,
            logs: logs.into_iter().map(IncidentLog::from).collect(),
        }
    }
}

/// Reference to another object by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RawNumericReference {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTimeEntry {
    pub id: u64,
    pub spent_date: NaiveDate,
    pub hours: f64,
    pub project: RawNumericReference,
    pub task: RawNumericReference,
    pub notes: Option<String>,
}

impl From<RawTimeEntry> for TimeEntry {
    fn from(raw: RawTimeEntry) -> Self {
        Self {
            id: raw.id,
            spent_date: raw.spent_date,
            hours: raw.hours,
            project_id: raw.project.id,
            task_id: raw.task.id,
            notes: raw.notes,
        }
    }
}
