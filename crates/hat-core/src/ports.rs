//! Interfaces to the external services the run reads from and writes to.
//!
//! Implementations live in `hat-clients`; tests use in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use crate::entry::{NewEntrySpec, TimeEntry};
use crate::event::CalendarEvent;
use crate::incident::Incident;
use crate::task::NoteKind;

/// Error returned by any collaborator.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Read-only access to a calendar.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Events overlapping `[time_min, time_max]`, reported in `tz`.
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Tz>,
        time_max: DateTime<Tz>,
        tz: Tz,
    ) -> Result<Vec<CalendarEvent>, SourceError>;
}

/// Read-only access to resolved on-call incidents.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Resolved incidents in `[since, until)` that `user_id` acted on,
    /// with their log entries attached.
    async fn list_resolved_incidents(
        &self,
        user_id: &str,
        since: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> Result<Vec<Incident>, SourceError>;
}

/// The time-tracking service.
#[async_trait]
pub trait Timesheet: Send + Sync {
    /// Entries spent between `from` and `to`, inclusive.
    async fn list_time_entries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>, SourceError>;

    async fn create_time_entry(&self, entry: &NewEntrySpec) -> Result<TimeEntry, SourceError>;

    async fn delete_time_entry(&self, id: u64) -> Result<(), SourceError>;
}

/// Provider of free text for entry notes.
#[async_trait]
pub trait NoteSource: Send + Sync {
    async fn note(&self, kind: NoteKind) -> Result<String, SourceError>;
}
