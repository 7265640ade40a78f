//! Core domain logic for the weekly timesheet autofill.
//!
//! This crate contains:
//! - Split: random partition of remaining hours
//! - Week: the Monday to Friday window and holiday calendar
//! - Reconcile: turning events, incidents and existing entries into new entries
//! - Run: the fetch, reconcile, submit sequence over collaborator ports

pub mod entry;
pub mod event;
pub mod holiday;
pub mod incident;
pub mod payload;
pub mod ports;
pub mod reconcile;
mod run;
pub mod split;
pub mod task;
pub mod week;

pub use entry::{NewEntrySpec, TimeEntry};
pub use event::{CalendarEvent, EventSpan};
pub use holiday::{HolidayCalendar, HolidaySet, Subdivision};
pub use incident::{Incident, IncidentLog};
pub use payload::PayloadError;
pub use ports::{CalendarSource, IncidentSource, NoteSource, SourceError, Timesheet};
pub use reconcile::{DAILY_TARGET_HOURS, MeetingRules};
pub use run::{
    Collaborators, IncidentFeed, RunError, RunReport, RunSettings, clean_week, run_week,
};
pub use split::{SplitError, split};
pub use task::{NoteKind, Project, Task};
pub use week::WeekWindow;
