//! Weekly run: fetch, reconcile, submit.
//!
//! Collaborators are queried once each, in a fixed order, and every entry is
//! submitted sequentially. The first collaborator failure aborts the run;
//! entries submitted before it stay in the timesheet.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rand::Rng;
use thiserror::Error;

use crate::entry::{NewEntrySpec, TimeEntry, hours_by_day};
use crate::holiday::HolidayCalendar;
use crate::ports::{CalendarSource, IncidentSource, NoteSource, SourceError, Timesheet};
use crate::reconcile::{
    DAILY_TARGET_HOURS, DayPlan, MeetingRules, SkippedIncident, calendar_entries,
    incident_entries, plan_day,
};
use crate::split::SplitError;
use crate::task::{NoteKind, Task};
use crate::week::{WeekWindow, end_of_week, start_of_week};

/// Run errors. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to list calendar events")]
    Calendar(#[source] SourceError),

    #[error("failed to list resolved incidents")]
    Incidents(#[source] SourceError),

    #[error("failed to list time entries")]
    ListEntries(#[source] SourceError),

    #[error("failed to fetch {kind} note")]
    Note {
        kind: NoteKind,
        #[source]
        source: SourceError,
    },

    #[error("failed to create {task} entry on {date}")]
    Submit {
        date: NaiveDate,
        task: Task,
        #[source]
        source: SourceError,
    },

    #[error("failed to delete time entry {id}")]
    Delete {
        id: u64,
        #[source]
        source: SourceError,
    },
}

/// Incident source together with the user whose incidents count.
#[derive(Clone, Copy)]
pub struct IncidentFeed<'a> {
    pub source: &'a dyn IncidentSource,
    pub user_id: &'a str,
}

/// The services a run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub calendar: &'a dyn CalendarSource,
    /// Without a feed the incident pass is skipped.
    pub incidents: Option<IncidentFeed<'a>>,
    pub timesheet: &'a dyn Timesheet,
    pub notes: &'a dyn NoteSource,
}

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub calendar_id: String,
    /// Timezone that defines day boundaries for every source.
    pub timezone: Tz,
    /// Any date in the week to reconcile.
    pub reference_date: NaiveDate,
    pub meeting_rules: MeetingRules,
    /// Plan entries without submitting them.
    pub dry_run: bool,
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    pub window: WeekWindow,
    /// Every entry the run planned, in submission order.
    pub planned: Vec<NewEntrySpec>,
    /// Entries the timesheet accepted. Empty on a dry run.
    pub submitted: Vec<TimeEntry>,
    /// Days that already had a full day recorded.
    pub complete_days: Vec<NaiveDate>,
    /// Days whose remainder could not be split.
    pub skipped_days: Vec<(NaiveDate, SplitError)>,
    pub skipped_incidents: Vec<SkippedIncident>,
}

impl RunReport {
    /// Planned hours per date.
    pub fn planned_hours(&self) -> BTreeMap<NaiveDate, f64> {
        let mut totals = BTreeMap::new();
        for entry in &self.planned {
            *totals.entry(entry.date).or_insert(0.0) += entry.hours;
        }
        totals
    }
}

/// Reconciles the week containing `settings.reference_date`.
pub async fn run_week<R: Rng + ?Sized>(
    collaborators: &Collaborators<'_>,
    holidays: &dyn HolidayCalendar,
    settings: &RunSettings,
    rng: &mut R,
) -> Result<RunReport, RunError> {
    let tz = settings.timezone;
    let window = WeekWindow::containing(settings.reference_date);
    tracing::info!(start = %window.first(), end = %window.last(), %tz, "reconciling week");

    let (time_min, time_max) = window.event_bounds(tz);
    let events = collaborators
        .calendar
        .list_events(&settings.calendar_id, time_min, time_max, tz)
        .await
        .map_err(RunError::Calendar)?;
    tracing::debug!(count = events.len(), "fetched calendar events");

    let incidents = match collaborators.incidents {
        Some(feed) => {
            let (since, until) = window.incident_bounds(tz);
            let incidents = feed
                .source
                .list_resolved_incidents(feed.user_id, since, until)
                .await
                .map_err(RunError::Incidents)?;
            tracing::debug!(count = incidents.len(), "fetched resolved incidents");
            incidents
        }
        None => {
            tracing::info!("no incident source configured, skipping on-call entries");
            Vec::new()
        }
    };

    let existing = collaborators
        .timesheet
        .list_time_entries(window.first(), window.last())
        .await
        .map_err(RunError::ListEntries)?;
    tracing::debug!(count = existing.len(), "fetched existing time entries");

    let mut planned = calendar_entries(&events, holidays, tz, &settings.meeting_rules);
    tracing::info!(count = planned.len(), "planned calendar entries");

    // Meetings booked by this run count towards the day's total.
    let mut recorded = hours_by_day(&existing);
    for entry in &planned {
        *recorded.entry(entry.date).or_insert(0.0) += entry.hours;
    }

    let mut complete_days = Vec::new();
    let mut skipped_days = Vec::new();
    for &day in window.days() {
        let day_recorded = recorded.get(&day).copied().unwrap_or(0.0);
        match plan_day(day, day_recorded, holidays, rng) {
            Ok(DayPlan::Holiday(entry)) => {
                tracing::info!(%day, "public holiday");
                planned.push(entry);
            }
            Ok(DayPlan::Complete { recorded }) => {
                tracing::info!(%day, recorded, "day already complete");
                complete_days.push(day);
            }
            Ok(DayPlan::Fill(shares)) => {
                for share in shares {
                    let kind = share.target.note;
                    let note = collaborators
                        .notes
                        .note(kind)
                        .await
                        .map_err(|source| RunError::Note { kind, source })?;
                    planned.push(share.into_entry(day, note));
                }
                tracing::info!(%day, remaining = DAILY_TARGET_HOURS - day_recorded, "filling remaining hours");
            }
            Err(err) => {
                tracing::warn!(%day, error = %err, "cannot split remaining hours, skipping day");
                skipped_days.push((day, err));
            }
        }
    }

    let pass = incident_entries(&incidents, tz);
    tracing::info!(
        count = pass.entries.len(),
        skipped = pass.skipped.len(),
        "planned on-call entries"
    );
    planned.extend(pass.entries);

    let mut submitted = Vec::new();
    if settings.dry_run {
        tracing::info!(count = planned.len(), "dry run, nothing submitted");
    } else {
        for entry in &planned {
            let created = collaborators
                .timesheet
                .create_time_entry(entry)
                .await
                .map_err(|source| RunError::Submit {
                    date: entry.date,
                    task: entry.task,
                    source,
                })?;
            tracing::info!(id = created.id, date = %entry.date, task = %entry.task, hours = entry.hours, "time entry added");
            submitted.push(created);
        }
    }

    Ok(RunReport {
        window,
        planned,
        submitted,
        complete_days,
        skipped_days,
        skipped_incidents: pass.skipped,
    })
}

/// Deletes every entry from Monday to Sunday of the week containing
/// `reference`. Returns the entries found.
pub async fn clean_week(
    timesheet: &dyn Timesheet,
    reference: NaiveDate,
    dry_run: bool,
) -> Result<Vec<TimeEntry>, RunError> {
    let from = start_of_week(reference);
    let to = end_of_week(reference);
    let entries = timesheet
        .list_time_entries(from, to)
        .await
        .map_err(RunError::ListEntries)?;

    if entries.is_empty() {
        tracing::info!(%from, %to, "no time entries found");
        return Ok(entries);
    }

    tracing::info!(count = entries.len(), %from, %to, "deleting time entries");
    for entry in &entries {
        if dry_run {
            tracing::info!(id = entry.id, date = %entry.spent_date, "would delete time entry");
            continue;
        }
        timesheet
            .delete_time_entry(entry.id)
            .await
            .map_err(|source| RunError::Delete {
                id: entry.id,
                source,
            })?;
        tracing::info!(id = entry.id, date = %entry.spent_date, "deleted time entry");
    }
    Ok(entries)
}
