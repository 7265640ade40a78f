//! Weekly timesheet reconciliation.
//!
//! Three independent passes turn the week's inputs into new entries:
//!
//! 1. Calendar pass: every confirmed, timed, non-holiday event becomes a
//!    meeting entry.
//! 2. Daily fill: each weekday is either a public holiday (one 8 hour entry),
//!    already complete, or has its remaining hours split across
//!    [`FILL_TARGETS`].
//! 3. Incident pass: each resolved incident with both an acknowledge and a
//!    resolve log becomes an on-call entry, on top of the daily total.

use chrono::NaiveDate;
use chrono_tz::Tz;
use rand::Rng;

use crate::entry::NewEntrySpec;
use crate::event::CalendarEvent;
use crate::holiday::HolidayCalendar;
use crate::incident::Incident;
use crate::split::{DEFAULT_DECIMALS, SplitError, split_with};
use crate::task::{FILL_TARGETS, FillTarget, Task};

/// Hours a working day is filled up to.
pub const DAILY_TARGET_HOURS: f64 = 8.0;

/// Note on public holiday entries.
pub const PUBLIC_HOLIDAY_NOTE: &str = "Public holiday";

/// How meetings are booked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingRules {
    /// Summary keywords (case-insensitive) that mark a scrum ceremony.
    /// Empty means every meeting is an internal meeting.
    pub scrum_keywords: Vec<String>,
}

impl MeetingRules {
    pub fn task_for(&self, summary: &str) -> Task {
        let summary = summary.to_lowercase();
        if self
            .scrum_keywords
            .iter()
            .any(|word| summary.contains(&word.to_lowercase()))
        {
            Task::ScrumCeremonies
        } else {
            Task::InternalMeeting
        }
    }
}

/// Meeting entries for the confirmed, timed events outside holidays.
pub fn calendar_entries(
    events: &[CalendarEvent],
    holidays: &dyn HolidayCalendar,
    tz: Tz,
    rules: &MeetingRules,
) -> Vec<NewEntrySpec> {
    let mut entries = Vec::new();
    for event in events {
        // All-day events are not work.
        let Some(hours) = event.hours() else {
            tracing::debug!(summary = %event.summary, "skipping all-day event");
            continue;
        };
        if !event.is_confirmed() {
            tracing::debug!(summary = %event.summary, status = %event.status, "skipping unconfirmed event");
            continue;
        }
        let date = event.start_date(tz);
        if holidays.is_holiday(date) {
            tracing::debug!(summary = %event.summary, %date, "skipping event on public holiday");
            continue;
        }
        if hours <= 0.0 {
            tracing::warn!(summary = %event.summary, %date, "skipping zero-length event");
            continue;
        }

        entries.push(NewEntrySpec::new(
            date,
            rules.task_for(&event.summary),
            hours,
            event.summary.clone(),
        ));
    }
    entries
}

/// What to book for one weekday.
#[derive(Debug, Clone, PartialEq)]
pub enum DayPlan {
    /// Public holiday: the single entry for the day.
    Holiday(NewEntrySpec),
    /// The day already has at least [`DAILY_TARGET_HOURS`] recorded.
    Complete { recorded: f64 },
    /// Remaining hours, one share per fill target in order.
    Fill(Vec<FillShare>),
}

/// A fill target's share of a day's remaining hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillShare {
    pub target: FillTarget,
    pub hours: f64,
}

impl FillShare {
    pub fn into_entry(self, date: NaiveDate, note: impl Into<String>) -> NewEntrySpec {
        NewEntrySpec::new(date, self.target.task, self.hours, note)
    }
}

/// Decides what one weekday needs given the hours already recorded for it.
///
/// Fails only when the remainder is too small to give every fill target a
/// positive share; the caller skips that day.
pub fn plan_day<R: Rng + ?Sized>(
    day: NaiveDate,
    recorded: f64,
    holidays: &dyn HolidayCalendar,
    rng: &mut R,
) -> Result<DayPlan, SplitError> {
    if holidays.is_holiday(day) {
        return Ok(DayPlan::Holiday(NewEntrySpec::new(
            day,
            Task::PublicHoliday,
            DAILY_TARGET_HOURS,
            PUBLIC_HOLIDAY_NOTE,
        )));
    }
    if recorded >= DAILY_TARGET_HOURS {
        return Ok(DayPlan::Complete { recorded });
    }

    let remaining = DAILY_TARGET_HOURS - recorded;
    let hours = split_with(remaining, FILL_TARGETS.len(), DEFAULT_DECIMALS, rng)?;
    Ok(DayPlan::Fill(
        FILL_TARGETS
            .iter()
            .zip(hours)
            .map(|(target, hours)| FillShare {
                target: *target,
                hours,
            })
            .collect(),
    ))
}

/// Why an incident produced no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentSkip {
    /// No acknowledge or no resolve log entry.
    MissingLogs,
    /// Resolved at or before acknowledgement.
    NonPositiveDuration,
}

/// An incident left out of the timesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedIncident {
    pub id: String,
    pub reason: IncidentSkip,
}

/// Output of the incident pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentPass {
    pub entries: Vec<NewEntrySpec>,
    pub skipped: Vec<SkippedIncident>,
}

/// On-call entries for resolved incidents, dated by resolution day in `tz`.
#[allow(clippy::cast_precision_loss)]
pub fn incident_entries(incidents: &[Incident], tz: Tz) -> IncidentPass {
    let mut pass = IncidentPass::default();
    for incident in incidents {
        let Some(duration) = incident.duration() else {
            tracing::warn!(incident = %incident.id, "incident is missing an acknowledge or resolve log, skipping");
            pass.skipped.push(SkippedIncident {
                id: incident.id.clone(),
                reason: IncidentSkip::MissingLogs,
            });
            continue;
        };
        let hours = duration.num_milliseconds() as f64 / 3_600_000.0;
        if hours <= 0.0 {
            tracing::warn!(incident = %incident.id, "incident resolved before it was acknowledged, skipping");
            pass.skipped.push(SkippedIncident {
                id: incident.id.clone(),
                reason: IncidentSkip::NonPositiveDuration,
            });
            continue;
        }

        pass.entries.push(NewEntrySpec::new(
            incident.resolved_date(tz),
            Task::OnCall,
            hours,
            incident.note(),
        ));
    }
    pass
}
