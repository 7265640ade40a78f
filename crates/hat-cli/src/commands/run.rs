//! Run command: fills a week of the timesheet.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use hat_clients::{GoogleCalendarClient, HarvestClient, NoteClient, PagerDutyClient};
use hat_core::reconcile::IncidentSkip;
use hat_core::{
    Collaborators, HolidayCalendar, IncidentFeed, RunReport, RunSettings, WeekWindow, run_week,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{holidays_for, reference_date};
use crate::Config;

/// Options from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub date: Option<NaiveDate>,
    pub dry_run: bool,
    pub seed: Option<u64>,
}

pub async fn run<W: Write>(writer: &mut W, config: &Config, options: RunOptions) -> Result<()> {
    let (account_id, access_token) = config.harvest_credentials()?;
    let timesheet = HarvestClient::new(account_id, access_token)
        .context("failed to create Harvest client")?;
    let user = timesheet
        .current_user()
        .await
        .context("failed to authenticate with Harvest")?;
    tracing::info!(user = %user.email, "filling timesheet");
    let calendar = GoogleCalendarClient::new(config.service_account_key()?)
        .context("failed to create Google Calendar client")?;
    let notes = NoteClient::new().context("failed to create note client")?;
    let pagerduty = match config.pagerduty_credentials()? {
        Some((user_id, token)) => Some((
            PagerDutyClient::new(token).context("failed to create PagerDuty client")?,
            user_id,
        )),
        None => None,
    };

    let settings = RunSettings {
        calendar_id: config.calendar_id()?.to_string(),
        timezone: config.timezone,
        reference_date: reference_date(config, options.date),
        meeting_rules: config.meeting_rules(),
        dry_run: options.dry_run,
    };
    let collaborators = Collaborators {
        calendar: &calendar,
        incidents: pagerduty
            .as_ref()
            .map(|(client, user_id)| IncidentFeed {
                source: client,
                user_id: *user_id,
            }),
        timesheet: &timesheet,
        notes: &notes,
    };
    let window = WeekWindow::containing(settings.reference_date);
    let holidays = holidays_for(config, &window);
    let closed: Vec<_> = holidays
        .iter()
        .filter(|(day, _)| window.contains(*day))
        .collect();
    tracing::debug!(count = closed.len(), days = ?closed, "holidays in window");

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    execute(writer, &collaborators, &holidays, &settings, &mut rng).await
}

/// Runs the week against the given collaborators and prints the report.
pub async fn execute<W: Write, R: Rng + ?Sized>(
    writer: &mut W,
    collaborators: &Collaborators<'_>,
    holidays: &dyn HolidayCalendar,
    settings: &RunSettings,
    rng: &mut R,
) -> Result<()> {
    let report = run_week(collaborators, holidays, settings, rng)
        .await
        .context("timesheet run failed")?;
    write_report(writer, &report, settings.dry_run)
}

fn skip_reason(reason: IncidentSkip) -> &'static str {
    match reason {
        IncidentSkip::MissingLogs => "no acknowledge or resolve log entry",
        IncidentSkip::NonPositiveDuration => "resolved before it was acknowledged",
    }
}

fn write_report<W: Write>(writer: &mut W, report: &RunReport, dry_run: bool) -> Result<()> {
    writeln!(
        writer,
        "Week {} to {}",
        report.window.first(),
        report.window.last()
    )?;

    if report.planned.is_empty() {
        writeln!(writer, "Nothing to add.")?;
    } else {
        for entry in &report.planned {
            writeln!(
                writer,
                "{}  {:<16} {:>5.2}  {}",
                entry.date,
                entry.task.name(),
                entry.hours,
                entry.note
            )?;
        }
    }

    for day in &report.complete_days {
        writeln!(writer, "{day}: already complete")?;
    }
    for (day, err) in &report.skipped_days {
        writeln!(writer, "{day}: skipped ({err})")?;
    }
    for skipped in &report.skipped_incidents {
        writeln!(
            writer,
            "Incident {}: skipped ({})",
            skipped.id,
            skip_reason(skipped.reason)
        )?;
    }

    if dry_run {
        writeln!(
            writer,
            "Dry run: {} entries planned, none submitted.",
            report.planned.len()
        )?;
    } else {
        writeln!(writer, "Submitted {} entries.", report.submitted.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use chrono_tz::Tz;
    use hat_core::{
        CalendarEvent, CalendarSource, EventSpan, MeetingRules, NewEntrySpec, NoteKind,
        NoteSource, SourceError, TimeEntry, Timesheet,
    };
    use insta::assert_snapshot;

    struct OneMeeting;

    #[async_trait]
    impl CalendarSource for OneMeeting {
        async fn list_events(
            &self,
            _calendar_id: &str,
            _time_min: DateTime<Tz>,
            _time_max: DateTime<Tz>,
            _tz: Tz,
        ) -> Result<Vec<CalendarEvent>, SourceError> {
            let start = DateTime::<FixedOffset>::parse_from_rfc3339("2025-01-06T09:00:00+13:00")?;
            let end = DateTime::<FixedOffset>::parse_from_rfc3339("2025-01-06T10:00:00+13:00")?;
            Ok(vec![CalendarEvent {
                status: "confirmed".to_string(),
                summary: "Planning".to_string(),
                span: EventSpan::Timed { start, end },
            }])
        }
    }

    /// Timesheet with every day but Monday already full.
    #[derive(Default)]
    struct MostlyFull {
        created: Mutex<Vec<NewEntrySpec>>,
    }

    #[async_trait]
    impl Timesheet for MostlyFull {
        async fn list_time_entries(
            &self,
            from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<TimeEntry>, SourceError> {
            Ok((1..5)
                .map(|offset| TimeEntry {
                    id: offset,
                    spent_date: from + chrono::Duration::days(i64::try_from(offset).unwrap()),
                    hours: 8.0,
                    project_id: 1,
                    task_id: 2,
                    notes: None,
                })
                .collect())
        }

        async fn create_time_entry(&self, entry: &NewEntrySpec) -> Result<TimeEntry, SourceError> {
            let mut created = self.created.lock().unwrap();
            created.push(entry.clone());
            Ok(TimeEntry {
                id: 100 + created.len() as u64,
                spent_date: entry.date,
                hours: entry.hours,
                project_id: entry.project_id(),
                task_id: entry.task_id(),
                notes: Some(entry.note.clone()),
            })
        }

        async fn delete_time_entry(&self, _id: u64) -> Result<(), SourceError> {
            Ok(())
        }
    }

    struct CannedNotes;

    #[async_trait]
    impl NoteSource for CannedNotes {
        async fn note(&self, kind: NoteKind) -> Result<String, SourceError> {
            Ok(format!("a {kind}"))
        }
    }

    fn settings(dry_run: bool) -> RunSettings {
        RunSettings {
            calendar_id: "team".to_string(),
            timezone: chrono_tz::Pacific::Auckland,
            reference_date: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            meeting_rules: MeetingRules::default(),
            dry_run,
        }
    }

    fn no_holidays(_: NaiveDate) -> bool {
        false
    }

    async fn render(timesheet: &MostlyFull, dry_run: bool) -> String {
        let collaborators = Collaborators {
            calendar: &OneMeeting,
            incidents: None,
            timesheet,
            notes: &CannedNotes,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut output = Vec::new();
        execute(&mut output, &collaborators, &no_holidays, &settings(dry_run), &mut rng)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn dry_run_lists_plan_without_submitting() {
        let timesheet = MostlyFull::default();
        let output = render(&timesheet, true).await;

        assert!(timesheet.created.lock().unwrap().is_empty());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Week 2025-01-06 to 2025-01-10");
        assert_eq!(lines[1], "2025-01-06  Internal Meeting  1.00  Planning");
        assert!(lines[2].starts_with("2025-01-06  Engineering"));
        assert!(lines[2].ends_with("a joke"));
        assert!(lines[3].starts_with("2025-01-06  Code Review"));
        assert!(lines[3].ends_with("a advice"));
        assert_snapshot!(lines[4..].join("\n"), @r"
        2025-01-07: already complete
        2025-01-08: already complete
        2025-01-09: already complete
        2025-01-10: already complete
        Dry run: 3 entries planned, none submitted.
        ");
    }

    #[tokio::test]
    async fn submitted_entries_fill_monday() {
        let timesheet = MostlyFull::default();
        let output = render(&timesheet, false).await;

        let created = timesheet.created.lock().unwrap();
        assert_eq!(created.len(), 3);
        let total: f64 = created.iter().map(|entry| entry.hours).sum();
        assert!((total - 8.0).abs() < 1e-9);
        assert!(output.ends_with("Submitted 3 entries.\n"));
    }
}
