//! Calendar events.

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;

/// The only event status that produces a timesheet entry.
pub const CONFIRMED: &str = "confirmed";

/// When an event happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSpan {
    /// An all-day event, carrying dates only.
    AllDay {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
    /// A timed event. `end` is never before `start`.
    Timed {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

/// A calendar event in the reconciled week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub status: String,
    pub summary: String,
    pub span: EventSpan,
}

impl CalendarEvent {
    pub const fn is_all_day(&self) -> bool {
        matches!(self.span, EventSpan::AllDay { .. })
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == CONFIRMED
    }

    /// The day the event starts on, as seen in `tz`.
    pub fn start_date(&self, tz: Tz) -> NaiveDate {
        match &self.span {
            EventSpan::AllDay { start, .. } => *start,
            EventSpan::Timed { start, .. } => start.with_timezone(&tz).date_naive(),
        }
    }

    /// Length in fractional hours; `None` for all-day events.
    #[allow(clippy::cast_precision_loss)]
    pub fn hours(&self) -> Option<f64> {
        match &self.span {
            EventSpan::AllDay { .. } => None,
            EventSpan::Timed { start, end } => {
                Some((*end - *start).num_milliseconds() as f64 / 3_600_000.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn timed(start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            status: CONFIRMED.to_string(),
            summary: "Design review".to_string(),
            span: EventSpan::Timed {
                start: instant(start),
                end: instant(end),
            },
        }
    }

    #[test]
    fn timed_event_hours_are_fractional() {
        let event = timed("2025-01-06T09:00:00+13:00", "2025-01-06T10:30:00+13:00");
        assert_eq!(event.hours(), Some(1.5));
        assert!(!event.is_all_day());
    }

    #[test]
    fn all_day_event_has_no_hours() {
        let event = CalendarEvent {
            status: CONFIRMED.to_string(),
            summary: "Offsite".to_string(),
            span: EventSpan::AllDay {
                start: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 1, 7),
            },
        };
        assert!(event.is_all_day());
        assert_eq!(event.hours(), None);
    }

    #[test]
    fn start_date_is_taken_in_requested_timezone() {
        // 20:00 UTC on the 5th is 09:00 on the 6th in Auckland.
        let event = timed("2025-01-05T20:00:00Z", "2025-01-05T21:00:00Z");
        assert_eq!(
            event.start_date(chrono_tz::Pacific::Auckland),
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
        );
        assert_eq!(
            event.start_date(chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
        );
    }

    #[test]
    fn only_confirmed_status_is_confirmed() {
        let mut event = timed("2025-01-06T09:00:00Z", "2025-01-06T10:00:00Z");
        assert!(event.is_confirmed());
        event.status = "tentative".to_string();
        assert!(!event.is_confirmed());
    }
}
