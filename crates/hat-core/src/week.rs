//! Monday to Friday working window.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Number of working days in a window.
pub const WORKDAYS: usize = 5;

/// Returns the Monday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Returns the Sunday on or after `date`.
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

/// Today's date as seen in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Resolves a wall-clock time on `date` in `tz`.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
/// fall in a DST gap move forward an hour.
pub fn local_datetime(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// The five consecutive weekdays of one calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    days: [NaiveDate; WORKDAYS],
}

impl WeekWindow {
    /// Window for the week containing `reference`.
    ///
    /// Weekend references map to the Monday to Friday just before them.
    pub fn containing(reference: NaiveDate) -> Self {
        let monday = start_of_week(reference);
        let mut days = [monday; WORKDAYS];
        for (slot, day) in days.iter_mut().zip(monday.iter_days()) {
            *slot = day;
        }
        Self { days }
    }

    pub const fn days(&self) -> &[NaiveDate; WORKDAYS] {
        &self.days
    }

    /// Monday.
    pub const fn first(&self) -> NaiveDate {
        self.days[0]
    }

    /// Friday.
    pub const fn last(&self) -> NaiveDate {
        self.days[WORKDAYS - 1]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    /// Calendar query bounds: Monday 00:00 to Friday 23:59 in `tz`.
    pub fn event_bounds(&self, tz: Tz) -> (DateTime<Tz>, DateTime<Tz>) {
        (
            local_datetime(tz, self.first(), NaiveTime::MIN),
            local_datetime(tz, self.last(), end_of_workday()),
        )
    }

    /// Incident query bounds: Monday 00:00 to Saturday 00:00 in `tz`.
    pub fn incident_bounds(&self, tz: Tz) -> (DateTime<Tz>, DateTime<Tz>) {
        (
            local_datetime(tz, self.first(), NaiveTime::MIN),
            local_datetime(tz, self.last() + Duration::days(1), NaiveTime::MIN),
        )
    }
}

fn end_of_workday() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}
