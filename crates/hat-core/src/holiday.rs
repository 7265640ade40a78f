//! Public holiday lookup.
//!
//! The reconciliation engine only needs a membership test, expressed by the
//! [`HolidayCalendar`] trait. [`HolidaySet`] is the precomputed calendar used
//! in production: New Zealand national holidays, optionally with a regional
//! anniversary day, plus any configured extra dates.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::week::WeekWindow;

/// Membership test for non-working public holidays.
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

impl<F> HolidayCalendar for F
where
    F: Fn(NaiveDate) -> bool,
{
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self(date)
    }
}

/// Regions with their own anniversary holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subdivision {
    Auckland,
}

impl Subdivision {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Auckland => "AUK",
        }
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Subdivision {
    type Err = UnknownSubdivision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AUK" | "AUCKLAND" => Ok(Self::Auckland),
            _ => Err(UnknownSubdivision(s.to_string())),
        }
    }
}

impl TryFrom<String> for Subdivision {
    type Error = UnknownSubdivision;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subdivision> for String {
    fn from(subdivision: Subdivision) -> Self {
        subdivision.code().to_string()
    }
}

/// Error type for unknown subdivision codes.
#[derive(Debug, Clone)]
pub struct UnknownSubdivision(String);

impl fmt::Display for UnknownSubdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown holiday subdivision: {}", self.0)
    }
}

impl std::error::Error for UnknownSubdivision {}

/// A precomputed set of holiday dates with their names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeMap<NaiveDate, String>,
}

impl HolidayCalendar for HolidaySet {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains_key(&date)
    }
}

impl HolidaySet {
    /// New Zealand holidays for the given years.
    pub fn new_zealand(
        years: impl IntoIterator<Item = i32>,
        subdivision: Option<Subdivision>,
    ) -> Self {
        let mut set = Self::default();
        for year in years {
            set.add_new_zealand_year(year);
            if subdivision == Some(Subdivision::Auckland) {
                if let Some(day) = auckland_anniversary(year) {
                    set.insert(day, "Auckland Anniversary Day");
                }
            }
        }
        set
    }

    /// New Zealand holidays covering every year the window touches.
    pub fn for_window(window: &WeekWindow, subdivision: Option<Subdivision>) -> Self {
        Self::new_zealand(window.first().year()..=window.last().year(), subdivision)
    }

    /// Adds extra non-working dates.
    #[must_use]
    pub fn with_extra(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        for date in dates {
            self.insert(date, "Company holiday");
        }
        self
    }

    /// Adds a holiday, keeping the first name recorded for a date.
    pub fn insert(&mut self, date: NaiveDate, name: impl Into<String>) {
        self.dates.entry(date).or_insert_with(|| name.into());
    }

    pub fn name(&self, date: NaiveDate) -> Option<&str> {
        self.dates.get(&date).map(String::as_str)
    }

    /// Holidays in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.dates.iter().map(|(date, name)| (*date, name.as_str()))
    }

    fn add_new_zealand_year(&mut self, year: i32) {
        if let Some(new_year) = ymd(year, 1, 1) {
            self.add_pair(new_year, "New Year's Day", "Day after New Year's Day");
        }
        if let Some(waitangi) = ymd(year, 2, 6) {
            self.add_mondayised(waitangi, "Waitangi Day");
        }
        if let Some(easter) = easter_sunday(year) {
            self.insert(easter - Duration::days(2), "Good Friday");
            self.insert(easter + Duration::days(1), "Easter Monday");
        }
        if let Some(anzac) = ymd(year, 4, 25) {
            self.add_mondayised(anzac, "ANZAC Day");
        }
        if let Some(birthday) = NaiveDate::from_weekday_of_month_opt(year, 6, Weekday::Mon, 1) {
            let name = if year >= 2023 {
                "King's Birthday"
            } else {
                "Queen's Birthday"
            };
            self.insert(birthday, name);
        }
        if let Some(matariki) = matariki(year) {
            self.insert(matariki, "Matariki");
        }
        if let Some(labour) = NaiveDate::from_weekday_of_month_opt(year, 10, Weekday::Mon, 4) {
            self.insert(labour, "Labour Day");
        }
        if let Some(christmas) = ymd(year, 12, 25) {
            self.add_pair(christmas, "Christmas Day", "Boxing Day");
        }
    }

    /// Adds a holiday that moves to the following Monday when on a weekend.
    fn add_mondayised(&mut self, date: NaiveDate, name: &str) {
        self.insert(date, name);
        let shift = match date.weekday() {
            Weekday::Sat => 2,
            Weekday::Sun => 1,
            _ => return,
        };
        self.insert(date + Duration::days(shift), format!("{name} (observed)"));
    }

    /// Adds two consecutive holidays whose weekend dates move to the next
    /// free weekdays (Christmas/Boxing Day, New Year's Day/2 January).
    fn add_pair(&mut self, first: NaiveDate, first_name: &str, second_name: &str) {
        let second = first + Duration::days(1);
        self.insert(first, first_name);
        self.insert(second, second_name);

        let (first_observed, second_observed) = match first.weekday() {
            Weekday::Fri => (None, Some(first + Duration::days(3))),
            Weekday::Sat => (
                Some(first + Duration::days(2)),
                Some(first + Duration::days(3)),
            ),
            Weekday::Sun => (Some(first + Duration::days(2)), None),
            _ => (None, None),
        };
        if let Some(day) = first_observed {
            self.insert(day, format!("{first_name} (observed)"));
        }
        if let Some(day) = second_observed {
            self.insert(day, format!("{second_name} (observed)"));
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Easter Sunday by the anonymous Gregorian algorithm.
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Matariki public holiday, as scheduled by legislation through 2052.
fn matariki(year: i32) -> Option<NaiveDate> {
    let (month, day) = match year {
        2022 => (6, 24),
        2023 => (7, 14),
        2024 => (6, 28),
        2025 => (6, 20),
        2026 => (7, 10),
        2027 => (6, 25),
        2028 => (7, 14),
        2029 => (7, 6),
        2030 => (6, 21),
        2031 => (7, 11),
        2032 => (7, 2),
        2033 => (6, 24),
        2034 => (7, 7),
        2035 => (6, 29),
        2036 => (7, 18),
        2037 => (7, 10),
        2038 => (6, 25),
        2039 => (7, 15),
        2040 => (7, 6),
        2041 => (7, 19),
        2042 => (7, 11),
        2043 => (7, 3),
        2044 => (6, 24),
        2045 => (7, 7),
        2046 => (6, 29),
        2047 => (7, 19),
        2048 => (7, 3),
        2049 => (6, 25),
        2050 => (7, 15),
        2051 => (6, 30),
        2052 => (6, 21),
        _ => return None,
    };
    ymd(year, month, day)
}

/// Monday closest to 29 January.
fn auckland_anniversary(year: i32) -> Option<NaiveDate> {
    let anchor = ymd(year, 1, 29)?;
    let offset = i64::from(anchor.weekday().num_days_from_monday());
    if offset <= 3 {
        Some(anchor - Duration::days(offset))
    } else {
        Some(anchor + Duration::days(7 - offset))
    }
}
