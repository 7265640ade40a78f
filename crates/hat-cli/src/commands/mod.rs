//! CLI subcommand implementations.

pub mod clean;
pub mod run;
pub mod week;

use chrono::NaiveDate;
use hat_core::week::today_in;
use hat_core::{HolidaySet, WeekWindow};

use crate::Config;

/// The given date, or today in the configured timezone.
fn reference_date(config: &Config, date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| today_in(config.timezone))
}

/// Holidays covering the window, including configured extra dates.
fn holidays_for(config: &Config, window: &WeekWindow) -> HolidaySet {
    HolidaySet::for_window(window, config.holiday_subdivision)
        .with_extra(config.extra_holidays.iter().copied())
}
