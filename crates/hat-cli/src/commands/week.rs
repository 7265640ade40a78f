//! Week command: shows the workdays the run would fill.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use hat_core::{HolidaySet, WeekWindow};

use super::{holidays_for, reference_date};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, date: Option<NaiveDate>) -> Result<()> {
    let window = WeekWindow::containing(reference_date(config, date));
    let holidays = holidays_for(config, &window);
    write_week(writer, &window, &holidays)
}

fn write_week<W: Write>(writer: &mut W, window: &WeekWindow, holidays: &HolidaySet) -> Result<()> {
    writeln!(writer, "Week {} to {}", window.first(), window.last())?;
    for day in window.days() {
        match holidays.name(*day) {
            Some(name) => writeln!(writer, "{} {day}  holiday: {name}", day.format("%a"))?,
            None => writeln!(writer, "{} {day}  workday", day.format("%a"))?,
        }
    }
    Ok(())
}
