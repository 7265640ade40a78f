//! Time entries read from and written to the timesheet.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::task::{Project, Task};

/// An entry already recorded in the timesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub id: u64,
    pub spent_date: NaiveDate,
    pub hours: f64,
    pub project_id: u64,
    pub task_id: u64,
    pub notes: Option<String>,
}

/// An entry the run wants to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntrySpec {
    pub date: NaiveDate,
    pub project: Project,
    pub task: Task,
    pub hours: f64,
    pub note: String,
}

impl NewEntrySpec {
    /// Builds an entry booked to `task` under its owning project.
    pub fn new(date: NaiveDate, task: Task, hours: f64, note: impl Into<String>) -> Self {
        Self {
            date,
            project: task.project(),
            task,
            hours,
            note: note.into(),
        }
    }

    pub const fn project_id(&self) -> u64 {
        self.project.id()
    }

    pub const fn task_id(&self) -> u64 {
        self.task.id()
    }
}

/// Total recorded hours per date.
pub fn hours_by_day(entries: &[TimeEntry]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.spent_date).or_insert(0.0) += entry.hours;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, day: u32, hours: f64) -> TimeEntry {
        TimeEntry {
            id,
            spent_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            hours,
            project_id: 1,
            task_id: 2,
            notes: None,
        }
    }

    #[test]
    fn hours_are_grouped_by_date() {
        let totals = hours_by_day(&[entry(1, 6, 2.5), entry(2, 6, 1.0), entry(3, 7, 8.0)]);
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        assert_eq!(totals.get(&monday), Some(&3.5));
        assert_eq!(totals.get(&tuesday), Some(&8.0));
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn new_entry_takes_project_from_task() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let entry = NewEntrySpec::new(date, Task::PublicHoliday, 8.0, "Public holiday");
        assert_eq!(entry.project, Project::Leave);
        assert_eq!(entry.project_id(), Project::Leave.id());
        assert_eq!(entry.task_id(), Task::PublicHoliday.id());
    }
}
