//! Harvest projects and tasks the timesheet books against.
//!
//! The set is closed: adding a task kind means adding a variant, and every
//! match over it must be updated.
//!
//! Only the Eyecue General project and the Engineering and Internal Meeting
//! tasks carry real Harvest ids. The other ids are placeholders and must be
//! replaced with the account's own ids before those entries are submitted.

use std::fmt;

use serde::Serialize;

/// Harvest projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Project {
    /// Day-to-day engineering and on-call work.
    General,
    /// Internal meetings and ceremonies. Placeholder id.
    Internal,
    /// Leave and public holidays. Placeholder id.
    Leave,
}

impl Project {
    /// Harvest project id.
    pub const fn id(self) -> u64 {
        match self {
            Self::General => 43_607_407,
            // Placeholders.
            Self::Internal => 43_607_455,
            Self::Leave => 43_607_490,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "Eyecue General",
            Self::Internal => "FM Internal",
            Self::Leave => "Leave",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Harvest tasks, each assigned to exactly one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Engineering,
    CodeReview,
    InternalMeeting,
    ScrumCeremonies,
    OnCall,
    PublicHoliday,
}

impl Task {
    /// Harvest task id.
    pub const fn id(self) -> u64 {
        match self {
            Self::Engineering => 22_157_391,
            Self::InternalMeeting => 22_157_751,
            // Placeholders.
            Self::CodeReview => 22_157_402,
            Self::ScrumCeremonies => 22_157_760,
            Self::OnCall => 22_157_812,
            Self::PublicHoliday => 22_157_903,
        }
    }

    pub const fn project(self) -> Project {
        match self {
            Self::Engineering | Self::CodeReview | Self::OnCall => Project::General,
            Self::InternalMeeting | Self::ScrumCeremonies => Project::Internal,
            Self::PublicHoliday => Project::Leave,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Engineering => "Engineering",
            Self::CodeReview => "Code Review",
            Self::InternalMeeting => "Internal Meeting",
            Self::ScrumCeremonies => "Scrum Ceremonies",
            Self::OnCall => "On Call",
            Self::PublicHoliday => "Public Holiday",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the note text for a filled entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Joke,
    Advice,
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Joke => "joke",
            Self::Advice => "advice",
        };
        f.write_str(s)
    }
}

/// A task that receives a share of a day's unbooked hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTarget {
    pub task: Task,
    pub note: NoteKind,
}

/// Tasks that split the unbooked remainder of each working day, in order.
pub const FILL_TARGETS: [FillTarget; 2] = [
    FillTarget {
        task: Task::Engineering,
        note: NoteKind::Joke,
    },
    FillTarget {
        task: Task::CodeReview,
        note: NoteKind::Advice,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TASKS: [Task; 6] = [
        Task::Engineering,
        Task::CodeReview,
        Task::InternalMeeting,
        Task::ScrumCeremonies,
        Task::OnCall,
        Task::PublicHoliday,
    ];

    #[test]
    fn task_ids_are_unique() {
        let mut ids: Vec<u64> = ALL_TASKS.iter().map(|task| task.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ALL_TASKS.len());
    }

    #[test]
    fn engineering_books_to_general_project() {
        assert_eq!(Task::Engineering.id(), 22_157_391);
        assert_eq!(Task::Engineering.project(), Project::General);
        assert_eq!(Project::General.id(), 43_607_407);
    }

    #[test]
    fn real_harvest_ids_are_pinned() {
        assert_eq!(Project::General.id(), 43_607_407);
        assert_eq!(Task::Engineering.id(), 22_157_391);
        assert_eq!(Task::InternalMeeting.id(), 22_157_751);
    }

    #[test]
    fn fill_targets_stay_in_general_project() {
        for target in FILL_TARGETS {
            assert_eq!(target.task.project(), Project::General);
        }
    }

    #[test]
    fn display_uses_harvest_names() {
        assert_eq!(Task::InternalMeeting.to_string(), "Internal Meeting");
        assert_eq!(Project::Leave.to_string(), "Leave");
        assert_eq!(NoteKind::Advice.to_string(), "advice");
    }
}
