//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Weekly Harvest timesheet autofill.
///
/// Books calendar meetings, public holidays and on-call incidents, then
/// tops each workday up to eight hours.
#[derive(Debug, Parser)]
#[command(name = "hat", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fill the timesheet for a week.
    Run {
        /// Any date in the week to fill (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the planned entries without submitting them.
        #[arg(long)]
        dry_run: bool,

        /// Seed for the hour split, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Delete every time entry in a week.
    Clean {
        /// Any date in the week to clean (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// List the entries without deleting them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the workdays and holidays of a week.
    Week {
        /// Any date in the week (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_date_seed_and_dry_run() {
        let cli = Cli::try_parse_from([
            "hat", "run", "--date", "2025-01-08", "--seed", "42", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run { date, dry_run, seed }) => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 8));
                assert!(dry_run);
                assert_eq!(seed, Some(42));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn invalid_date_is_rejected() {
        assert!(Cli::try_parse_from(["hat", "week", "--date", "08/01/2025"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["hat", "clean", "-v", "-c", "/tmp/hat.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/hat.toml")));
    }
}
