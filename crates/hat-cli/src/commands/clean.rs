//! Clean command: deletes a week's time entries.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use hat_clients::HarvestClient;
use hat_core::{Timesheet, clean_week};

use super::reference_date;
use crate::Config;

pub async fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    date: Option<NaiveDate>,
    dry_run: bool,
) -> Result<()> {
    let (account_id, access_token) = config.harvest_credentials()?;
    let timesheet = HarvestClient::new(account_id, access_token)
        .context("failed to create Harvest client")?;
    execute(writer, &timesheet, reference_date(config, date), dry_run).await
}

/// Cleans the week containing `reference` and prints what was removed.
pub async fn execute<W: Write>(
    writer: &mut W,
    timesheet: &dyn Timesheet,
    reference: NaiveDate,
    dry_run: bool,
) -> Result<()> {
    let entries = clean_week(timesheet, reference, dry_run)
        .await
        .context("cleanup failed")?;

    if entries.is_empty() {
        writeln!(writer, "No time entries found.")?;
        return Ok(());
    }
    for entry in &entries {
        writeln!(
            writer,
            "{}  {:>5.2}  #{}",
            entry.spent_date, entry.hours, entry.id
        )?;
    }
    let verb = if dry_run { "Would delete" } else { "Deleted" };
    writeln!(writer, "{verb} {} entries.", entries.len())?;
    Ok(())
}
