//! Schedule item CLI commands
//!
//! A thin file-backed items provider so a schedule can be set up from the
//! command line.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{ItemId, ItemKind, ScheduleId, ScheduleItem};
use crate::storage::{Project, ScheduleItemsProvider};

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Register a schedule item
    ///
    /// Examples:
    ///   sdeps item add item1-1 "Site survey" --start 2024-03-01 --end 2024-03-05
    ///   sdeps item add m1 "Handover" --kind milestone --start 2024-06-30 --end 2024-06-30
    Add {
        /// Item ID
        id: String,

        /// Display name
        name: String,

        /// Item kind (phase, task, milestone)
        #[arg(long, short = 'k', default_value = "task")]
        kind: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },

    /// List schedule items
    List,
}

pub fn run(cmd: ItemCommands, output: &Output, schedule: Option<ScheduleId>) -> Result<()> {
    let project = Project::open_current()?;
    let schedule = project.schedule_or_default(schedule);
    output.verbose_ctx("item", &format!("Using schedule: {}", schedule));

    match cmd {
        ItemCommands::Add {
            id,
            name,
            kind,
            start,
            end,
        } => add_item(output, &project, &schedule, &id, &name, &kind, &start, &end),
        ItemCommands::List => list_items(output, &project, &schedule),
    }
}

fn parse_date(s: &str, what: &str) -> Result<NaiveDate> {
    s.trim()
        .parse()
        .with_context(|| format!("Invalid {} date '{}': expected YYYY-MM-DD", what, s))
}

#[allow(clippy::too_many_arguments)]
fn add_item(
    output: &Output,
    project: &Project,
    schedule: &ScheduleId,
    id_str: &str,
    name: &str,
    kind_str: &str,
    start_str: &str,
    end_str: &str,
) -> Result<()> {
    let id: ItemId = id_str.parse()?;
    let kind: ItemKind = kind_str.parse().map_err(anyhow::Error::msg)?;
    let start = parse_date(start_str, "start")?;
    let end = parse_date(end_str, "end")?;

    let item = ScheduleItem::new(id, name, kind, start, end);
    project.add_item(schedule, item.clone())?;

    if output.is_json() {
        output.data(&item);
    } else {
        output.success(&format!("Added {} {} - {}", item.kind, item.id, item.name));
    }

    Ok(())
}

fn list_items(output: &Output, project: &Project, schedule: &ScheduleId) -> Result<()> {
    let items = project.item_store().list_items(schedule)?;

    if output.is_json() {
        output.data(&items);
    } else if items.is_empty() {
        println!("No items in schedule {}", schedule);
    } else {
        output.table_header(&format!(
            "{:<12} {:<10} {:<12} {:<12} {:>5}  NAME",
            "ID", "KIND", "START", "END", "DAYS"
        ));
        for item in &items {
            println!(
                "{:<12} {:<10} {:<12} {:<12} {:>5}  {}",
                item.id,
                item.kind,
                item.start.to_string(),
                item.end.to_string(),
                item.duration_days(),
                item.name
            );
        }
    }

    Ok(())
}
