//! Dependency CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{
    Dependency, DependencyId, DependencyPatch, DependencyType, GraphStore, ItemId, ScheduleId,
};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum DepCommands {
    /// Add a dependency: SUCCESSOR is constrained by PREDECESSOR
    ///
    /// Examples:
    ///   sdeps dep add item1-1 item1-2              # Finish-to-start, no lag
    ///   sdeps dep add item2-1 item2-2 -t SS -l 5   # Start-to-start, 5 days lag
    Add {
        /// Item that constrains the successor
        predecessor: String,

        /// Item that is constrained
        successor: String,

        /// Relationship type (FS, SS, FF, SF)
        #[arg(long = "type", short = 't', default_value = "FS")]
        dep_type: String,

        /// Lag in days
        #[arg(long, short = 'l', default_value = "0", allow_hyphen_values = true)]
        lag: String,
    },

    /// Change the type and/or lag of a dependency
    Set {
        /// Dependency ID
        id: String,

        /// New relationship type (FS, SS, FF, SF)
        #[arg(long = "type", short = 't')]
        dep_type: Option<String>,

        /// New lag in days
        #[arg(long, short = 'l', allow_hyphen_values = true)]
        lag: Option<String>,
    },

    /// Remove a dependency
    Rm {
        /// Dependency ID
        id: String,
    },

    /// List dependencies in creation order
    List,

    /// Check whether a dependency would create a cycle, without adding it
    CheckCycle {
        predecessor: String,
        successor: String,
    },
}

pub fn run(cmd: DepCommands, output: &Output, schedule: Option<ScheduleId>) -> Result<()> {
    let project = Project::open_current()?;
    let schedule = project.schedule_or_default(schedule);
    output.verbose_ctx("dep", &format!("Using schedule: {}", schedule));

    match cmd {
        DepCommands::Add {
            predecessor,
            successor,
            dep_type,
            lag,
        } => add_dependency(output, &project, &schedule, &predecessor, &successor, &dep_type, &lag),
        DepCommands::Set { id, dep_type, lag } => {
            set_dependency(output, &project, &schedule, &id, dep_type.as_deref(), lag.as_deref())
        }
        DepCommands::Rm { id } => remove_dependency(output, &project, &schedule, &id),
        DepCommands::List => list_dependencies(output, &project, &schedule),
        DepCommands::CheckCycle {
            predecessor,
            successor,
        } => check_cycle(output, &project, &schedule, &predecessor, &successor),
    }
}

fn parse_type(s: &str) -> Result<DependencyType> {
    s.parse().map_err(anyhow::Error::msg)
}

/// Parses a lag argument; non-integers surface as the domain's InvalidLag
fn parse_lag(s: &str) -> Result<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .map_err(|_| crate::domain::DependencyError::InvalidLag(s.to_string()).into())
}

fn dependency_json(dep: &Dependency, store: &GraphStore) -> serde_json::Value {
    serde_json::json!({
        "id": dep.id,
        "predecessorId": dep.predecessor_id,
        "successorId": dep.successor_id,
        "type": dep.dep_type,
        "lag": dep.lag,
        "predecessorName": store.item_name(&dep.predecessor_id),
        "successorName": store.item_name(&dep.successor_id),
    })
}

fn add_dependency(
    output: &Output,
    project: &Project,
    schedule: &ScheduleId,
    predecessor_str: &str,
    successor_str: &str,
    type_str: &str,
    lag_str: &str,
) -> Result<()> {
    let predecessor: ItemId = predecessor_str.parse()?;
    let successor: ItemId = successor_str.parse()?;
    let dep_type = parse_type(type_str)?;
    let lag = parse_lag(lag_str)?;

    output.verbose_ctx(
        "dep",
        &format!("Proposing {} -> {} ({}, lag {})", predecessor, successor, dep_type.badge(), lag),
    );

    let (dep, store) = project.transact(schedule, |repo| {
        let dep = repo.create(&predecessor, &successor, dep_type, lag)?;
        Ok((dep, repo.store().clone()))
    })?;

    output.verbose_ctx("dep", &format!("Committed {}", dep.id));

    if output.is_json() {
        output.data(&dependency_json(&dep, &store));
    } else {
        output.success(&format!(
            "Created dependency {}: {} -> {} ({}, +{})",
            dep.id,
            store.item_name(&dep.predecessor_id),
            store.item_name(&dep.successor_id),
            dep.dep_type.badge(),
            dep.lag
        ));
    }

    Ok(())
}

fn set_dependency(
    output: &Output,
    project: &Project,
    schedule: &ScheduleId,
    id_str: &str,
    type_str: Option<&str>,
    lag_str: Option<&str>,
) -> Result<()> {
    let id: DependencyId = id_str.parse()?;

    let mut patch = DependencyPatch::new();
    if let Some(t) = type_str {
        patch = patch.with_type(parse_type(t)?);
    }
    if let Some(l) = lag_str {
        patch = patch.with_lag(parse_lag(l)?);
    }
    if patch.is_empty() {
        bail!("Nothing to change: pass --type and/or --lag");
    }

    let (dep, store) = project.transact(schedule, |repo| {
        let dep = repo.update(&id, patch)?;
        Ok((dep, repo.store().clone()))
    })?;

    if output.is_json() {
        output.data(&dependency_json(&dep, &store));
    } else {
        output.success(&format!(
            "Updated dependency {}: {} -> {} ({}, +{})",
            dep.id,
            store.item_name(&dep.predecessor_id),
            store.item_name(&dep.successor_id),
            dep.dep_type.badge(),
            dep.lag
        ));
    }

    Ok(())
}

fn remove_dependency(output: &Output, project: &Project, schedule: &ScheduleId, id_str: &str) -> Result<()> {
    let id: DependencyId = id_str.parse()?;

    let removed = project.transact(schedule, |repo| repo.delete(&id))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "removed": removed,
        }));
    } else {
        output.success(&format!(
            "Removed dependency {}: {} -> {}",
            removed.id, removed.predecessor_id, removed.successor_id
        ));
    }

    Ok(())
}

fn list_dependencies(output: &Output, project: &Project, schedule: &ScheduleId) -> Result<()> {
    let deps = project.list_dependencies(schedule)?;
    output.verbose_ctx("dep", &format!("Found {} dependencies", deps.len()));

    if output.is_json() {
        output.data(&deps);
    } else if deps.is_empty() {
        println!("No dependencies in schedule {}", schedule);
    } else {
        output.table_header(&format!(
            "{:<12} {:<16} {:<16} {:<4} LAG",
            "ID", "PREDECESSOR", "SUCCESSOR", "TYPE"
        ));
        for dep in &deps {
            println!(
                "{:<12} {:<16} {:<16} {:<4} {}",
                dep.id,
                dep.predecessor_id,
                dep.successor_id,
                dep.dep_type.badge(),
                dep.lag
            );
        }
    }

    Ok(())
}

fn check_cycle(
    output: &Output,
    project: &Project,
    schedule: &ScheduleId,
    predecessor_str: &str,
    successor_str: &str,
) -> Result<()> {
    let predecessor: ItemId = predecessor_str.parse()?;
    let successor: ItemId = successor_str.parse()?;

    let repo = project.load(schedule)?;
    let cyclic = repo.would_create_cycle(&predecessor, &successor);

    if output.is_json() {
        output.data(&serde_json::json!({
            "predecessorId": predecessor,
            "successorId": successor,
            "wouldCreateCycle": cyclic,
        }));
    } else if cyclic {
        println!(
            "{} -> {} would create a cycle",
            predecessor, successor
        );
    } else {
        println!("{} -> {} is safe", predecessor, successor);
    }

    Ok(())
}
