//! Main CLI application structure

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use super::output::{Output, OutputFormat};
use super::{dep, item, view};
use crate::domain::ScheduleId;
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "sdeps")]
#[command(author, version, about = "Dependency graphs for construction schedules")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Schedule to operate on (defaults to the project's default schedule)
    #[arg(long, short = 's', global = true, env = "SDEPS_SCHEDULE")]
    pub schedule: Option<ScheduleId>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new schedule project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage schedule items (phases, tasks, milestones)
    #[command(subcommand)]
    Item(item::ItemCommands),

    /// Manage dependencies between items
    #[command(subcommand)]
    Dep(dep::DepCommands),

    /// Render the dependency graph
    #[command(subcommand)]
    View(view::ViewCommands),

    /// Check stored dependencies for dangling endpoints, self-loops and cycles
    Audit,

    /// List schedules in this project
    Schedules,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format.into(),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("sdeps starting");

    let result = execute(cli.command, cli.schedule, &output);
    if let Err(err) = &result {
        output.failure(err);
    }
    result
}

fn execute(command: Commands, schedule: Option<ScheduleId>, output: &Output) -> Result<()> {
    match command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .sched directory at: {}", project.sched_dir().display()),
            );
            output.success(&format!(
                "Initialized schedule project at {}",
                project.root().display()
            ));
        }

        Commands::Item(cmd) => item::run(cmd, output, schedule)?,
        Commands::Dep(cmd) => dep::run(cmd, output, schedule)?,
        Commands::View(cmd) => view::run(cmd, output, schedule)?,

        Commands::Audit => audit(output, schedule)?,
        Commands::Schedules => schedules(output)?,
    }

    Ok(())
}

fn audit(output: &Output, schedule: Option<ScheduleId>) -> Result<()> {
    let project = Project::open_current()?;
    let schedule = project.schedule_or_default(schedule);
    let repo = project.load(&schedule)?;
    let violations = repo.audit();

    output.verbose_ctx(
        "audit",
        &format!(
            "Checked {} dependencies across {} items",
            repo.store().edge_count(),
            repo.store().item_count()
        ),
    );

    if output.is_json() {
        let messages: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        output.data(&json!({
            "schedule": schedule,
            "ok": violations.is_empty(),
            "violations": messages,
        }));
    } else if violations.is_empty() {
        println!(
            "Schedule {} is consistent ({} dependencies)",
            schedule,
            repo.store().edge_count()
        );
    } else {
        for violation in &violations {
            println!("  {}", violation);
        }
    }

    if !violations.is_empty() {
        bail!(
            "Schedule {} has {} integrity problem(s)",
            schedule,
            violations.len()
        );
    }

    Ok(())
}

fn schedules(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let schedules = project.schedules()?;
    let default = project.schedule_or_default(None);

    if output.is_json() {
        output.data(&json!({
            "default": default,
            "schedules": schedules,
        }));
        return Ok(());
    }

    if schedules.is_empty() {
        println!("No schedules yet (default: {})", default);
        return Ok(());
    }

    for schedule in schedules {
        let marker = if schedule == default { "*" } else { " " };
        println!("{} {}", marker, schedule);
    }

    Ok(())
}
