//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup and checks | `init`, `schedules`, `audit` |
//! | Item | Schedule item reference data | `item add`, `item list` |
//! | Dep | Dependency editing | `dep add`, `dep set`, `dep rm`, `dep check-cycle` |
//! | View | Graph projections | `view list`, `view matrix`, `view timeline` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Schedules
//!
//! `--schedule` (or `SDEPS_SCHEDULE`) picks the schedule; without it the
//! project's `default_schedule` is used.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! sdeps --verbose dep add item1-1 item1-2
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod dep;
mod item;
mod view;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
