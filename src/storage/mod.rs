//! # Storage Layer
//!
//! Persistence layer for sdeps with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Items | JSONL (one JSON per line) | `.sched/schedules/{id}/items.jsonl` |
//! | Dependencies | JSONL (one JSON per line) | `.sched/schedules/{id}/dependencies.jsonl` |
//! | Config | TOML | `.sched/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - Every mutation runs under an exclusive per-schedule lock (`fs2`)
//!   spanning load, validation and write, see [`Project::transact`]
//! - All writes are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .sched/
//! ├── schedules/
//! │   └── default/
//! │       ├── items.jsonl         # Schedule items (provider data)
//! │       ├── dependencies.jsonl  # Dependency edges
//! │       └── .lock               # Per-schedule writer lock
//! ├── config.toml                 # Project configuration
//! └── .gitignore                  # Ignores lock and temp files
//! ```

mod jsonl;
mod items;
mod config;
mod project;

pub use jsonl::DependencyStore;
pub use items::{InMemoryItems, ItemStore, ScheduleItemsProvider};
pub use config::{Config, ConfigError, GlobalConfig, OutputFormat as ConfigFormat, ProjectConfig};
pub use project::{Project, ProjectError};
