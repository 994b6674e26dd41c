//! Configuration handling for sdeps
//!
//! Configuration is stored in `.sched/config.toml` (project) and
//! `~/.config/sdeps/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ScheduleId, ValidationRules};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Schedule used when `--schedule` is not given
    pub default_schedule: ScheduleId,

    /// Allow more than one dependency per ordered item pair
    pub allow_parallel_edges: bool,

    /// Upper bound for lag in days (unset = unbounded)
    pub max_lag_days: Option<u32>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_schedule: ScheduleId::default(),
            allow_parallel_edges: false,
            max_lag_days: None,
        }
    }
}

impl ProjectConfig {
    /// Validation rules derived from this configuration
    pub fn rules(&self) -> ValidationRules {
        ValidationRules {
            allow_parallel_edges: self.allow_parallel_edges,
            max_lag_days: self.max_lag_days,
        }
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self { project, global })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "sdeps", "sdeps").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads the global configuration without looking for a project
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".sched").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        if config.max_lag_days == Some(0) {
            return Err(ConfigError::Invalid(
                "max_lag_days must be at least 1 (omit it for no limit)".to_string(),
            )
            .into());
        }

        Ok(config)
    }

    /// Finds the project root by looking for a `.sched/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(".sched").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
