//! Output formatting for CLI commands

use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{DependencyError, IdError};
use crate::storage::{ConfigError, ConfigFormat, ProjectError};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<ConfigFormat> for OutputFormat {
    fn from(format: ConfigFormat) -> Self {
        match format {
            ConfigFormat::Text => OutputFormat::Text,
            ConfigFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Reports a failed command on stdout (JSON only)
    ///
    /// Text mode leaves reporting to `main`, which prints `Error: ...` on
    /// stderr for both formats.
    pub fn failure(&self, err: &anyhow::Error) {
        if self.is_json() {
            println!("{}", failure_json(err));
        }
    }

    /// Prints a table header followed by a rule of the same width
    pub fn table_header(&self, header: &str) {
        println!("{}", header);
        println!("{}", "-".repeat(header.chars().count()));
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Callers render their own tables; this is the fallback
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

/// Machine-readable error code for a failed command
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<DependencyError>() {
            return e.code();
        }
        if cause.downcast_ref::<IdError>().is_some() {
            return "invalid_id";
        }
        if let Some(e) = cause.downcast_ref::<ProjectError>() {
            return e.code();
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "invalid_config";
        }
    }
    "error"
}

fn failure_json(err: &anyhow::Error) -> Value {
    json!({
        "success": false,
        "code": error_code(err),
        "error": format!("{:#}", err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn dependency_errors_keep_their_code() {
        let err: anyhow::Error = DependencyError::CyclicDependency {
            predecessor: "c".parse().unwrap(),
            successor: "a".parse().unwrap(),
        }
        .into();

        let json = failure_json(&err);
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "cyclic_dependency");
        assert_eq!(
            json["error"],
            "Adding dependency would create a cycle: c -> a"
        );
    }

    #[test]
    fn code_survives_added_context() {
        let err = Err::<(), _>(DependencyError::NotFound("d-1".parse().unwrap()))
            .context("Failed to update dependency")
            .unwrap_err();
        assert_eq!(error_code(&err), "not_found");
    }

    #[test]
    fn other_errors_get_generic_code() {
        assert_eq!(error_code(&anyhow::anyhow!("disk full")), "error");
        assert_eq!(error_code(&ProjectError::NotInProject.into()), "not_in_project");
    }
}
