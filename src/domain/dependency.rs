//! Dependency edges between schedule items
//!
//! An edge says the successor is constrained by the predecessor. The
//! relationship type and lag are informational: nothing in this crate
//! derives dates from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::{DependencyId, ItemId};

/// Errors returned when a dependency mutation is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(ItemId),

    #[error("Schedule item not found: {0}")]
    MissingEndpoint(ItemId),

    #[error("Adding dependency would create a cycle: {predecessor} -> {successor}")]
    CyclicDependency {
        predecessor: ItemId,
        successor: ItemId,
    },

    #[error("Dependency not found: {0}")]
    NotFound(DependencyId),

    #[error("Invalid lag '{0}': expected a whole number of days >= 0")]
    InvalidLag(String),

    #[error("Dependency {existing} already links {predecessor} -> {successor}")]
    DuplicateEdge {
        existing: DependencyId,
        predecessor: ItemId,
        successor: ItemId,
    },
}

impl DependencyError {
    /// Stable snake_case code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            DependencyError::SelfDependency(_) => "self_dependency",
            DependencyError::MissingEndpoint(_) => "missing_endpoint",
            DependencyError::CyclicDependency { .. } => "cyclic_dependency",
            DependencyError::NotFound(_) => "not_found",
            DependencyError::InvalidLag(_) => "invalid_lag",
            DependencyError::DuplicateEdge { .. } => "duplicate_edge",
        }
    }
}

/// Temporal relationship between predecessor and successor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DependencyType {
    /// Successor may not start until the predecessor finishes
    #[default]
    FinishToStart,
    /// Successor may not start until the predecessor starts
    StartToStart,
    /// Successor may not finish until the predecessor finishes
    FinishToFinish,
    /// Successor may not finish until the predecessor starts
    StartToFinish,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::FinishToStart,
        DependencyType::StartToStart,
        DependencyType::FinishToFinish,
        DependencyType::StartToFinish,
    ];

    /// Two-letter badge used in tables (FS, SS, FF, SF)
    pub fn badge(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FinishToStart",
            DependencyType::StartToStart => "StartToStart",
            DependencyType::FinishToFinish => "FinishToFinish",
            DependencyType::StartToFinish => "StartToFinish",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "fs" | "finishtostart" => Ok(DependencyType::FinishToStart),
            "ss" | "starttostart" => Ok(DependencyType::StartToStart),
            "ff" | "finishtofinish" => Ok(DependencyType::FinishToFinish),
            "sf" | "starttofinish" => Ok(DependencyType::StartToFinish),
            _ => Err(format!(
                "unknown dependency type '{}' (expected FS, SS, FF or SF)",
                s.trim()
            )),
        }
    }
}

/// Non-negative day offset applied to a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Lag(u32);

impl Lag {
    pub const ZERO: Lag = Lag(0);

    pub fn new(days: i64) -> Result<Self, DependencyError> {
        u32::try_from(days)
            .map(Lag)
            .map_err(|_| DependencyError::InvalidLag(days.to_string()))
    }

    pub fn days(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Lag {
    fn from(days: u32) -> Self {
        Lag(days)
    }
}

impl From<Lag> for u32 {
    fn from(lag: Lag) -> Self {
        lag.0
    }
}

impl TryFrom<i64> for Lag {
    type Error = DependencyError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        Lag::new(days)
    }
}

impl FromStr for Lag {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let days: i64 = s
            .parse()
            .map_err(|_| DependencyError::InvalidLag(s.to_string()))?;
        Lag::new(days)
    }
}

impl fmt::Display for Lag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.0)
    }
}

/// A directed, typed, lagged edge: predecessor -> successor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub id: DependencyId,
    pub predecessor_id: ItemId,
    pub successor_id: ItemId,
    #[serde(rename = "type", default)]
    pub dep_type: DependencyType,
    #[serde(default)]
    pub lag: Lag,
}

impl Dependency {
    pub fn new(
        id: DependencyId,
        predecessor_id: ItemId,
        successor_id: ItemId,
        dep_type: DependencyType,
        lag: Lag,
    ) -> Self {
        Self {
            id,
            predecessor_id,
            successor_id,
            dep_type,
            lag,
        }
    }

    /// Returns true if this edge links the given ordered pair
    pub fn links(&self, predecessor: &ItemId, successor: &ItemId) -> bool {
        &self.predecessor_id == predecessor && &self.successor_id == successor
    }
}

/// Fields of a dependency that may change in place
///
/// Endpoints are immutable; re-pointing an edge is delete + create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPatch {
    pub dep_type: Option<DependencyType>,
    pub lag: Option<i64>,
}

impl DependencyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, dep_type: DependencyType) -> Self {
        self.dep_type = Some(dep_type);
        self
    }

    pub fn with_lag(mut self, lag: i64) -> Self {
        self.lag = Some(lag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dep_type.is_none() && self.lag.is_none()
    }
}
