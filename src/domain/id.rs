//! Identifiers for schedules, schedule items and dependencies
//!
//! ID Format:
//! - Schedule IDs: `[A-Za-z0-9_-]+` (used as a directory name on disk)
//! - Item IDs: any non-empty token without whitespace (e.g., `item1-1`)
//! - Dependency IDs: any non-empty token; generated ones are `d-{7-char-hash}`
//!
//! Generated hashes are derived from both endpoints, the creation timestamp
//! and an attempt counter, so a collision can be resolved by retrying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid schedule ID: expected letters, digits, '-' or '_', got '{0}'")]
    InvalidScheduleId(String),

    #[error("Invalid item ID: expected a non-empty token without whitespace, got '{0}'")]
    InvalidItemId(String),

    #[error("Invalid dependency ID: expected a non-empty token without whitespace, got '{0}'")]
    InvalidDependencyId(String),
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

/// Generates a 7-character hash for a new dependency
fn generate_hash(predecessor: &ItemId, successor: &ItemId, timestamp: DateTime<Utc>, attempt: u32) -> String {
    let input = format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}",
        predecessor,
        successor,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        attempt
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Identifier of one schedule (a project may hold several)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduleId(String);

impl ScheduleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ScheduleId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for ScheduleId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(IdError::InvalidScheduleId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ScheduleId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScheduleId> for String {
    fn from(id: ScheduleId) -> Self {
        id.0
    }
}

/// Identifier of a schedule item, owned by the items provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !is_token(s) {
            return Err(IdError::InvalidItemId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ItemId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Identifier of a dependency edge, unique within a schedule
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DependencyId(String);

impl DependencyId {
    /// Creates a new dependency ID from its endpoints and a timestamp
    ///
    /// `attempt` is mixed into the hash; bump it when the first candidate
    /// is already taken.
    pub fn generate(
        predecessor: &ItemId,
        successor: &ItemId,
        timestamp: DateTime<Utc>,
        attempt: u32,
    ) -> Self {
        Self(format!(
            "d-{}",
            generate_hash(predecessor, successor, timestamp, attempt)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for DependencyId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !is_token(s) {
            return Err(IdError::InvalidDependencyId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for DependencyId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DependencyId> for String {
    fn from(id: DependencyId) -> Self {
        id.0
    }
}
