//! Schedule item reference data
//!
//! Items (phases, tasks, milestones) are owned by the schedule items
//! provider. The dependency core only reads their identity and display
//! fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::ItemId;

/// Kind of schedule item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Phase,
    #[default]
    Task,
    Milestone,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Phase => "phase",
            ItemKind::Task => "task",
            ItemKind::Milestone => "milestone",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phase" => Ok(ItemKind::Phase),
            "task" => Ok(ItemKind::Task),
            "milestone" => Ok(ItemKind::Milestone),
            other => Err(format!(
                "unknown item kind '{}' (expected phase, task or milestone)",
                other
            )),
        }
    }
}

/// A phase, task or milestone on a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ScheduleItem {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        kind: ItemKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            start,
            end,
        }
    }

    /// Number of calendar days covered, inclusive of both ends
    ///
    /// Milestones are usually zero-length (start == end) and report 1.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
