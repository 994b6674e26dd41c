//! Schedule items provider
//!
//! The dependency core only needs to know which items exist and what they
//! are called. [`ScheduleItemsProvider`] is that seam; [`ItemStore`] is the
//! file-backed implementation used by the CLI.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use super::jsonl::{read_records, write_records};
use crate::domain::{ScheduleId, ScheduleItem};

/// Source of schedule items for a schedule
pub trait ScheduleItemsProvider {
    /// Lists the items of a schedule in display order
    fn list_items(&self, schedule: &ScheduleId) -> Result<Vec<ScheduleItem>>;
}

/// Items kept in memory, keyed by schedule
#[derive(Debug, Default, Clone)]
pub struct InMemoryItems {
    schedules: HashMap<ScheduleId, Vec<ScheduleItem>>,
}

impl InMemoryItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, schedule: ScheduleId, items: Vec<ScheduleItem>) -> Self {
        self.schedules.insert(schedule, items);
        self
    }
}

impl ScheduleItemsProvider for InMemoryItems {
    fn list_items(&self, schedule: &ScheduleId) -> Result<Vec<ScheduleItem>> {
        Ok(self.schedules.get(schedule).cloned().unwrap_or_default())
    }
}

/// Items stored as JSONL in `.sched/schedules/{schedule}/items.jsonl`
pub struct ItemStore {
    root: PathBuf,
}

impl ItemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".sched").join("schedules"))
    }

    /// Returns the path of a schedule's item file
    pub fn path(&self, schedule: &ScheduleId) -> PathBuf {
        self.root.join(schedule.as_str()).join("items.jsonl")
    }

    /// Adds an item; ids must be unique within the schedule
    pub fn add(&self, schedule: &ScheduleId, item: ScheduleItem) -> Result<()> {
        if item.end < item.start {
            bail!(
                "Item {} ends ({}) before it starts ({})",
                item.id,
                item.end,
                item.start
            );
        }

        let mut items = self.list_items(schedule)?;
        if items.iter().any(|i| i.id == item.id) {
            bail!("Item already exists: {}", item.id);
        }
        items.push(item);

        write_records(&self.path(schedule), &items, "item")
    }
}

impl ScheduleItemsProvider for ItemStore {
    fn list_items(&self, schedule: &ScheduleId) -> Result<Vec<ScheduleItem>> {
        read_records(&self.path(schedule), "item")
    }
}
