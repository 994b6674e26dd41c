//! JSONL storage for dependencies
//!
//! Dependencies are stored in `.sched/schedules/{schedule}/dependencies.jsonl`
//! with one JSON object per line, in insertion order.
//! Uses file locking for concurrent access safety.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::{Dependency, ScheduleId};

/// Reads every record of a JSONL file (missing file = no records)
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open {} store: {}", what, path.display()))?;

    // Acquire shared lock for reading
    file.lock_shared()
        .with_context(|| format!("Failed to acquire read lock on {} store", what))?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse {} at line {}", what, line_num + 1))?;
        records.push(record);
    }

    // Lock is released when file is dropped
    Ok(records)
}

/// Rewrites a JSONL file atomically (temp file + rename)
pub(crate) fn write_records<'a, T, I>(path: &Path, records: I, what: &str) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("jsonl.tmp");

    {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire write lock on {} store", what))?;

        let mut writer = BufWriter::new(&file);
        for record in records {
            let line = serde_json::to_string(record)
                .with_context(|| format!("Failed to serialize {}", what))?;
            writeln!(writer, "{}", line).with_context(|| format!("Failed to write {}", what))?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to flush {} store", what))?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

/// Store for dependency records in JSONL format
pub struct DependencyStore {
    root: PathBuf,
}

impl DependencyStore {
    /// Creates a store rooted at a `.sched/schedules` directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".sched").join("schedules"))
    }

    /// Returns the path of a schedule's dependency file
    pub fn path(&self, schedule: &ScheduleId) -> PathBuf {
        self.root.join(schedule.as_str()).join("dependencies.jsonl")
    }

    /// Reads all dependencies of a schedule, in stored order
    pub fn read_all(&self, schedule: &ScheduleId) -> Result<Vec<Dependency>> {
        read_records(&self.path(schedule), "dependency")
    }

    /// Writes all dependencies of a schedule (full rewrite, order preserved)
    pub fn write_all<'a>(
        &self,
        schedule: &ScheduleId,
        dependencies: impl IntoIterator<Item = &'a Dependency>,
    ) -> Result<()> {
        write_records(&self.path(schedule), dependencies, "dependency")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, Lag};
    use tempfile::TempDir;

    fn dep(n: u32, from: &str, to: &str) -> Dependency {
        Dependency::new(
            format!("dep{}", n).parse().unwrap(),
            from.parse().unwrap(),
            to.parse().unwrap(),
            DependencyType::FinishToStart,
            Lag::from(n),
        )
    }

    fn schedule() -> ScheduleId {
        "site-a".parse().unwrap()
    }

    #[test]
    fn read_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = DependencyStore::new(dir.path());

        assert!(store.read_all(&schedule()).unwrap().is_empty());
    }

    #[test]
    fn write_and_read_keeps_order() {
        let dir = TempDir::new().unwrap();
        let store = DependencyStore::new(dir.path());
        let deps = vec![dep(2, "b", "c"), dep(1, "a", "b")];

        store.write_all(&schedule(), &deps).unwrap();

        let loaded = store.read_all(&schedule()).unwrap();
        assert_eq!(loaded, deps);
    }

    #[test]
    fn schedules_are_separate_files() {
        let dir = TempDir::new().unwrap();
        let store = DependencyStore::new(dir.path());
        let other: ScheduleId = "site-b".parse().unwrap();

        store.write_all(&schedule(), &[dep(1, "a", "b")]).unwrap();

        assert_eq!(store.read_all(&schedule()).unwrap().len(), 1);
        assert!(store.read_all(&other).unwrap().is_empty());
    }

    #[test]
    fn file_uses_wire_format() {
        let dir = TempDir::new().unwrap();
        let store = DependencyStore::new(dir.path());
        store.write_all(&schedule(), &[dep(3, "a", "b")]).unwrap();

        let content = fs::read_to_string(store.path(&schedule())).unwrap();
        assert_eq!(
            content.trim(),
            r#"{"id":"dep3","predecessorId":"a","successorId":"b","type":"FinishToStart","lag":3}"#
        );
    }

    #[test]
    fn skips_blank_lines_and_reports_bad_ones() {
        let dir = TempDir::new().unwrap();
        let store = DependencyStore::new(dir.path());
        let path = store.path(&schedule());
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(
            &path,
            "\n{\"id\":\"d1\",\"predecessorId\":\"a\",\"successorId\":\"b\",\"type\":\"StartToStart\",\"lag\":0}\n\n",
        )
        .unwrap();
        assert_eq!(store.read_all(&schedule()).unwrap().len(), 1);

        fs::write(&path, "{\"id\":\"d1\",\"predecessorId\":\"a\",\"successorId\":\"b\",\"lag\":-1}\n").unwrap();
        let err = store.read_all(&schedule()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
    }

    #[test]
    fn atomic_write() {
        let dir = TempDir::new().unwrap();
        let store = DependencyStore::new(dir.path());
        store.write_all(&schedule(), &[dep(1, "a", "b")]).unwrap();

        let temp_path = store.path(&schedule()).with_extension("jsonl.tmp");
        assert!(!temp_path.exists());
    }
}
