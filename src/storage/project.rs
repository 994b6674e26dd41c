//! Project management
//!
//! Handles project initialization and gives locked access to each
//! schedule's dependency repository.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use thiserror::Error;

use super::{Config, DependencyStore, ItemStore, ScheduleItemsProvider};
use crate::domain::{
    Dependency, DependencyError, DependencyRepository, GraphStore, ScheduleId, ScheduleItem,
};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in an sdeps project. Run 'sdeps init' first.")]
    NotInProject,

    #[error("Schedule {schedule} has repeated dependency ids ({ids}); fix dependencies.jsonl before editing (see 'sdeps audit')")]
    DuplicateIds { schedule: ScheduleId, ids: String },
}

impl ProjectError {
    pub fn code(&self) -> &'static str {
        match self {
            ProjectError::NotInProject => "not_in_project",
            ProjectError::DuplicateIds { .. } => "duplicate_ids",
        }
    }
}

/// Advisory lock on one schedule, released on drop
struct ScheduleLock {
    _file: File,
}

impl ScheduleLock {
    /// Takes the writer lock, creating the schedule directory if needed
    fn exclusive(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = Self::open(path)?;
        file.lock_exclusive()
            .context("Failed to acquire write lock on schedule")?;

        Ok(Self { _file: file })
    }

    /// Takes a reader lock; `None` when the schedule has no directory yet
    ///
    /// Never creates directories, so reading an unknown schedule leaves no trace.
    fn shared(path: &Path) -> Result<Option<Self>> {
        if !path.parent().is_some_and(Path::is_dir) {
            return Ok(None);
        }

        let file = Self::open(path)?;
        file.lock_shared()
            .context("Failed to acquire read lock on schedule")?;

        Ok(Some(Self { _file: file }))
    }

    fn open(path: &Path) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open schedule lock: {}", path.display()))
    }
}

/// An sdeps project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let sched_dir = root.join(".sched");

        if !sched_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let sched_dir = root.join(".sched");

        let schedules_dir = sched_dir.join("schedules");
        fs::create_dir_all(&schedules_dir).with_context(|| {
            format!(
                "Failed to create schedules directory: {}",
                schedules_dir.display()
            )
        })?;

        let config_path = sched_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# sdeps configuration

# Schedule used when --schedule is not given
default_schedule = "default"

# Allow more than one dependency between the same predecessor and successor
allow_parallel_edges = false

# Upper bound for dependency lag in days (omit for no limit)
# max_lag_days = 30
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = sched_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Lock files are recreated on demand
schedules/*/.lock
schedules/*/*.tmp
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .sched directory path
    pub fn sched_dir(&self) -> PathBuf {
        self.root.join(".sched")
    }

    /// Resolves an optional schedule argument against the configured default
    pub fn schedule_or_default(&self, schedule: Option<ScheduleId>) -> ScheduleId {
        schedule.unwrap_or_else(|| self.config.project.default_schedule.clone())
    }

    /// Returns the directory holding one schedule's files
    pub fn schedule_dir(&self, schedule: &ScheduleId) -> PathBuf {
        self.sched_dir().join("schedules").join(schedule.as_str())
    }

    /// Lists schedules that have a directory on disk
    pub fn schedules(&self) -> Result<Vec<ScheduleId>> {
        let dir = self.sched_dir().join("schedules");
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut schedules = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("Failed to read schedules directory: {}", dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                schedules.push(id);
            }
        }
        schedules.sort();
        Ok(schedules)
    }

    /// Returns the item store (the file-backed items provider)
    pub fn item_store(&self) -> ItemStore {
        ItemStore::for_project(&self.root)
    }

    /// Returns the dependency store
    pub fn dependency_store(&self) -> DependencyStore {
        DependencyStore::for_project(&self.root)
    }

    fn lock_path(&self, schedule: &ScheduleId) -> PathBuf {
        self.schedule_dir(schedule).join(".lock")
    }

    fn build_repository(
        &self,
        schedule: &ScheduleId,
        provider: &dyn ScheduleItemsProvider,
    ) -> Result<DependencyRepository> {
        let items = provider
            .list_items(schedule)
            .with_context(|| format!("Failed to load items for schedule {}", schedule))?;
        let edges = self.dependency_store().read_all(schedule)?;
        let store = GraphStore::from_parts(items, edges);
        Ok(DependencyRepository::new(store, self.config.project.rules()))
    }

    /// Loads a read-only snapshot of a schedule
    pub fn load(&self, schedule: &ScheduleId) -> Result<DependencyRepository> {
        self.load_with(schedule, &self.item_store())
    }

    /// Loads a snapshot using a custom items provider
    pub fn load_with(
        &self,
        schedule: &ScheduleId,
        provider: &dyn ScheduleItemsProvider,
    ) -> Result<DependencyRepository> {
        let _lock = ScheduleLock::shared(&self.lock_path(schedule))?;
        self.build_repository(schedule, provider)
    }

    /// Adds an item to the file-backed provider under the schedule lock
    pub fn add_item(&self, schedule: &ScheduleId, item: ScheduleItem) -> Result<()> {
        let _lock = ScheduleLock::exclusive(&self.lock_path(schedule))?;
        self.item_store().add(schedule, item)
    }

    /// Lists the dependencies of a schedule in insertion order
    pub fn list_dependencies(&self, schedule: &ScheduleId) -> Result<Vec<Dependency>> {
        Ok(self.load(schedule)?.list())
    }

    /// Runs one mutation against a schedule
    ///
    /// Holds the schedule's exclusive lock across load, validation, commit
    /// and write, so at most one mutation per schedule is in flight. Nothing
    /// is written when `f` returns an error, or when the stored file has
    /// repeated dependency ids.
    pub fn transact<T, F>(&self, schedule: &ScheduleId, f: F) -> Result<T>
    where
        F: FnOnce(&mut DependencyRepository) -> Result<T, DependencyError>,
    {
        self.transact_with(schedule, &self.item_store(), f)
    }

    /// [`Project::transact`] with a custom items provider
    pub fn transact_with<T, F>(
        &self,
        schedule: &ScheduleId,
        provider: &dyn ScheduleItemsProvider,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut DependencyRepository) -> Result<T, DependencyError>,
    {
        let _lock = ScheduleLock::exclusive(&self.lock_path(schedule))?;

        let mut repo = self.build_repository(schedule, provider)?;

        // Writing back would drop every record that lost its id to an earlier one
        let duplicates: Vec<String> = repo
            .store()
            .duplicate_ids()
            .map(|id| id.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(ProjectError::DuplicateIds {
                schedule: schedule.clone(),
                ids: duplicates.join(", "),
            }
            .into());
        }

        let result = f(&mut repo)?;
        self.dependency_store()
            .write_all(schedule, repo.store().edges())?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, ItemKind};
    use crate::storage::InMemoryItems;
    use tempfile::TempDir;

    fn item(id: &str) -> ScheduleItem {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ScheduleItem::new(id.parse().unwrap(), id, ItemKind::Task, day, day)
    }

    fn project_with_items(ids: &[&str]) -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let schedule = ScheduleId::default();
        for id in ids {
            project.add_item(&schedule, item(id)).unwrap();
        }
        (dir, project)
    }

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.sched_dir().is_dir());
        assert!(project.sched_dir().join("schedules").is_dir());
        assert!(project.sched_dir().join("config.toml").is_file());
        assert!(project.sched_dir().join(".gitignore").is_file());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap();

        assert!(dir.path().join(".sched").is_dir());
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(dir.path()).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert_eq!(project.schedule_or_default(None).as_str(), "default");
        assert!(!project.config.project.allow_parallel_edges);
    }

    #[test]
    fn transact_persists_on_success() {
        let (_dir, project) = project_with_items(&["a", "b"]);
        let schedule = ScheduleId::default();

        let dep = project
            .transact(&schedule, |repo| {
                repo.create(
                    &"a".parse().unwrap(),
                    &"b".parse().unwrap(),
                    DependencyType::FinishToStart,
                    2,
                )
            })
            .unwrap();

        let listed = project.list_dependencies(&schedule).unwrap();
        assert_eq!(listed, vec![dep]);
        assert_eq!(project.schedules().unwrap(), vec![schedule]);
    }

    #[test]
    fn transact_writes_nothing_on_error() {
        let (_dir, project) = project_with_items(&["a", "b"]);
        let schedule = ScheduleId::default();

        let err = project
            .transact(&schedule, |repo| {
                repo.create(
                    &"a".parse().unwrap(),
                    &"b".parse().unwrap(),
                    DependencyType::FinishToStart,
                    0,
                )?;
                repo.create(
                    &"b".parse().unwrap(),
                    &"a".parse().unwrap(),
                    DependencyType::FinishToStart,
                    0,
                )
            })
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DependencyError>(),
            Some(DependencyError::CyclicDependency { .. })
        ));
        assert!(project.list_dependencies(&schedule).unwrap().is_empty());
    }

    #[test]
    fn custom_provider_supplies_items() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let schedule: ScheduleId = "tower".parse().unwrap();
        let provider = InMemoryItems::new().with_items(schedule.clone(), vec![item("x"), item("y")]);

        project
            .transact_with(&schedule, &provider, |repo| {
                repo.create(
                    &"x".parse().unwrap(),
                    &"y".parse().unwrap(),
                    DependencyType::StartToStart,
                    0,
                )
            })
            .unwrap();

        let repo = project.load_with(&schedule, &provider).unwrap();
        assert_eq!(repo.list().len(), 1);
        assert!(repo.would_create_cycle(&"y".parse().unwrap(), &"x".parse().unwrap()));
    }

    #[test]
    fn reading_unknown_schedule_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let typo: ScheduleId = "typo".parse().unwrap();

        assert!(project.list_dependencies(&typo).unwrap().is_empty());
        assert!(!project.schedule_dir(&typo).exists());
        assert!(project.schedules().unwrap().is_empty());
    }

    #[test]
    fn transact_refuses_to_rewrite_repeated_ids() {
        let (_dir, project) = project_with_items(&["a", "b", "c"]);
        let schedule = ScheduleId::default();
        let path = project.dependency_store().path(&schedule);
        let content = concat!(
            r#"{"id":"d1","predecessorId":"a","successorId":"b","type":"FinishToStart","lag":0}"#,
            "\n",
            r#"{"id":"d1","predecessorId":"b","successorId":"c","type":"FinishToStart","lag":0}"#,
            "\n",
        );
        fs::write(&path, content).unwrap();

        let err = project
            .transact(&schedule, |repo| {
                repo.create(
                    &"a".parse().unwrap(),
                    &"c".parse().unwrap(),
                    DependencyType::FinishToStart,
                    0,
                )
            })
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProjectError>(),
            Some(ProjectError::DuplicateIds { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);

        let repo = project.load(&schedule).unwrap();
        assert_eq!(
            repo.audit(),
            vec![crate::domain::GraphViolation::DuplicateId("d1".parse().unwrap())]
        );
    }
}
