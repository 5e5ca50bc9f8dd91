use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::FilterState;
use crate::task::Task;

/// Durable, device-local persistence for the task collection and the active
/// filter. Injected into the synchronizer so tests can substitute
/// [`MemoryCache`]. Reads of absent state produce the empty/default value;
/// only writes can fail.
pub trait Cache {
    fn read_tasks(&self) -> Result<Vec<Task>>;
    fn write_tasks(&self, tasks: &[Task]) -> Result<()>;
    fn read_filter(&self) -> Result<FilterState>;
    fn write_filter(&self, filter: &FilterState) -> Result<()>;
}

/// JSON-file cache under a data directory: `tasks.json` holds the collection,
/// `filters.json` the active filter.
#[derive(Debug)]
pub struct FileCache {
    pub data_dir: PathBuf,
    tasks_path: PathBuf,
    filters_path: PathBuf,
}

impl FileCache {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let tasks_path = data_dir.join("tasks.json");
        let filters_path = data_dir.join("filters.json");

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            filters = %filters_path.display(),
            "opened file cache"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            filters_path,
        })
    }
}

impl Cache for FileCache {
    fn read_tasks(&self) -> Result<Vec<Task>> {
        read_json_or(&self.tasks_path, Vec::new)
    }

    fn write_tasks(&self, tasks: &[Task]) -> Result<()> {
        write_json_atomic(&self.tasks_path, &tasks)
    }

    fn read_filter(&self) -> Result<FilterState> {
        read_json_or(&self.filters_path, FilterState::default)
    }

    fn write_filter(&self, filter: &FilterState) -> Result<()> {
        write_json_atomic(&self.filters_path, filter)
    }
}

fn read_json_or<T, F>(path: &Path, default: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    if !path.exists() {
        debug!(file = %path.display(), "cache file absent, using default");
        return Ok(default());
    }

    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(default());
    }

    let value = serde_json::from_str(&raw)
        .map_err(|err| Error::Storage(format!("failed parsing {}: {err}", path.display())))?;
    Ok(value)
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    debug!(file = %path.display(), "writing cache file atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(temp.as_file(), value)?;
    temp.persist(path)
        .map_err(|err| Error::Storage(format!("failed to persist {}: {err}", path.display())))?;

    Ok(())
}

/// In-memory cache for tests and cache-less embedders.
#[derive(Debug, Default)]
pub struct MemoryCache {
    tasks: RefCell<Vec<Task>>,
    filter: RefCell<FilterState>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RefCell::new(tasks),
            filter: RefCell::new(FilterState::default()),
        }
    }
}

impl Cache for MemoryCache {
    fn read_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.borrow().clone())
    }

    fn write_tasks(&self, tasks: &[Task]) -> Result<()> {
        *self.tasks.borrow_mut() = tasks.to_vec();
        Ok(())
    }

    fn read_filter(&self) -> Result<FilterState> {
        Ok(self.filter.borrow().clone())
    }

    fn write_filter(&self, filter: &FilterState) -> Result<()> {
        *self.filter.borrow_mut() = filter.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::StatusFilter;
    use crate::task::TaskDraft;
    use tempfile::tempdir;

    #[test]
    fn tasks_round_trip_through_file_cache() {
        let temp = tempdir().expect("tempdir");
        let cache = FileCache::open(temp.path()).expect("open cache");

        assert!(cache.read_tasks().expect("first read").is_empty());

        let tasks = vec![
            TaskDraft::new("Buy milk").into_task(1),
            TaskDraft::new("Clean desk").into_task(1001),
        ];
        cache.write_tasks(&tasks).expect("write tasks");
        assert_eq!(cache.read_tasks().expect("read back"), tasks);
    }

    #[test]
    fn filter_round_trips_and_defaults_when_absent() {
        let temp = tempdir().expect("tempdir");
        let cache = FileCache::open(temp.path()).expect("open cache");

        assert_eq!(cache.read_filter().expect("default"), FilterState::default());

        let filter = FilterState::new(StatusFilter::Pending, "milk");
        cache.write_filter(&filter).expect("write filter");
        assert_eq!(cache.read_filter().expect("read back"), filter);
    }

    #[test]
    fn corrupt_cache_file_is_a_storage_error() {
        let temp = tempdir().expect("tempdir");
        let cache = FileCache::open(temp.path()).expect("open cache");

        std::fs::write(temp.path().join("tasks.json"), "not json").expect("write");
        let err = cache.read_tasks().expect_err("corrupt file");
        assert!(matches!(err, Error::Storage(_)));
    }
}
