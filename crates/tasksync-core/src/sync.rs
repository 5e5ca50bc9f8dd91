use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::filter::FilterState;
use crate::gateway::{REMOTE_ID_THRESHOLD, TaskGateway};
use crate::task::{Task, TaskCounts, TaskDraft};

/// Current state of the most recent reconciliation operation. A single value,
/// overwritten by each new operation; there is no per-operation queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Mints identifiers for tasks the remote never assigned one: time-based,
/// always at or above [`REMOTE_ID_THRESHOLD`], strictly increasing within a
/// session even when called twice in the same millisecond.
#[derive(Debug, Default)]
struct LocalIdGen {
    last: u64,
}

impl LocalIdGen {
    fn next(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(REMOTE_ID_THRESHOLD);
        let id = now.max(self.last + 1).max(REMOTE_ID_THRESHOLD);
        self.last = id;
        id
    }
}

/// The reconciliation core. Owns the canonical in-memory task collection, the
/// active filter and the operation status; every mutation goes through the
/// gateway and the cache so the two converge after each successful operation.
///
/// Gateway and cache are injected so tests and embedders can substitute fakes.
#[derive(Debug)]
pub struct Synchronizer<G, C> {
    gateway: G,
    cache: C,
    tasks: Vec<Task>,
    filter: FilterState,
    status: SyncStatus,
    last_error: Option<String>,
    id_gen: LocalIdGen,
}

impl<G: TaskGateway, C: Cache> Synchronizer<G, C> {
    /// Builds a synchronizer with an empty collection; the filter is restored
    /// from the cache (default when absent). Call [`load_all`] to populate.
    ///
    /// [`load_all`]: Synchronizer::load_all
    pub fn new(gateway: G, cache: C) -> Result<Self> {
        let filter = cache.read_filter()?;
        Ok(Self {
            gateway,
            cache,
            tasks: Vec::new(),
            filter,
            status: SyncStatus::Idle,
            last_error: None,
            id_gen: LocalIdGen::default(),
        })
    }

    /// Loads the collection: a warm cache wins outright, otherwise the remote
    /// list is adopted and cached. When the remote is unreachable the cache is
    /// the fallback; only an unreachable remote plus an empty cache fails.
    #[tracing::instrument(skip(self))]
    pub async fn load_all(&mut self) -> Result<()> {
        self.begin();

        let cached = match self.cache.read_tasks() {
            Ok(tasks) => tasks,
            Err(err) => return Err(self.fail(err)),
        };
        if !cached.is_empty() {
            debug!(count = cached.len(), "cache warm, skipping gateway");
            self.tasks = cached;
            self.succeed();
            return Ok(());
        }

        match self.gateway.list().await {
            Ok(tasks) => {
                if let Err(err) = self.cache.write_tasks(&tasks) {
                    return Err(self.fail(err));
                }
                info!(count = tasks.len(), "adopted remote task list");
                self.tasks = tasks;
                self.succeed();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "remote list failed, falling back to cache");
                let fallback = match self.cache.read_tasks() {
                    Ok(tasks) => tasks,
                    Err(err) => return Err(self.fail(err)),
                };
                if fallback.is_empty() {
                    Err(self.fail(Error::Network(
                        "could not load tasks, check your internet connection".to_string(),
                    )))
                } else {
                    info!(count = fallback.len(), "using cached tasks while remote is down");
                    self.tasks = fallback;
                    self.succeed();
                    Ok(())
                }
            }
        }
    }

    /// Creates a task. The remote must accept the draft, but the stored id is
    /// always minted locally; the remote echo's id is discarded. Unlike
    /// update/delete, a gateway failure here fails the operation outright —
    /// creation is the one mutation that needs the remote to acknowledge
    /// identity.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        self.begin();

        if let Err(err) = draft.validate() {
            return Err(self.fail(err));
        }

        match self.gateway.create(&draft).await {
            Ok(echo) => {
                let id = self.id_gen.next();
                let task = Task {
                    id: Some(id),
                    ..echo
                };

                let mut next = self.tasks.clone();
                next.push(task.clone());
                if let Err(err) = self.cache.write_tasks(&next) {
                    return Err(self.fail(err));
                }
                self.tasks = next;
                self.succeed();
                info!(id, "created task");
                Ok(task)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Replaces the entry matching `task.id`. The remote write is attempted
    /// (for remote-known ids) but its failure is absorbed: the local write
    /// always lands, so the operation still succeeds.
    #[tracing::instrument(skip(self, task), fields(id = ?task.id))]
    pub async fn update(&mut self, task: Task) -> Result<()> {
        self.begin();

        let Some(id) = task.id else {
            return Err(self.fail(Error::Validation(
                "cannot update a task without an id".to_string(),
            )));
        };
        let Some(idx) = self.position(id) else {
            return Err(self.fail(Error::NotFound(id)));
        };

        if let Err(err) = self.gateway.update(&task).await {
            warn!(id, error = %err, "remote update failed, keeping local write");
        }

        let mut next = self.tasks.clone();
        next[idx] = task;
        if let Err(err) = self.cache.write_tasks(&next) {
            return Err(self.fail(err));
        }
        self.tasks = next;
        self.succeed();
        info!(id, "updated task");
        Ok(())
    }

    /// Removes the entry with `id`. The remote delete is best-effort; the
    /// local removal happens regardless of the gateway outcome.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&mut self, id: u64) -> Result<()> {
        self.begin();

        let Some(idx) = self.position(id) else {
            return Err(self.fail(Error::NotFound(id)));
        };

        if let Err(err) = self.gateway.delete(id).await {
            warn!(id, error = %err, "remote delete failed, removing locally anyway");
        }

        let mut next = self.tasks.clone();
        next.remove(idx);
        if let Err(err) = self.cache.write_tasks(&next) {
            return Err(self.fail(err));
        }
        self.tasks = next;
        self.succeed();
        info!(id, "deleted task");
        Ok(())
    }

    /// Replaces the active filter and persists it. Synchronous, no gateway
    /// involvement, status untouched.
    pub fn set_filter(&mut self, filter: FilterState) -> Result<()> {
        self.cache.write_filter(&filter)?;
        debug!(?filter, "filter changed");
        self.filter = filter;
        Ok(())
    }

    /// Looks a task up by id: the local collection first, the remote on a
    /// local miss. Read-only; status untouched.
    #[tracing::instrument(skip(self))]
    pub async fn find_task(&self, id: u64) -> Result<Task> {
        if let Some(task) = self.tasks.iter().find(|t| t.id == Some(id)) {
            return Ok(task.clone());
        }
        debug!(id, "task not cached locally, asking remote");
        self.gateway.get(id).await
    }

    /// The derived view: the collection projected through the active filter,
    /// in insertion order.
    pub fn filtered(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::of(&self.tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == Some(id))
    }

    fn begin(&mut self) {
        self.status = SyncStatus::Loading;
        self.last_error = None;
    }

    fn succeed(&mut self) {
        self.status = SyncStatus::Succeeded;
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = SyncStatus::Failed;
        self.last_error = Some(err.to_string());
        err
    }
}
