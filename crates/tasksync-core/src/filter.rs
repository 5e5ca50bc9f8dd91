use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

/// The active view filter. Persisted to the cache on every change and
/// restored at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub status: StatusFilter,

    #[serde(default)]
    pub search_term: String,
}

impl FilterState {
    pub fn new(status: StatusFilter, search_term: impl Into<String>) -> Self {
        Self {
            status,
            search_term: search_term.into(),
        }
    }

    /// Whether a task is visible under this filter.
    ///
    /// A non-empty search term restricts to case-insensitive title containment
    /// and bypasses the status filter entirely; the status filter only applies
    /// when the search term is empty. That mirrors the shipped behavior, kept
    /// deliberately until product intent says otherwise.
    pub fn matches(&self, task: &Task) -> bool {
        if !self.search_term.is_empty() {
            let needle = self.search_term.to_lowercase();
            let hit = task.title.to_lowercase().contains(&needle);
            trace!(title = %task.title, term = %self.search_term, hit, "search match");
            return hit;
        }

        match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        }
    }

    /// Projects the visible subset of `tasks`, preserving insertion order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    fn task(id: u64, title: &str, completed: bool) -> Task {
        let mut t = TaskDraft::new(title).into_task(id);
        t.completed = completed;
        t
    }

    #[test]
    fn default_filter_passes_everything() {
        let tasks = vec![task(1, "A", true), task(2, "B", false)];
        let filter = FilterState::default();
        assert_eq!(filter.apply(&tasks).len(), 2);
    }

    #[test]
    fn status_filter_selects_by_completion() {
        let tasks = vec![task(1, "A", true), task(2, "B", false)];

        let completed = FilterState::new(StatusFilter::Completed, "");
        let visible = completed.apply(&tasks);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, Some(1));

        let pending = FilterState::new(StatusFilter::Pending, "");
        let visible = pending.apply(&tasks);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, Some(2));
    }

    #[test]
    fn search_is_case_insensitive_containment() {
        let tasks = vec![task(1, "Buy milk", false), task(2, "Clean desk", false)];
        let filter = FilterState::new(StatusFilter::All, "MILK");
        let visible = filter.apply(&tasks);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, Some(1));
    }

    #[test]
    fn search_term_bypasses_status_filter() {
        // "Buy milk" is pending; a completed-only status filter would hide it,
        // but the search term takes over while present.
        let tasks = vec![task(1, "Buy milk", false), task(2, "Buy stamps", true)];
        let filter = FilterState::new(StatusFilter::Completed, "buy");
        let visible = filter.apply(&tasks);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn empty_search_restores_status_filtering() {
        let tasks = vec![task(1, "Buy milk", false), task(2, "Buy stamps", true)];
        let filter = FilterState::new(StatusFilter::Completed, "");
        let visible = filter.apply(&tasks);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, Some(2));
    }
}
