use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum title length accepted from the entry form.
pub const MIN_TITLE_LEN: usize = 5;

/// A to-do item. `id` is `None` only transiently, before the synchronizer
/// assigns one; within a collection ids are unique (app-enforced, the remote
/// store does not guarantee it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<u64>,

    pub title: String,

    pub completed: bool,

    #[serde(default = "default_user_id")]
    pub user_id: u64,
}

fn default_user_id() -> u64 {
    1
}

/// A task before identity assignment, as produced by the entry form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default = "default_user_id")]
    pub user_id: u64,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            user_id: 1,
        }
    }

    /// Form-boundary rule: the trimmed title must be at least
    /// [`MIN_TITLE_LEN`] characters.
    pub fn validate(&self) -> Result<()> {
        let len = self.title.trim().chars().count();
        if len < MIN_TITLE_LEN {
            return Err(Error::Validation(format!(
                "title must be at least {MIN_TITLE_LEN} characters, got {len}"
            )));
        }
        Ok(())
    }

    pub fn into_task(self, id: u64) -> Task {
        Task {
            id: Some(id),
            title: self.title,
            completed: self.completed,
            user_id: self.user_id,
        }
    }
}

/// Summary counts over the unfiltered collection, for header chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub all: usize,
    pub completed: usize,
    pub pending: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            all: tasks.len(),
            completed,
            pending: tasks.len() - completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_validation_enforces_minimum_title() {
        assert!(TaskDraft::new("Clean desk").validate().is_ok());
        assert!(TaskDraft::new("abcde").validate().is_ok());

        let err = TaskDraft::new("abcd").validate().expect_err("too short");
        assert!(matches!(err, Error::Validation(_)));

        // Whitespace padding does not count toward the minimum.
        let err = TaskDraft::new("  ab  ").validate().expect_err("too short");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn task_round_trips_with_camel_case_wire_names() {
        let task = Task {
            id: Some(7),
            title: "Buy milk".to_string(),
            completed: false,
            user_id: 3,
        };
        let json = serde_json::to_string(&task).expect("serialize");
        assert!(json.contains("\"userId\":3"));

        let back: Task = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, task);
    }

    #[test]
    fn missing_user_id_defaults_to_one() {
        let task: Task =
            serde_json::from_str(r#"{"id":1,"title":"Buy milk","completed":false}"#)
                .expect("deserialize");
        assert_eq!(task.user_id, 1);
    }

    #[test]
    fn counts_split_by_completion() {
        let tasks = vec![
            TaskDraft::new("Write tests").into_task(1),
            Task {
                completed: true,
                ..TaskDraft::new("Ship build").into_task(2)
            },
        ];
        let counts = TaskCounts::of(&tasks);
        assert_eq!(counts.all, 2);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.pending, 1);
    }
}
