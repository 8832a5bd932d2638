//! Locally tracked Epic / Story / Task records
//!
//! Every record embeds [`TrackedIssue`], the fields shared by all levels.
//! Stories point at their Epic and Tasks at their Story; parents are fixed
//! at creation, so the chain is always Task -> Story -> Epic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields shared by every tracked issue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackedIssue {
    /// The Jira issue key (e.g., "OPS-123")
    pub id: String,
    pub status: String,
    pub issue_type: String,
    pub close_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedIssue {
    pub fn new(
        id: impl Into<String>,
        status: impl Into<String>,
        issue_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            issue_type: issue_type.into(),
            close_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.close_date.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Epic {
    #[serde(flatten)]
    pub issue: TrackedIssue,
}

impl Epic {
    pub fn new(id: impl Into<String>, status: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            issue: TrackedIssue::new(id, status, "Epic", now),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Story {
    #[serde(flatten)]
    pub issue: TrackedIssue,
    pub epic_id: String,
}

impl Story {
    pub fn new(
        id: impl Into<String>,
        status: impl Into<String>,
        epic_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            issue: TrackedIssue::new(id, status, "Story", now),
            epic_id: epic_id.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    #[serde(flatten)]
    pub issue: TrackedIssue,
    pub story_id: String,
    pub business_unit: String,
    pub close_code: Option<String>,
}

impl Task {
    /// Create a task; `issue_type` is free-form since change tickets are tracked as tasks too
    pub fn new(
        id: impl Into<String>,
        status: impl Into<String>,
        issue_type: impl Into<String>,
        story_id: impl Into<String>,
        business_unit: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            issue: TrackedIssue::new(id, status, issue_type, now),
            story_id: story_id.into(),
            business_unit: business_unit.into(),
            close_code: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_share_base_fields() {
        let now = Utc::now();
        let epic = Epic::new("OPS-1", "Open", now);
        let story = Story::new("OPS-2", "Open", "OPS-1", now);
        let task = Task::new("OPS-3", "Open", "Change", "OPS-2", "Retail", now);

        assert_eq!(epic.issue.issue_type, "Epic");
        assert_eq!(story.issue.issue_type, "Story");
        assert_eq!(task.issue.issue_type, "Change");
        assert_eq!(story.epic_id, "OPS-1");
        assert_eq!(task.story_id, "OPS-2");
        assert_eq!(task.issue.created_at, task.issue.updated_at);
        assert!(!task.issue.is_closed());
        assert!(task.close_code.is_none());
    }

    #[test]
    fn test_serialized_task_is_flat() {
        let task = Task::new("OPS-3", "Open", "Task", "OPS-2", "Retail", Utc::now());
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["id"], "OPS-3");
        assert_eq!(value["story_id"], "OPS-2");
        assert!(value.get("issue").is_none());
    }
}
