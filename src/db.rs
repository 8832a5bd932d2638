//! SQLite-backed storage for tracked issues.
//!
//! Three tables mirror the Epic -> Story -> Task hierarchy. Children reference
//! their parent with `ON DELETE CASCADE`, so removing an epic removes its
//! stories and, through them, their tasks.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::error::{Error, Result};
use crate::tracking::{Epic, Story, Task, TrackedIssue};

/// SQL schema for the tracking database.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS epics (
    id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    close_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    close_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    epic_id TEXT NOT NULL,
    FOREIGN KEY (epic_id) REFERENCES epics(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    status TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    close_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    story_id TEXT NOT NULL,
    business_unit TEXT NOT NULL,
    close_code TEXT,
    FOREIGN KEY (story_id) REFERENCES stories(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_stories_epic ON stories(epic_id);
CREATE INDEX IF NOT EXISTS idx_tasks_story ON tasks(story_id);
"#;

const BASE_COLUMNS: &str = "id, status, issue_type, close_date, created_at, updated_at";

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(value: &str, column: &str) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Read the shared base columns, which every query selects first.
fn row_to_base(row: &Row) -> std::result::Result<TrackedIssue, rusqlite::Error> {
    let close_date: Option<String> = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(TrackedIssue {
        id: row.get(0)?,
        status: row.get(1)?,
        issue_type: row.get(2)?,
        close_date: close_date
            .map(|s| parse_timestamp(&s, "close_date"))
            .transpose()?,
        created_at: parse_timestamp(&created_at, "created_at")?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
    })
}

fn row_to_epic(row: &Row) -> std::result::Result<Epic, rusqlite::Error> {
    Ok(Epic {
        issue: row_to_base(row)?,
    })
}

fn row_to_story(row: &Row) -> std::result::Result<Story, rusqlite::Error> {
    Ok(Story {
        issue: row_to_base(row)?,
        epic_id: row.get(6)?,
    })
}

fn row_to_task(row: &Row) -> std::result::Result<Task, rusqlite::Error> {
    Ok(Task {
        issue: row_to_base(row)?,
        story_id: row.get(6)?,
        business_unit: row.get(7)?,
        close_code: row.get(8)?,
    })
}

/// Database handle for tracked issues.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Cascades only fire with foreign keys enabled, per connection.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    fn exists(&self, table: &str, id: &str) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) > 0 FROM {table} WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], |row| row.get(0))?)
    }

    /// Jira keys are unique across levels; refuse an id any table already holds.
    fn ensure_untracked(&self, id: &str) -> Result<()> {
        for (table, level) in [("epics", "an epic"), ("stories", "a story"), ("tasks", "a task")] {
            if self.exists(table, id)? {
                return Err(Error::AlreadyTracked {
                    id: id.to_string(),
                    level,
                });
            }
        }
        Ok(())
    }

    /// Insert a new epic.
    pub fn insert_epic(&self, epic: &Epic) -> Result<()> {
        let issue = &epic.issue;
        self.ensure_untracked(&issue.id)?;
        self.conn.execute(
            &format!("INSERT INTO epics ({BASE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                issue.id,
                issue.status,
                issue.issue_type,
                issue.close_date.map(|d| d.to_rfc3339()),
                issue.created_at.to_rfc3339(),
                issue.updated_at.to_rfc3339(),
            ],
        )?;
        info!(id = %issue.id, "tracked epic");
        Ok(())
    }

    /// Insert a new story under an existing epic.
    pub fn insert_story(&self, story: &Story) -> Result<()> {
        if !self.exists("epics", &story.epic_id)? {
            return Err(Error::NotFound(story.epic_id.clone()));
        }

        let issue = &story.issue;
        self.ensure_untracked(&issue.id)?;
        self.conn.execute(
            &format!(
                "INSERT INTO stories ({BASE_COLUMNS}, epic_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                issue.id,
                issue.status,
                issue.issue_type,
                issue.close_date.map(|d| d.to_rfc3339()),
                issue.created_at.to_rfc3339(),
                issue.updated_at.to_rfc3339(),
                story.epic_id,
            ],
        )?;
        info!(id = %issue.id, epic = %story.epic_id, "tracked story");
        Ok(())
    }

    /// Insert a new task under an existing story.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        if !self.exists("stories", &task.story_id)? {
            return Err(Error::NotFound(task.story_id.clone()));
        }

        let issue = &task.issue;
        self.ensure_untracked(&issue.id)?;
        self.conn.execute(
            &format!(
                "INSERT INTO tasks ({BASE_COLUMNS}, story_id, business_unit, close_code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                issue.id,
                issue.status,
                issue.issue_type,
                issue.close_date.map(|d| d.to_rfc3339()),
                issue.created_at.to_rfc3339(),
                issue.updated_at.to_rfc3339(),
                task.story_id,
                task.business_unit,
                task.close_code,
            ],
        )?;
        info!(id = %issue.id, story = %task.story_id, "tracked task");
        Ok(())
    }

    pub fn get_epic(&self, id: &str) -> Result<Epic> {
        self.conn
            .query_row(
                &format!("SELECT {BASE_COLUMNS} FROM epics WHERE id = ?1"),
                [id],
                row_to_epic,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn get_story(&self, id: &str) -> Result<Story> {
        self.conn
            .query_row(
                &format!("SELECT {BASE_COLUMNS}, epic_id FROM stories WHERE id = ?1"),
                [id],
                row_to_story,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn get_task(&self, id: &str) -> Result<Task> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {BASE_COLUMNS}, story_id, business_unit, close_code FROM tasks WHERE id = ?1"
                ),
                [id],
                row_to_task,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// List all epics ordered by id.
    pub fn list_epics(&self) -> Result<Vec<Epic>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BASE_COLUMNS} FROM epics ORDER BY id"))?;
        let epics = stmt
            .query_map([], row_to_epic)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(epics)
    }

    /// List the stories of an epic ordered by id.
    pub fn stories_for_epic(&self, epic_id: &str) -> Result<Vec<Story>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BASE_COLUMNS}, epic_id FROM stories WHERE epic_id = ?1 ORDER BY id"
        ))?;
        let stories = stmt
            .query_map([epic_id], row_to_story)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stories)
    }

    /// List the tasks of a story ordered by id.
    pub fn tasks_for_story(&self, story_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BASE_COLUMNS}, story_id, business_unit, close_code
             FROM tasks WHERE story_id = ?1 ORDER BY id"
        ))?;
        let tasks = stmt
            .query_map([story_id], row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Update the status of any tracked issue, whichever level it lives at.
    pub fn update_status(&self, id: &str, status: &str, now: DateTime<Utc>) -> Result<()> {
        let mut changed = 0;
        for table in ["epics", "stories", "tasks"] {
            changed += self.conn.execute(
                &format!("UPDATE {table} SET status = ?1, updated_at = ?2 WHERE id = ?3"),
                params![status, now.to_rfc3339(), id],
            )?;
        }

        if changed == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        info!(%id, %status, "updated status");
        Ok(())
    }

    /// Mark a task closed with an optional close code.
    pub fn close_task(
        &self,
        id: &str,
        status: &str,
        close_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let stamp = now.to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1, close_code = ?2, close_date = ?3, updated_at = ?3
             WHERE id = ?4",
            params![status, close_code, stamp, id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        info!(%id, ?close_code, "closed task");
        Ok(())
    }

    /// Delete an epic together with its stories and their tasks.
    pub fn delete_epic(&self, id: &str) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM epics WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        info!(%id, "deleted epic");
        Ok(())
    }

    /// Number of rows in each table as (epics, stories, tasks).
    pub fn counts(&self) -> Result<(usize, usize, usize)> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok((count("epics")?, count("stories")?, count("tasks")?))
    }
}
