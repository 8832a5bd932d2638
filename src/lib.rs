//! # jira-track
//!
//! A small Jira REST client paired with a local Epic/Story/Task tracking store.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod jira;
pub mod jql;
pub mod keys;
pub mod models;
pub mod payload;
pub mod tracking;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use jira::JiraClient;
pub use payload::IssuePayload;
pub use tracking::{Epic, Story, Task, TrackedIssue};
