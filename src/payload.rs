use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Reference to a Jira entity by key (project or parent issue)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KeyRef {
    pub key: String,
}

/// Reference to an issue type by name
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NameRef {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct IssueFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<KeyRef>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(rename = "issuetype", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<NameRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<KeyRef>,
}

/// Represents an issue creation payload sent to Jira
///
/// Serializes to `{"fields": {"project": {"key": ..}, "summary": .., "issuetype": {"name": ..}}}`
/// with `description` and `parent` only present when set.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct IssuePayload {
    pub fields: IssueFields,
}

impl IssuePayload {
    /// Creates a new IssuePayload with empty fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project key and returns self for chaining
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.fields.project = Some(KeyRef { key: project.into() });
        self
    }

    /// Sets the summary and returns self for chaining
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.fields.summary = summary.into();
        self
    }

    /// Sets the issue type name (e.g., "Story") and returns self for chaining
    pub fn with_issue_type(mut self, issue_type: impl Into<String>) -> Self {
        self.fields.issue_type = Some(NameRef {
            name: issue_type.into(),
        });
        self
    }

    /// Sets the description and returns self for chaining
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.fields.description = Some(description.into());
        self
    }

    /// Sets the parent issue key and returns self for chaining
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.fields.parent = Some(KeyRef { key: parent.into() });
        self
    }

    /// Convert into a JSON value ready to be posted
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
