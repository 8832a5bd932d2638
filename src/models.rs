//! Typed views of Jira search responses
//!
//! The client hands back raw JSON; these types are used where the CLI needs
//! to read individual fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Response of `GET /rest/api/2/search`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchResponse {
    #[serde(default)]
    pub expand: Option<String>,
    #[serde(rename = "startAt")]
    pub start_at: u64,
    #[serde(rename = "maxResults")]
    pub max_results: u64,
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl SearchResponse {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Whether the server holds more results than this page returned
    pub fn has_more(&self) -> bool {
        self.start_at + (self.issues.len() as u64) < self.total
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Issue {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(rename = "issuetype", default)]
    pub issue_type: Option<IssueType>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    /// Custom fields and anything else requested through `fields`
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IssueType {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IssueStatus {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "statusCategory", default)]
    pub status_category: Option<StatusCategory>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatusCategory {
    #[serde(default)]
    pub id: Option<u64>,
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Issue {
    pub fn type_name(&self) -> &str {
        self.fields
            .issue_type
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or("-")
    }

    pub fn status_name(&self) -> &str {
        self.fields
            .status
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("-")
    }

    /// Whether Jira puts the status in its "done" category
    pub fn is_done(&self) -> bool {
        self.fields
            .status
            .as_ref()
            .and_then(|s| s.status_category.as_ref())
            .map(|c| c.key == "done")
            .unwrap_or(false)
    }

    /// Value of a custom field's `value` attribute (e.g., select lists)
    pub fn custom_value(&self, field: &str) -> Option<&str> {
        self.fields
            .extra
            .get(field)
            .and_then(|v| v.get("value"))
            .and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "expand": "schema,names",
            "startAt": 0,
            "maxResults": 2,
            "total": 57,
            "issues": [
                {
                    "expand": "operations",
                    "id": "10001",
                    "self": "https://jira.example.com/rest/api/2/issue/10001",
                    "key": "CHG-1",
                    "fields": {
                        "issuetype": {"id": "10100", "name": "Change", "subtask": false},
                        "status": {
                            "id": "6",
                            "name": "Closed",
                            "statusCategory": {"id": 3, "key": "done", "name": "Done"}
                        },
                        "customfield_10500": {"value": "Successful"}
                    }
                },
                {
                    "id": "10002",
                    "key": "OPS-7",
                    "fields": {
                        "issuetype": {"name": "Story"},
                        "status": {
                            "name": "In Progress",
                            "statusCategory": {"key": "indeterminate"}
                        }
                    }
                }
            ]
        })
    }

    #[test]
    fn test_parse_search_response() {
        let response = SearchResponse::from_value(sample()).unwrap();

        assert_eq!(response.total, 57);
        assert_eq!(response.max_results, 2);
        assert_eq!(response.issues.len(), 2);
        assert!(response.has_more());

        let first = &response.issues[0];
        assert_eq!(first.key, "CHG-1");
        assert_eq!(first.type_name(), "Change");
        assert_eq!(first.status_name(), "Closed");
        assert!(first.is_done());
        assert_eq!(first.custom_value("customfield_10500"), Some("Successful"));

        let second = &response.issues[1];
        assert!(!second.is_done());
        assert_eq!(second.custom_value("customfield_10500"), None);
    }

    #[test]
    fn test_missing_fields_render_as_dash() {
        let issue: Issue = serde_json::from_value(json!({"id": "1", "key": "OPS-1"})).unwrap();
        assert_eq!(issue.type_name(), "-");
        assert_eq!(issue.status_name(), "-");
    }

    #[test]
    fn test_last_page_has_no_more() {
        let response = SearchResponse::from_value(json!({
            "startAt": 56, "maxResults": 2, "total": 57,
            "issues": [{"id": "1", "key": "OPS-1"}]
        }))
        .unwrap();
        assert!(!response.has_more());
    }
}
