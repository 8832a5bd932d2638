//! JQL query composition
//!
//! Builds simple `AND`-joined JQL clauses from project, issue type and status
//! filters, for searches that are not given a raw query.

/// Quote a JQL value, escaping backslashes and double quotes
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A set of filters that render to a JQL query
#[derive(Debug, Default, Clone)]
pub struct JqlFilter {
    pub project: Option<String>,
    pub issue_types: Vec<String>,
    pub statuses: Vec<String>,
    pub order_by: Option<String>,
}

impl JqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_issue_types(mut self, issue_types: Vec<String>) -> Self {
        self.issue_types = issue_types;
        self
    }

    pub fn with_statuses(mut self, statuses: Vec<String>) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.project.is_none() && self.issue_types.is_empty() && self.statuses.is_empty()
    }

    /// Render the filter as JQL
    ///
    /// # Returns
    /// e.g. `project = "OPS" AND issuetype in ("Epic", "Story") ORDER BY key`
    pub fn to_jql(&self) -> String {
        let mut clauses: Vec<String> = vec![];

        if let Some(project) = &self.project {
            clauses.push(format!("project = {}", quote(project)));
        }
        if let Some(clause) = in_clause("issuetype", &self.issue_types) {
            clauses.push(clause);
        }
        if let Some(clause) = in_clause("status", &self.statuses) {
            clauses.push(clause);
        }

        let mut jql = clauses.join(" AND ");

        if let Some(order_by) = &self.order_by {
            if !jql.is_empty() {
                jql.push(' ');
            }
            jql.push_str(&format!("ORDER BY {}", order_by));
        }

        jql
    }
}

fn in_clause(field: &str, values: &[String]) -> Option<String> {
    match values {
        [] => None,
        [single] => Some(format!("{} = {}", field, quote(single))),
        many => {
            let quoted: Vec<String> = many.iter().map(|v| quote(v)).collect();
            Some(format!("{} in ({})", field, quoted.join(", ")))
        }
    }
}
