use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref PATTERN: Regex = Regex::new(r"^[A-Z][A-Z0-9_]*-\d+$").unwrap();
    static ref NUMERIC_ID: Regex = Regex::new(r"^\d+$").unwrap();
}

/// Check whether a string looks like a Jira issue key (e.g., "OPS-123")
pub fn is_valid(key: &str) -> bool {
    PATTERN.is_match(key)
}

/// Validate an issue key, returning it unchanged when it is well formed
pub fn validate(key: &str) -> Result<&str> {
    if is_valid(key) {
        Ok(key)
    } else {
        Err(Error::InvalidIssueKey(key.to_string()))
    }
}

/// Validate a reference to a remote issue: either a key or Jira's numeric id
pub fn validate_ref(key_or_id: &str) -> Result<&str> {
    if is_valid(key_or_id) || NUMERIC_ID.is_match(key_or_id) {
        Ok(key_or_id)
    } else {
        Err(Error::InvalidIssueKey(key_or_id.to_string()))
    }
}

/// Project part of an issue key (e.g., "OPS-123" -> "OPS")
pub fn project_of(key: &str) -> Option<&str> {
    if !is_valid(key) {
        return None;
    }
    key.rsplit_once('-').map(|(project, _)| project)
}
