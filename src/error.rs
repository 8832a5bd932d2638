use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Jira URL not configured. Set jira.url in config or JIRA_URL environment variable")]
    MissingJiraUrl,

    #[error("Invalid issue key: {0} (expected something like OPS-123)")]
    InvalidIssueKey(String),

    #[error("Tracked issue not found: {0}")]
    NotFound(String),

    #[error("{id} is already tracked as {level}")]
    AlreadyTracked { id: String, level: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    #[error("User cancelled operation")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl From<inquire::error::InquireError> for Error {
    fn from(err: inquire::error::InquireError) -> Self {
        match err {
            inquire::error::InquireError::OperationCanceled => Error::Cancelled,
            inquire::error::InquireError::OperationInterrupted => Error::Cancelled,
            other => Error::Prompt(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failed Jira request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Authentication,
    Permission,
    Unexpected,
}

impl Failure {
    /// Classify an error by the status code appearing in its text
    pub fn classify(text: &str) -> Self {
        if text.contains("401") {
            Failure::Authentication
        } else if text.contains("403") {
            Failure::Permission
        } else {
            Failure::Unexpected
        }
    }

    /// Message shown to the user for this kind of failure
    pub fn message(&self) -> &'static str {
        match self {
            Failure::Authentication => {
                "Authentication failed. Check your Jira user and API token."
            }
            Failure::Permission => "Permission denied. Your account cannot perform this action.",
            Failure::Unexpected => "An unexpected error occurred while talking to Jira.",
        }
    }
}

/// Message printed when a command fails, or `None` when the user cancelled
///
/// Only HTTP failures are classified; everything else prints as-is.
pub fn user_message(err: &Error) -> Option<String> {
    match err {
        Error::Cancelled => None,
        Error::Http(http) => Some(Failure::classify(&http.to_string()).message().to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_authentication() {
        let failure = Failure::classify(
            "HTTP status client error (401 Unauthorized) for url (https://jira/rest/api/2/search)",
        );
        assert_eq!(failure, Failure::Authentication);
        assert!(failure.message().contains("Authentication failed"));
    }

    #[test]
    fn test_classify_permission() {
        let failure = Failure::classify("HTTP status client error (403 Forbidden)");
        assert_eq!(failure, Failure::Permission);
        assert!(failure.message().contains("Permission denied"));
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            Failure::classify("connection refused"),
            Failure::Unexpected
        );
        assert_eq!(
            Failure::classify("HTTP status server error (500 Internal Server Error)"),
            Failure::Unexpected
        );
        assert!(Failure::Unexpected.message().contains("unexpected error"));
    }

    #[test]
    fn test_user_message_only_classifies_http() {
        assert_eq!(user_message(&Error::Cancelled), None);

        // A non-HTTP error mentioning 401 is printed verbatim, not classified.
        let not_found = Error::NotFound("OPS-401".into());
        assert_eq!(
            user_message(&not_found).as_deref(),
            Some("Tracked issue not found: OPS-401")
        );

        let invalid = Error::InvalidInput("bad".into());
        assert_eq!(user_message(&invalid).as_deref(), Some("Invalid input: bad"));
    }

    #[test]
    fn test_inquire_cancel_maps_to_cancelled() {
        let err: Error = inquire::error::InquireError::OperationCanceled.into();
        assert!(matches!(err, Error::Cancelled));
    }
}
