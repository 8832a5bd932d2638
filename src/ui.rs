use colored::Colorize;
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::validator::Validation;
use inquire::{set_global_render_config, CustomUserError, Select, Text};

use crate::error::Error;
use crate::models::{Issue, SearchResponse};
use crate::tracking::TrackedIssue;

/// Issue types offered when creating an issue interactively
pub const ISSUE_TYPES: [&str; 5] = ["Epic", "Story", "Task", "Change", "Bug"];

/// Initialize the global render configuration for inquire prompts
pub fn init_render_config() {
    let mut style = RenderConfig::default_colored();
    style.prompt_prefix = Styled::new(">").with_fg(Color::LightGreen);
    set_global_render_config(style);
}

fn not_empty(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("A value is required".into()))
    } else {
        Ok(Validation::Valid)
    }
}

/// Prompt for the project key of a new issue
pub fn prompt_project() -> Result<String, Error> {
    Text::new("Project key:")
        .with_validator(not_empty)
        .prompt()
        .map(|p| p.trim().to_uppercase())
        .map_err(map_inquire_error)
}

/// Prompt for the summary of a new issue
pub fn prompt_summary() -> Result<String, Error> {
    Text::new("Summary:")
        .with_validator(not_empty)
        .prompt()
        .map_err(map_inquire_error)
}

/// Prompt for the issue type of a new issue
pub fn prompt_issue_type() -> Result<String, Error> {
    Select::new("Issue type:", ISSUE_TYPES.to_vec())
        .prompt()
        .map(|t| t.to_string())
        .map_err(map_inquire_error)
}

/// Print one line per issue of a search page
///
/// The close code is shown when `close_code_field` was among the requested fields.
pub fn print_search(response: &SearchResponse, close_code_field: &str) {
    for issue in &response.issues {
        println!("{} {}", ">".bright_green(), search_line(issue, close_code_field));
    }

    let shown = response.issues.len() as u64;
    println!(
        "{} Showing {}-{} of {}",
        ">".bright_green(),
        if shown == 0 { 0 } else { response.start_at + 1 },
        response.start_at + shown,
        response.total
    );
    if response.has_more() {
        println!(
            "{} More results available, use --start-at {}",
            ">".bright_green(),
            response.start_at + shown
        );
    }
}

fn search_line(issue: &Issue, close_code_field: &str) -> String {
    let summary = issue.fields.summary.as_deref().unwrap_or("");
    let status = if issue.is_done() {
        issue.status_name().bright_black()
    } else {
        issue.status_name().bright_cyan()
    };
    let close_code = match issue.custom_value(close_code_field) {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    };

    format!(
        "{:<12} {:<8} {:<14}{} {}",
        issue.key.bright_cyan(),
        issue.type_name(),
        status,
        close_code,
        summary
    )
}

/// Print a tracked issue line, indented by its depth in the hierarchy
pub fn print_tracked(depth: usize, issue: &TrackedIssue, extra: &str) {
    let marker = if issue.is_closed() {
        "x".bright_black()
    } else {
        "+".bright_green()
    };
    println!(
        "{}{} {} [{}] {}{}",
        "  ".repeat(depth),
        marker,
        issue.id.bright_cyan(),
        issue.issue_type,
        issue.status,
        extra
    );
}

/// Map inquire errors to our error type
fn map_inquire_error(err: InquireError) -> Error {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => Error::Cancelled,
        _ => Error::Prompt(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty_validator() {
        assert!(matches!(not_empty("OPS").unwrap(), Validation::Valid));
        assert!(matches!(not_empty("   ").unwrap(), Validation::Invalid(_)));
    }

    #[test]
    fn test_search_line_shows_close_code() {
        colored::control::set_override(false);

        let closed: Issue = serde_json::from_value(serde_json::json!({
            "id": "1",
            "key": "CHG-1",
            "fields": {
                "summary": "Patch routers",
                "issuetype": {"name": "Change"},
                "status": {"name": "Closed", "statusCategory": {"key": "done"}},
                "customfield_10500": {"value": "Successful"}
            }
        }))
        .unwrap();
        let line = search_line(&closed, "customfield_10500");
        assert!(line.contains("CHG-1"));
        assert!(line.contains("(Successful)"));
        assert!(line.ends_with("Patch routers"));

        let open: Issue =
            serde_json::from_value(serde_json::json!({"id": "2", "key": "OPS-2"})).unwrap();
        assert!(!search_line(&open, "customfield_10500").contains('('));
    }

    #[test]
    fn test_map_inquire_error() {
        assert!(matches!(
            map_inquire_error(InquireError::OperationInterrupted),
            Error::Cancelled
        ));
        assert!(matches!(
            map_inquire_error(InquireError::InvalidConfiguration("bad".into())),
            Error::Prompt(_)
        ));
    }
}
