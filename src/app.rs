use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use serde_json::Value;

use crate::cli::{Args, Command, CreateArgs, IssueCommand, SearchArgs, TrackCommand};
use crate::config::{self, Config};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::jira::JiraClient;
use crate::jql::JqlFilter;
use crate::keys;
use crate::models::SearchResponse;
use crate::payload::IssuePayload;
use crate::tracking::{Epic, Story, Task};
use crate::ui;

/// Main application entry point
pub fn run(args: Args) -> Result<()> {
    let config_dir = match args.config {
        Some(dir) => dir,
        None => config::default_config_dir()?,
    };
    config::ensure_config_dir_exists(&config_dir)?;
    let config = Config::load(&config_dir)?;

    match args.command {
        Command::Issue(command) => {
            let client = JiraClient::from_config(&config.jira)?;
            run_issue(&client, command)
        }
        Command::Track(command) => {
            let db = Database::open(&config.database_path())?;
            run_track(&db, command)
        }
    }
}

fn run_issue(client: &JiraClient, command: IssueCommand) -> Result<()> {
    match command {
        IssueCommand::Get { key } => {
            let issue = client.get_issue(keys::validate_ref(&key)?)?;
            print_json(&issue)
        }
        IssueCommand::Create(create) => {
            let payload = build_payload(create)?;
            let created = client.create_issue(&payload.to_value()?)?;
            match created.get("key").and_then(Value::as_str) {
                Some(key) => println!("{} Created {}", ">".bright_green(), key.bright_cyan()),
                None => print_json(&created)?,
            }
            Ok(())
        }
        IssueCommand::BulkCreate { file } => {
            let payloads = read_payloads(&file)?;
            let created = client.bulk_create_issues(&payloads)?;
            print_json(&created)
        }
        IssueCommand::Close { key, close_code } => {
            client.close_issue(keys::validate_ref(&key)?, close_code.as_deref())?;
            println!("{} Closed {}", ">".bright_green(), key.bright_cyan());
            Ok(())
        }
        IssueCommand::Search(search) => run_search(client, search),
    }
}

fn run_search(client: &JiraClient, search: SearchArgs) -> Result<()> {
    let jql = match search.jql {
        Some(jql) => jql,
        None => {
            let mut filter = JqlFilter::new()
                .with_issue_types(search.issue_types)
                .with_statuses(search.statuses)
                .with_order_by("key");
            if let Some(project) = search.project {
                filter = filter.with_project(project);
            }
            if filter.is_empty() {
                return Err(Error::InvalidInput(
                    "Provide a JQL query or at least one of --project, --type, --status".into(),
                ));
            }
            filter.to_jql()
        }
    };

    let response = client.search_issues(&jql, &search.fields, search.max_results, search.start_at)?;

    if search.json {
        return print_json(&response);
    }

    ui::print_search(
        &SearchResponse::from_value(response)?,
        client.close_code_field(),
    );
    Ok(())
}

/// Fill in an issue payload from arguments, prompting for missing required fields
fn build_payload(create: CreateArgs) -> Result<IssuePayload> {
    if let Some(parent) = &create.parent {
        keys::validate(parent)?;
    }

    let needs_prompt =
        create.project.is_none() || create.summary.is_none() || create.issue_type.is_none();
    if needs_prompt {
        ui::init_render_config();
    }

    let project = match create
        .project
        .or_else(|| create.parent.as_deref().and_then(keys::project_of).map(String::from))
    {
        Some(project) => project,
        None => ui::prompt_project()?,
    };
    let summary = match create.summary {
        Some(summary) => summary,
        None => ui::prompt_summary()?,
    };
    let issue_type = match create.issue_type {
        Some(issue_type) => issue_type,
        None => ui::prompt_issue_type()?,
    };

    let mut payload = IssuePayload::new()
        .with_project(project)
        .with_summary(summary)
        .with_issue_type(issue_type);

    if let Some(description) = create.description {
        payload = payload.with_description(description);
    }
    if let Some(parent) = create.parent {
        payload = payload.with_parent(parent);
    }

    Ok(payload)
}

fn read_payloads(file: &Path) -> Result<Vec<Value>> {
    let contents = std::fs::read_to_string(file)?;
    let payloads: Vec<Value> = serde_json::from_str(&contents)?;

    if payloads.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} holds no issue payloads",
            file.display()
        )));
    }

    Ok(payloads)
}

fn run_track(db: &Database, command: TrackCommand) -> Result<()> {
    let now = Utc::now();

    match command {
        TrackCommand::AddEpic { id, status } => {
            db.insert_epic(&Epic::new(keys::validate(&id)?, status, now))?;
            println!("{} Tracking epic {}", "+".bright_green(), id.bright_cyan());
        }
        TrackCommand::AddStory { id, epic, status } => {
            db.insert_story(&Story::new(keys::validate(&id)?, status, epic, now))?;
            println!("{} Tracking story {}", "+".bright_green(), id.bright_cyan());
        }
        TrackCommand::AddTask {
            id,
            story,
            business_unit,
            issue_type,
            status,
        } => {
            let task = Task::new(
                keys::validate(&id)?,
                status,
                issue_type,
                story,
                business_unit,
                now,
            );
            db.insert_task(&task)?;
            println!("{} Tracking task {}", "+".bright_green(), id.bright_cyan());
        }
        TrackCommand::Status { id, status } => {
            db.update_status(&id, &status, now)?;
            println!("{} {} is now {}", ">".bright_green(), id.bright_cyan(), status);
        }
        TrackCommand::CloseTask {
            id,
            close_code,
            status,
        } => {
            db.close_task(&id, &status, close_code.as_deref(), now)?;
            println!("{} Closed task {}", ">".bright_green(), id.bright_cyan());
        }
        TrackCommand::RemoveEpic { id } => {
            db.delete_epic(&id)?;
            println!("{} Removed epic {} and its children", "x".red(), id.bright_cyan());
        }
        TrackCommand::Show { id: Some(id) } => show_epic(db, &id)?,
        TrackCommand::Show { id: None } => {
            let epics = db.list_epics()?;
            if epics.is_empty() {
                println!("{} No tracked epics.", ">".bright_green());
                return Ok(());
            }
            for epic in &epics {
                ui::print_tracked(0, &epic.issue, "");
            }
            let (epics, stories, tasks) = db.counts()?;
            println!(
                "{} Tracking {} epics, {} stories, {} tasks",
                ">".bright_green(),
                epics,
                stories,
                tasks
            );
        }
    }

    Ok(())
}

fn show_epic(db: &Database, id: &str) -> Result<()> {
    let epic = db.get_epic(id)?;
    ui::print_tracked(0, &epic.issue, "");

    for story in db.stories_for_epic(id)? {
        ui::print_tracked(1, &story.issue, "");

        for task in db.tasks_for_story(&story.issue.id)? {
            let extra = match &task.close_code {
                Some(code) => format!(" ({}, {})", task.business_unit, code),
                None => format!(" ({})", task.business_unit),
            };
            ui::print_tracked(2, &task.issue, &extra);
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_payload_without_prompts() {
        let payload = build_payload(CreateArgs {
            project: None,
            summary: Some("Patch kernel".into()),
            issue_type: Some("Task".into()),
            parent: Some("OPS-10".into()),
            description: None,
        })
        .unwrap();

        assert_eq!(payload.fields.project.unwrap().key, "OPS");
        assert_eq!(payload.fields.parent.unwrap().key, "OPS-10");
        assert!(payload.fields.description.is_none());
    }

    #[test]
    fn test_build_payload_rejects_bad_parent() {
        let result = build_payload(CreateArgs {
            parent: Some("ops10".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidIssueKey(_))));
    }

    #[test]
    fn test_read_payloads() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("issues.json");

        std::fs::write(&file, r#"[{"fields": {"summary": "a"}}, {"fields": {"summary": "b"}}]"#)
            .unwrap();
        assert_eq!(read_payloads(&file).unwrap().len(), 2);

        std::fs::write(&file, "[]").unwrap();
        assert!(matches!(read_payloads(&file), Err(Error::InvalidInput(_))));

        std::fs::write(&file, r#"{"fields": {}}"#).unwrap();
        assert!(matches!(read_payloads(&file), Err(Error::Json(_))));
    }

    #[test]
    fn test_track_commands_round_trip() {
        let db = Database::open_in_memory().unwrap();

        run_track(&db, TrackCommand::AddEpic { id: "OPS-1".into(), status: "Open".into() }).unwrap();
        run_track(
            &db,
            TrackCommand::AddStory {
                id: "OPS-2".into(),
                epic: "OPS-1".into(),
                status: "Open".into(),
            },
        )
        .unwrap();
        run_track(
            &db,
            TrackCommand::AddTask {
                id: "OPS-3".into(),
                story: "OPS-2".into(),
                business_unit: "Retail".into(),
                issue_type: "Change".into(),
                status: "Open".into(),
            },
        )
        .unwrap();
        run_track(
            &db,
            TrackCommand::CloseTask {
                id: "OPS-3".into(),
                close_code: Some("Successful".into()),
                status: "Closed".into(),
            },
        )
        .unwrap();
        run_track(&db, TrackCommand::Show { id: Some("OPS-1".into()) }).unwrap();

        assert_eq!(db.get_task("OPS-3").unwrap().close_code.as_deref(), Some("Successful"));

        run_track(&db, TrackCommand::RemoveEpic { id: "OPS-1".into() }).unwrap();
        assert_eq!(db.counts().unwrap(), (0, 0, 0));
    }

    #[test]
    fn test_track_rejects_malformed_key() {
        let db = Database::open_in_memory().unwrap();
        let result = run_track(&db, TrackCommand::AddEpic { id: "epic one".into(), status: "Open".into() });
        assert!(matches!(result, Err(Error::InvalidIssueKey(_))));
    }
}
