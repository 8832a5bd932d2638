use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::jira::DEFAULT_MAX_RESULTS;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration directory (defaults to ~/.config/jira-track)
    #[clap(short, long, value_parser, env = "JIRA_TRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[clap(short, long, value_parser, default_value_t = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Talk to the Jira REST API
    #[clap(subcommand)]
    Issue(IssueCommand),

    /// Manage locally tracked epics, stories and tasks
    #[clap(subcommand)]
    Track(TrackCommand),
}

#[derive(Subcommand, Debug)]
pub enum IssueCommand {
    /// Fetch a single issue and print it as JSON
    Get { key: String },

    /// Create an issue, prompting for anything not given
    Create(CreateArgs),

    /// Create issues from a JSON file holding an array of payloads
    BulkCreate { file: PathBuf },

    /// Close an issue through the close transition
    Close {
        key: String,
        #[clap(long)]
        close_code: Option<String>,
    },

    /// Search issues with JQL
    Search(SearchArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct CreateArgs {
    #[clap(short, long)]
    pub project: Option<String>,
    #[clap(short, long)]
    pub summary: Option<String>,
    #[clap(short = 't', long)]
    pub issue_type: Option<String>,
    #[clap(long)]
    pub parent: Option<String>,
    #[clap(short, long)]
    pub description: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    /// Raw JQL; when omitted the query is built from the filters below
    pub jql: Option<String>,

    #[clap(short, long)]
    pub project: Option<String>,
    /// Issue type filter, repeatable
    #[clap(short = 't', long = "type")]
    pub issue_types: Vec<String>,
    /// Status filter, repeatable
    #[clap(short, long = "status")]
    pub statuses: Vec<String>,

    #[clap(short, long, default_value = "key,status,issuetype,summary")]
    pub fields: String,
    #[clap(long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: u32,
    #[clap(long, default_value_t = 0)]
    pub start_at: u32,

    /// Print the raw JSON response instead of a table
    #[clap(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum TrackCommand {
    /// Track a new epic
    AddEpic {
        id: String,
        #[clap(long, default_value = "Open")]
        status: String,
    },

    /// Track a new story under an epic
    AddStory {
        id: String,
        #[clap(long)]
        epic: String,
        #[clap(long, default_value = "Open")]
        status: String,
    },

    /// Track a new task under a story
    AddTask {
        id: String,
        #[clap(long)]
        story: String,
        #[clap(long)]
        business_unit: String,
        #[clap(long, default_value = "Task")]
        issue_type: String,
        #[clap(long, default_value = "Open")]
        status: String,
    },

    /// Set the status of a tracked epic, story or task
    Status { id: String, status: String },

    /// Mark a tracked task closed
    CloseTask {
        id: String,
        #[clap(long)]
        close_code: Option<String>,
        #[clap(long, default_value = "Closed")]
        status: String,
    },

    /// Stop tracking an epic, its stories and their tasks
    RemoveEpic { id: String },

    /// Show an epic with its stories and tasks, or list all epics
    Show { id: Option<String> },
}
