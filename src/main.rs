use std::process;

use clap::Parser;
use colored::Colorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use jira_track::app;
use jira_track::cli::Args;
use jira_track::error::{self, Error};

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(err) = app::run(args) {
        if let Error::Http(http) = &err {
            warn!(error = %http, "jira request failed");
        }
        if let Some(message) = error::user_message(&err) {
            println!("{} {}", "x".red(), message);
        }
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
