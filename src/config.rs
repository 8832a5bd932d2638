//! Configuration management for jira-track
//!
//! Settings live in `~/.config/jira-track/config.yaml`. A missing file means
//! defaults; `JIRA_URL`, `JIRA_USER` and `JIRA_TOKEN` override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::jira::{CLOSE_CODE_FIELD, CLOSE_TRANSITION_ID};

/// The name of the package, used for config directory naming
const PKG_NAME: &str = "jira-track";

const CONFIG_FILE: &str = "config.yaml";
const DATABASE_FILE: &str = "tracking.db";

/// Jira connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct JiraConfig {
    /// Base URL of the Jira instance (e.g., "https://company.atlassian.net")
    pub url: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Workflow transition used to close issues
    pub close_transition_id: String,
    /// Custom field receiving the close code
    pub close_code_field: String,
}

impl JiraConfig {
    /// The configured base URL, treating an empty string as unset
    pub fn base_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            token: None,
            timeout_secs: 30,
            close_transition_id: CLOSE_TRANSITION_ID.to_string(),
            close_code_field: CLOSE_CODE_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub jira: JiraConfig,
    pub database: DatabaseConfig,

    #[serde(skip)]
    dir: PathBuf,
}

impl Config {
    /// Load configuration from `config.yaml` inside `dir`
    ///
    /// Environment overrides are applied on top of whatever the file holds.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut config = Self::load_file(dir)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from disk only, without environment overrides
    pub fn load_file<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join(CONFIG_FILE);

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_yaml::from_str(&contents)?
            }
        } else {
            Config::default()
        };

        config.dir = dir.to_path_buf();
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("JIRA_URL") {
            self.jira.url = Some(url);
        }
        if let Some(user) = lookup("JIRA_USER") {
            self.jira.user = Some(user);
        }
        if let Some(token) = lookup("JIRA_TOKEN") {
            self.jira.token = Some(token);
        }
    }

    /// Path of the tracking database
    ///
    /// Relative paths from the config file are resolved against the config directory.
    pub fn database_path(&self) -> PathBuf {
        match &self.database.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.dir.join(path),
            None => self.dir.join(DATABASE_FILE),
        }
    }
}

/// Get the default configuration directory path
///
/// Returns the path to `~/.config/jira-track/`.
pub fn default_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".config").join(PKG_NAME))
}

/// Ensure the configuration directory exists, creating it if necessary
pub fn ensure_config_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
