//! Project management
//!
//! Handles project initialization and provides access to the database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::Config;
use crate::backend::{Client, SqliteBackend};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a desk project. Run 'desk init' first.")]
    NotInProject,

    #[error("Database not found at {0}. Run 'desk init' to create it.")]
    MissingDatabase(PathBuf),
}

const DEFAULT_CONFIG: &str = r#"# Contract desk configuration

# Database file inside .desk/
database = "desk.db"

# Maximum rows per list (0 = unlimited)
page_size = 200

# Seconds to wait for a list to load
fetch_timeout_secs = 30

[watch]
debounce_ms = 250

[log]
# error, warn, info, debug, trace (-v flags and RUST_LOG override this)
level = "warn"
# compact, pretty, json
format = "compact"
"#;

const GITIGNORE: &str = r#"# Local database and SQLite side files
*.db
*.db-wal
*.db-shm
"#;

/// A contract desk project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let desk_dir = root.join(".desk");

        if !desk_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let desk_dir = root.join(".desk");

        fs::create_dir_all(&desk_dir).with_context(|| {
            format!("Failed to create .desk directory: {}", desk_dir.display())
        })?;

        let config_path = desk_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = desk_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let project = Self::open(root)?;

        // Opening creates the schema
        SqliteBackend::open(&project.database_path()).with_context(|| {
            format!(
                "Failed to create database: {}",
                project.database_path().display()
            )
        })?;
        tracing::info!(root = %project.root.display(), "initialized project");

        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .desk directory path
    pub fn desk_dir(&self) -> PathBuf {
        self.root.join(".desk")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.desk_dir().join(&self.config.project.database)
    }

    /// Opens a client over the project database
    pub fn client(&self) -> Result<Client> {
        let path = self.database_path();
        if !path.is_file() {
            return Err(ProjectError::MissingDatabase(path).into());
        }

        let backend = SqliteBackend::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "opened database");

        Ok(Client::new(backend))
    }
}
