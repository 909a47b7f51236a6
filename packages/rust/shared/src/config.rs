//! Application configuration for leadkit.
//!
//! User config lives at `~/.leadkit/leadkit.toml`.
//! Environment overrides apply on top of the file, which overrides defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LeadkitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadkit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadkit";

/// Environment variable that overrides `[genderize] base_url`.
pub const GENDERIZE_BASE_URL_ENV: &str = "GENDERIZE_API_BASE_URL";

// ---------------------------------------------------------------------------
// Config structs (matching leadkit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Lead database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gender inference service settings.
    #[serde(default)]
    pub genderize: GenderizeConfig,

    /// Email-verification workflow engine settings.
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the libSQL database file. `~` expands to the home directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.leadkit/leads.db".into()
}

/// `[genderize]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenderizeConfig {
    /// Base URL of the genderize-compatible API.
    #[serde(default = "default_genderize_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_genderize_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenderizeConfig {
    fn default() -> Self {
        Self {
            base_url: default_genderize_url(),
            timeout_secs: default_genderize_timeout(),
        }
    }
}

fn default_genderize_url() -> String {
    "https://api.genderize.io".into()
}
fn default_genderize_timeout() -> u64 {
    10
}

/// `[verification]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Base URL of the workflow engine's HTTP API.
    #[serde(default = "default_verification_url")]
    pub base_url: String,

    /// Workflow namespace.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Task queue the verification worker listens on.
    #[serde(default = "default_task_queue")]
    pub task_queue: String,

    /// Registered workflow type name.
    #[serde(default = "default_workflow_type")]
    pub workflow_type: String,

    /// Per-workflow timeout in seconds.
    #[serde(default = "default_verification_timeout")]
    pub timeout_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            base_url: default_verification_url(),
            namespace: default_namespace(),
            task_queue: default_task_queue(),
            workflow_type: default_workflow_type(),
            timeout_secs: default_verification_timeout(),
        }
    }
}

fn default_verification_url() -> String {
    "http://localhost:7233".into()
}
fn default_namespace() -> String {
    "default".into()
}
fn default_task_queue() -> String {
    "myQueue".into()
}
fn default_workflow_type() -> String {
    "verifyEmailWorkflow".into()
}
fn default_verification_timeout() -> u64 {
    60
}

impl AppConfig {
    /// Apply environment overrides in place.
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(GENDERIZE_BASE_URL_ENV).ok());
    }

    /// Apply override values read from the environment. A missing or blank
    /// value leaves the configured setting in place.
    pub fn apply_overrides(&mut self, genderize_base_url: Option<String>) {
        if let Some(url) = genderize_base_url {
            let url = url.trim();
            if !url.is_empty() {
                tracing::debug!(%url, "genderize base URL overridden from environment");
                self.genderize.base_url = url.to_string();
            }
        }
    }

    /// Resolve the database path, expanding a leading `~/`.
    pub fn database_path(&self) -> Result<PathBuf> {
        expand_home(&self.storage.database_path)
    }
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| LeadkitError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadkit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadkitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadkit/leadkit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk with environment overrides applied.
/// Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    let mut config = if path.exists() {
        load_config_from(&path)?
    } else {
        tracing::debug!(?path, "config file not found, using defaults");
        AppConfig::default()
    };
    config.apply_env();
    Ok(config)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadkitError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeadkitError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadkitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadkitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadkitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
