use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::DB_FILE;
use crate::error::{ReconError, Result};

/// Overrides `data_dir` from the settings file when set and non-empty.
pub const DATA_DIR_ENV: &str = "BANKRECON_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    /// Stamped on transactions added from the CLI that carry no user name.
    #[serde(default)]
    pub user_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            user_name: String::new(),
        }
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn settings_path() -> PathBuf {
    home().join(".config").join("bankrecon").join("settings.json")
}

fn default_data_dir_string() -> String {
    home()
        .join("Documents")
        .join("bankrecon")
        .to_string_lossy()
        .into_owned()
}

/// Parse settings text. A file that does not decode is reported and
/// replaced by defaults so a bad edit never blocks the CLI.
fn parse_settings(path: &Path, content: &str) -> Settings {
    match serde_json::from_str(content) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_settings(&path, &content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read settings file");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = settings_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ReconError::Settings(e.to_string()))?;
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(())
}

/// The environment override wins over the settings file; both get `~` expanded.
pub fn resolve_data_dir(env: Option<String>, settings: &Settings) -> PathBuf {
    let dir = env
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| settings.data_dir.clone());
    PathBuf::from(expand_home(&dir))
}

pub fn get_data_dir() -> PathBuf {
    resolve_data_dir(std::env::var(DATA_DIR_ENV).ok(), &load_settings())
}

pub fn get_db_path() -> PathBuf {
    get_data_dir().join(DB_FILE)
}

/// Expand a leading `~` or `~/`. Other paths are returned untouched.
pub fn expand_home(path: &str) -> String {
    match path.strip_prefix('~') {
        Some("") => home().to_string_lossy().into_owned(),
        Some(rest) if rest.starts_with('/') => format!("{}{rest}", home().to_string_lossy()),
        _ => path.to_string(),
    }
}
