//! Board configuration loaded from `board.toml`.
//!
//! Layered: file, then environment (`TASKBOARD_API_URL`, `TASKBOARD_API_TOKEN`,
//! including values from a `.env` file), then CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [board]
//! columns = ["assigned", "in_progress", "completed"]
//!
//! [drag]
//! indicator_offset_px = 50.0
//!
//! [remote]
//! base_url = "https://tasks.example.com/api"
//! token = "..."
//! request_timeout_ms = 10000
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::board::drag::{DEFAULT_INDICATOR_OFFSET_PX, DragController};
use crate::board::models::{ColumnSet, DEFAULT_COLUMNS};
use crate::errors::BoardError;

pub const API_URL_ENV: &str = "TASKBOARD_API_URL";
pub const API_TOKEN_ENV: &str = "TASKBOARD_API_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardToml {
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub drag: DragSection,
    #[serde(default)]
    pub remote: RemoteSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSection {
    /// Column ids in display order.
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|(id, _)| id.to_string()).collect()
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            columns: default_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragSection {
    #[serde(default = "default_indicator_offset_px")]
    pub indicator_offset_px: f64,
}

fn default_indicator_offset_px() -> f64 {
    DEFAULT_INDICATOR_OFFSET_PX
}

impl Default for DragSection {
    fn default() -> Self {
        Self {
            indicator_offset_px: default_indicator_offset_px(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl BoardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse board.toml")
    }

    /// Returns the default configuration if `path` doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize board.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// `<config dir>/taskboard/board.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("taskboard").join("board.toml"))
    }

    pub fn column_set(&self) -> Result<ColumnSet, BoardError> {
        ColumnSet::from_ids(self.board.columns.iter().map(|c| c.trim().to_string()))
    }

    pub fn drag_controller(&self) -> DragController {
        DragController::new(self.drag.indicator_offset_px)
    }

    /// Remote base URL, with the environment taking precedence over the file.
    pub fn base_url(&self) -> Option<String> {
        env_or(API_URL_ENV, self.remote.base_url.as_deref())
    }

    /// Bearer token, with the environment taking precedence over the file.
    pub fn token(&self) -> Option<String> {
        env_or(API_TOKEN_ENV, self.remote.token.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.request_timeout_ms)
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.board.columns.is_empty() {
            warnings.push("[board] columns is empty; no card can be shown".to_string());
        }
        let mut seen = HashSet::new();
        for column in &self.board.columns {
            let id = column.trim();
            if id.is_empty() {
                warnings.push("[board] columns contains a blank column id".to_string());
            } else if !seen.insert(id) {
                warnings.push(format!("Column '{}' is listed more than once", id));
            }
        }

        let offset = self.drag.indicator_offset_px;
        if !offset.is_finite() {
            warnings.push(format!(
                "Invalid indicator_offset_px '{}': must be a finite number",
                offset
            ));
        }

        if self.remote.request_timeout_ms == 0 {
            warnings.push("request_timeout_ms must be greater than zero".to_string());
        }
        if let Some(url) = &self.remote.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            warnings.push(format!(
                "Invalid base_url '{}': expected an http(s) URL",
                url
            ));
        }

        warnings
    }
}

fn env_or(var: &str, file_value: Option<&str>) -> Option<String> {
    pick(std::env::var(var).ok(), file_value)
}

/// Non-blank override wins over the file value.
fn pick(override_value: Option<String>, file_value: Option<&str>) -> Option<String> {
    override_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| file_value.map(str::to_string))
}
