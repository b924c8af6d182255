use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use dcm_util::errors::DcmError;

use crate::store::DEFAULT_FILE_NAME;

/// Global user configuration loaded from `~/.dcm/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Image source settings from `[images]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Directory of pre-rendered images used instead of a registry.
    #[serde(default)]
    pub mirror: Option<PathBuf>,
    #[serde(default = "default_render_command", rename = "render-command")]
    pub render_command: Vec<String>,
    #[serde(default = "default_inspect_command", rename = "inspect-command")]
    pub inspect_command: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            mirror: None,
            render_command: default_render_command(),
            inspect_command: default_inspect_command(),
        }
    }
}

fn default_render_command() -> Vec<String> {
    ["opm", "render", "{image}", "-o", "json"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_inspect_command() -> Vec<String> {
    ["skopeo", "inspect", "docker://{image}"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Catalog layout settings from `[catalog]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_file_name", rename = "file-name")]
    pub file_name: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
        }
    }
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

impl GlobalConfig {
    /// Load the global configuration from `~/.dcm/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> Result<Self, DcmError> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, DcmError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| DcmError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| DcmError::Config {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the dcm data directory (`~/.dcm/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".dcm")
}
