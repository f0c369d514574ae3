//! Configuration system for lorekeeper.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::error::{LoreError, LoreResult};
use crate::lorefile::LoreFormat;

/// Main lorekeeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoreConfig {
    /// Where the lorebook persists its state. `None` keeps it in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
    /// Lorefiles imported in the background at startup.
    pub lorefiles: Vec<PathBuf>,
    /// Let entries with equal priority share a conversation.
    pub allow_same_priority: bool,
    /// Most entries rendered into one request; 0 is unlimited.
    pub max_inject_count: usize,
    /// Run cron-based eligibility grants.
    pub enable_scheduler: bool,
    /// Directory for exported lorefiles.
    pub export_dir: PathBuf,
    /// Format for exported lorefiles.
    pub export_format: LoreFormat,
    /// Longest entry name accepted from the command layer.
    pub max_name_chars: usize,
}

impl Default for LoreConfig {
    fn default() -> Self {
        let lore_dir = dirs::home_dir()
            .map(|h| h.join(".lorekeeper"))
            .unwrap_or_else(|| PathBuf::from(".lorekeeper"));

        Self {
            storage_path: None,
            lorefiles: Vec::new(),
            allow_same_priority: false,
            max_inject_count: 0,
            enable_scheduler: true,
            export_dir: lore_dir.join("exports"),
            export_format: LoreFormat::Yaml,
            max_name_chars: 10,
        }
    }
}

impl LoreConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> LoreResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| LoreError::file_access(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| LoreError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| LoreError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| LoreError::Configuration(e.to_string())),
            _ => Err(LoreError::Configuration(format!(
                "Unsupported config file format for {}. Use .toml, .json, or .yaml",
                path.display()
            ))),
        }
    }

    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> Self {
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Overlay values found through `lookup` onto this configuration.
    ///
    /// Unparsable values are logged and ignored.
    pub fn merge_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("LORE_STORAGE_PATH").filter(|p| !p.trim().is_empty()) {
            self.storage_path = Some(PathBuf::from(path));
        }
        if let Some(files) = lookup("LORE_FILES") {
            self.lorefiles = files
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(value) = parse_var(&lookup, "LORE_ALLOW_SAME_PRIORITY", parse_bool) {
            self.allow_same_priority = value;
        }
        if let Some(value) = parse_var(&lookup, "LORE_MAX_INJECT_COUNT", |v| v.parse::<usize>().ok()) {
            self.max_inject_count = value;
        }
        if let Some(value) = parse_var(&lookup, "LORE_DISABLE_SCHEDULER", parse_bool) {
            self.enable_scheduler = !value;
        }
        if let Some(dir) = lookup("LORE_EXPORT_DIR").filter(|d| !d.trim().is_empty()) {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(format) = parse_var(&lookup, "LORE_EXPORT_FORMAT", |v| {
            LoreFormat::from_str(&v.to_ascii_lowercase()).ok()
        }) {
            self.export_format = format;
        }
        self
    }

    /// Builder method to set the storage path.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Builder method to add a startup lorefile.
    pub fn with_lorefile(mut self, path: impl Into<PathBuf>) -> Self {
        self.lorefiles.push(path.into());
        self
    }

    /// Builder method to allow same-priority entries in one session.
    pub fn with_allow_same_priority(mut self, allow: bool) -> Self {
        self.allow_same_priority = allow;
        self
    }

    /// Builder method to cap injected entries per request.
    pub fn with_max_inject_count(mut self, max: usize) -> Self {
        self.max_inject_count = max;
        self
    }

    /// Builder method to toggle the scheduler.
    pub fn with_scheduler(mut self, enabled: bool) -> Self {
        self.enable_scheduler = enabled;
        self
    }

    /// Builder method to set the export directory.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Builder method to set the export format.
    pub fn with_export_format(mut self, format: LoreFormat) -> Self {
        self.export_format = format;
        self
    }

    /// Builder method to set the entry name limit.
    pub fn with_max_name_chars(mut self, max: usize) -> Self {
        self.max_name_chars = max;
        self
    }
}

fn parse_var<F, P, T>(lookup: &F, key: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let raw = lookup(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(key = %key, value = %raw, "Ignoring unparsable environment value");
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
