//! Lorefile adapter: JSON / YAML files <-> raw entry records.
//!
//! A lorefile is either a bare list of entry objects or a mapping with an
//! `entries` list. Items that are not objects are skipped with a warning;
//! deciding whether an object is a valid entry is left to the lorebook so
//! that one bad record never aborts a whole file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::{ErrorCode, LoreError, LoreResult};
use crate::record::LoreRecord;

/// Supported lorefile encodings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoreFormat {
    Json,
    #[default]
    Yaml,
}

impl LoreFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> LoreResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(LoreError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

#[derive(Serialize)]
struct LoreFilePayload<'a> {
    entries: &'a [LoreRecord],
}

/// Reader/writer for lorefiles.
pub struct LoreFile;

impl LoreFile {
    /// Read the raw entry objects from a lorefile.
    pub fn load(path: &Path) -> LoreResult<Vec<Value>> {
        let format = LoreFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| LoreError::file_access(path, e))?;

        Self::parse(&content, format).map_err(|e| match e {
            LoreError::Parse { message, code } => LoreError::Parse {
                message: format!("{}: {}", path.display(), message),
                code,
            },
            other => other,
        })
    }

    /// Parse lorefile text into raw entry objects.
    pub fn parse(content: &str, format: LoreFormat) -> LoreResult<Vec<Value>> {
        let data: Value = match format {
            LoreFormat::Json => serde_json::from_str(content).map_err(|e| LoreError::Parse {
                message: e.to_string(),
                code: ErrorCode::ParseInvalidJson,
            })?,
            LoreFormat::Yaml => serde_yaml::from_str(content).map_err(|e| LoreError::Parse {
                message: e.to_string(),
                code: ErrorCode::ParseInvalidYaml,
            })?,
        };

        let items = match data {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("entries") {
                Some(Value::Array(items)) => items,
                _ => return Err(Self::shape_error()),
            },
            _ => return Err(Self::shape_error()),
        };

        Ok(items
            .into_iter()
            .filter(|item| {
                let keep = item.is_object();
                if !keep {
                    warn!(item = %item, "Skipping non-object lorefile item");
                }
                keep
            })
            .collect())
    }

    /// Write records to a lorefile, creating parent directories as needed.
    pub fn save(path: &Path, records: &[LoreRecord]) -> LoreResult<()> {
        let format = LoreFormat::from_path(path)?;
        let text = Self::render(records, format)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LoreError::file_access(parent, e))?;
        }
        std::fs::write(path, text).map_err(|e| LoreError::file_access(path, e))
    }

    /// Serialize records as `{ entries: [...] }`.
    pub fn render(records: &[LoreRecord], format: LoreFormat) -> LoreResult<String> {
        let payload = LoreFilePayload { entries: records };
        Ok(match format {
            LoreFormat::Json => serde_json::to_string_pretty(&payload)?,
            LoreFormat::Yaml => serde_yaml::to_string(&payload)?,
        })
    }

    fn shape_error() -> LoreError {
        LoreError::Parse {
            message: "expected a list of entries or a mapping with an 'entries' list"
                .to_string(),
            code: ErrorCode::FileInvalidShape,
        }
    }
}

/// Outcome of importing one lorefile.
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    /// Objects found in the file.
    pub total: usize,
    /// Entries added to the lorebook.
    pub loaded: usize,
    /// Entries replaced because override was requested.
    pub replaced: usize,
    /// Duplicates or records missing name/content.
    pub skipped: usize,
    /// Records that failed validation.
    pub failed: usize,
    /// Names of skipped records ("unknown" when nameless).
    pub skipped_names: Vec<String>,
    /// `(name, reason)` for each failed record.
    pub failures: Vec<(String, String)>,
}

impl ImportStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if every record was either loaded or deliberately skipped.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
