use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which part of an entry a targeted update touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Keywords,
    Priority,
    Scope,
}

/// A mutation of the lorebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LorebookEvent {
    /// An entry was created through the command layer.
    Added {
        name: String,
        timestamp: DateTime<Utc>,
    },
    /// Entries were deleted.
    Removed {
        names: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    /// A single field of an entry changed.
    Updated {
        name: String,
        kind: UpdateKind,
        timestamp: DateTime<Utc>,
    },
    /// A batch of records was imported.
    Imported {
        loaded: usize,
        replaced: usize,
        timestamp: DateTime<Utc>,
    },
}

impl LorebookEvent {
    pub fn added(name: impl Into<String>) -> Self {
        Self::Added {
            name: name.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn removed(names: Vec<String>) -> Self {
        Self::Removed {
            names,
            timestamp: Utc::now(),
        }
    }

    pub fn updated(name: impl Into<String>, kind: UpdateKind) -> Self {
        Self::Updated {
            name: name.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn imported(loaded: usize, replaced: usize) -> Self {
        Self::Imported {
            loaded,
            replaced,
            timestamp: Utc::now(),
        }
    }

    /// Event type as a dotted string, for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Added { .. } => "entry.added",
            Self::Removed { .. } => "entry.removed",
            Self::Updated { .. } => "entry.updated",
            Self::Imported { .. } => "entry.imported",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Added { timestamp, .. }
            | Self::Removed { timestamp, .. }
            | Self::Updated { timestamp, .. }
            | Self::Imported { timestamp, .. } => *timestamp,
        }
    }

    /// Whether scheduled jobs may need to be re-registered.
    ///
    /// Keyword, priority and scope edits never touch an entry's schedule.
    pub fn affects_schedule(&self) -> bool {
        match self {
            Self::Added { .. } | Self::Removed { .. } => true,
            Self::Imported { loaded, replaced, .. } => loaded + replaced > 0,
            Self::Updated { .. } => false,
        }
    }
}
