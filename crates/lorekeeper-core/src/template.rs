//! Preset default-value bundles for new entries.
//!
//! A template only decides the defaults used when a field is not given
//! explicitly. Resolution order for every field is:
//! explicit value > template default > hard fallback.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{ErrorCode, LoreError, LoreResult};

/// Named preset of entry defaults.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Baseline values every other template starts from.
    #[default]
    Default,
    /// Same as default; kept as a distinct label for user-authored entries.
    Common,
    /// Always-on background lore: matches everything, never expires.
    Resident,
    /// One-shot random flavor text.
    Chance,
    /// Daily scheduled lore.
    Schedule,
    /// Per-user standing lore.
    User,
    /// Per-group standing lore.
    Group,
}

/// Field defaults supplied by a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDefaults {
    pub priority: i32,
    pub keywords: Vec<String>,
    pub schedule: String,
    pub duration: u64,
    pub times: u32,
}

impl Template {
    /// All template names as static strings.
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|t| t.into()).collect()
    }

    /// Parse a template name, reporting the valid choices on failure.
    pub fn parse(raw: &str) -> LoreResult<Self> {
        Self::from_str(raw.trim()).map_err(|_| {
            LoreError::validation_with(
                ErrorCode::ValInvalidTemplate,
                format!("unknown template '{}'", raw),
                format!("Use one of: {}", Self::all_names().join(", ")),
            )
        })
    }

    /// Defaults for this template.
    pub fn defaults(&self) -> TemplateDefaults {
        let everything = || vec![".*".to_string()];
        let mut d = TemplateDefaults {
            priority: 50,
            keywords: Vec::new(),
            schedule: String::new(),
            duration: 180,
            times: 5,
        };

        match self {
            Template::Default | Template::Common => {}
            Template::Resident => {
                d.priority = 10;
                d.keywords = everything();
                d.duration = 0;
                d.times = 0;
            }
            Template::Chance => {
                d.priority = 30;
                d.keywords = everything();
                d.times = 1;
            }
            Template::Schedule => {
                d.priority = 90;
                d.keywords = everything();
                d.schedule = "0 0 * * *".to_string();
                d.duration = 86_400;
                d.times = 1;
            }
            Template::Group => {
                d.priority = 110;
                d.keywords = everything();
                d.duration = 0;
                d.times = 0;
            }
            Template::User => {
                d.priority = 120;
                d.keywords = everything();
                d.duration = 0;
                d.times = 0;
            }
        }
        d
    }
}
