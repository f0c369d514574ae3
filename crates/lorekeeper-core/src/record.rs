//! Persisted entry shapes.
//!
//! - `LoreRecord`: the fully resolved, lossless on-disk form of an entry
//! - `EntryDraft`: loose input for creating an entry; every field optional

use serde::{Deserialize, Serialize};

use crate::template::Template;

/// One persisted lore entry. Runtime state is never part of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreRecord {
    /// Template the entry was created from.
    #[serde(default)]
    pub template: Template,
    /// Unique name within the lorebook.
    pub name: String,
    /// Master switch.
    pub enabled: bool,
    /// Lower sorts first and wins same-priority collisions.
    pub priority: i32,
    /// Authorization tokens; empty means unrestricted.
    #[serde(default)]
    pub scope: Vec<String>,
    /// Regular expressions matched against message text.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Activation probability in [0, 1].
    pub probability: f64,
    /// Five-field cron expression; empty when unscheduled.
    #[serde(default, alias = "cron")]
    pub schedule: String,
    /// Text injected into the request.
    pub content: String,
    /// Seconds an activation lasts; 0 = indefinite.
    #[serde(default)]
    pub duration: u64,
    /// Max injections per activation; 0 = unlimited.
    #[serde(default)]
    pub times: u32,
}

/// Partial entry data as it arrives from commands or lorefiles.
///
/// Missing fields are resolved once, at creation time, from the template
/// defaults and the lorebook's priority allocator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(alias = "cron", skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times: Option<u32>,
}

impl EntryDraft {
    /// Create a draft with the two required fields.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Builder method to set the template.
    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template.to_string());
        self
    }

    /// Builder method to set the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Builder method to set the scope.
    pub fn scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = Some(scope.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set the keyword patterns.
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set the probability.
    pub fn probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    /// Builder method to set the cron schedule.
    pub fn schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    /// Builder method to set the activation duration in seconds.
    pub fn duration(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Builder method to set the injection limit.
    pub fn times(mut self, times: u32) -> Self {
        self.times = Some(times);
        self
    }

    /// Builder method to set the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

impl From<LoreRecord> for EntryDraft {
    fn from(record: LoreRecord) -> Self {
        Self {
            template: Some(record.template.to_string()),
            name: Some(record.name),
            enabled: Some(record.enabled),
            priority: Some(record.priority),
            scope: Some(record.scope),
            keywords: Some(record.keywords),
            probability: Some(record.probability),
            schedule: Some(record.schedule),
            content: Some(record.content),
            duration: Some(record.duration),
            times: Some(record.times),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_accepts_cron_alias() {
        let draft: EntryDraft =
            serde_json::from_str(r#"{"name":"dawn","content":"x","cron":"0 6 * * *"}"#).unwrap();
        assert_eq!(draft.schedule.as_deref(), Some("0 6 * * *"));
        assert!(draft.priority.is_none());
    }

    #[test]
    fn test_draft_rejects_wrong_priority_type() {
        let result = serde_json::from_str::<EntryDraft>(
            r#"{"name":"a","content":"x","priority":"high"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_record_defaults_optional_fields() {
        let record: LoreRecord = serde_json::from_str(
            r#"{"name":"a","enabled":true,"priority":3,"probability":0.5,"content":"x"}"#,
        )
        .unwrap();
        assert_eq!(record.template, Template::Default);
        assert!(record.scope.is_empty());
        assert!(record.schedule.is_empty());
        assert_eq!(record.duration, 0);
    }
}
