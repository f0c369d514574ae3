//! `{placeholder}` substitution in entry content.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Everything a placeholder may read while one entry is rendered.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub user_id: Option<&'a str>,
    pub user_name: Option<&'a str>,
    pub group_id: Option<&'a str>,
    pub conversation_id: &'a str,
    pub message: &'a str,
    pub entry_name: &'a str,
    pub now: DateTime<Local>,
}

/// Expands placeholders in entry content.
pub trait Renderer: Send + Sync {
    fn render(&self, content: &str, ctx: &RenderContext<'_>) -> String;
}

type Provider = fn(&RenderContext<'_>) -> Option<String>;

/// Renderer backed by a fixed table of named providers.
///
/// Unknown placeholders stay verbatim; a known provider with nothing to
/// report renders as an empty string.
pub struct WildcardRenderer {
    providers: HashMap<&'static str, Provider>,
}

impl WildcardRenderer {
    pub fn new() -> Self {
        let mut providers: HashMap<&'static str, Provider> = HashMap::new();
        providers.insert("user_id", |c| c.user_id.map(str::to_string));
        providers.insert("user_name", |c| c.user_name.map(str::to_string));
        providers.insert("user", |c| format_user(c.user_name, c.user_id));
        providers.insert("group_id", |c| c.group_id.map(str::to_string));
        providers.insert("session", |c| Some(c.conversation_id.to_string()));
        providers.insert("msg", |c| Some(c.message.to_string()));
        providers.insert("time", |c| Some(c.now.format("%H:%M:%S").to_string()));
        providers.insert("date", |c| Some(c.now.format("%Y-%m-%d").to_string()));
        providers.insert("entry_name", |c| Some(c.entry_name.to_string()));
        Self { providers }
    }

    /// Names of every supported placeholder, sorted.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.providers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for WildcardRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for WildcardRenderer {
    fn render(&self, content: &str, ctx: &RenderContext<'_>) -> String {
        PLACEHOLDER
            .replace_all(content, |caps: &Captures<'_>| {
                match self.providers.get(&caps[1]) {
                    Some(provider) => provider(ctx).unwrap_or_default(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// `name(id)` when both are known, otherwise whichever one is.
fn format_user(name: Option<&str>, id: Option<&str>) -> Option<String> {
    match (name.filter(|n| !n.is_empty()), id.filter(|i| !i.is_empty())) {
        (Some(name), Some(id)) => Some(format!("{}({})", name, id)),
        (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
        (None, None) => None,
    }
}
