//! Lore entries and their activation gate.
//!
//! An entry is static configuration (name, scope, keywords, ...) plus a
//! small amount of runtime state:
//! - `activated_at` / `inject_count`: only meaningful on session copies
//! - the schedule flag: a one-shot eligibility token set by the scheduler
//!
//! `can_activate` is the only place activation is decided. Its gates run in
//! a fixed order and short-circuit: enabled, scope, keyword-or-schedule,
//! probability. Probability is last so failed entries never draw randomness.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use crate::record::LoreRecord;
use crate::template::Template;

/// Scope token that admits callers flagged as administrators.
pub const ADMIN_SCOPE: &str = "admin";

// Largest second count chrono accepts for a `Duration`.
const MAX_DURATION_SECS: i64 = i64::MAX / 1000;

/// Identity of the caller, as seen by the scope gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeQuery<'a> {
    pub user_id: Option<&'a str>,
    pub group_id: Option<&'a str>,
    pub session_id: Option<&'a str>,
    pub is_admin: bool,
}

/// Lock-free schedule eligibility flag.
///
/// Written by scheduler jobs and read by the message path, so it lives
/// outside any larger critical section.
#[derive(Debug, Default)]
struct ScheduleFlag(AtomicBool);

impl ScheduleFlag {
    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Clone for ScheduleFlag {
    fn clone(&self) -> Self {
        Self(AtomicBool::new(self.get()))
    }
}

/// A lore entry: configuration, compiled patterns and runtime counters.
#[derive(Debug, Clone)]
pub struct LoreEntry {
    template: Template,
    name: String,
    enabled: bool,
    priority: i32,
    scope: Vec<String>,
    keywords: Vec<String>,
    probability: f64,
    schedule: String,
    content: String,
    duration: u64,
    times: u32,

    patterns: Vec<Regex>,
    activated_at: Option<DateTime<Utc>>,
    inject_count: u32,
    schedule_flag: ScheduleFlag,
}

impl LoreEntry {
    /// Build an entry from a fully resolved record.
    pub fn new(record: LoreRecord) -> Self {
        let mut entry = Self {
            template: record.template,
            name: record.name,
            enabled: record.enabled,
            priority: record.priority,
            scope: record.scope,
            keywords: Vec::new(),
            probability: record.probability,
            schedule: record.schedule.trim().to_string(),
            content: record.content,
            duration: record.duration,
            times: record.times,
            patterns: Vec::new(),
            activated_at: None,
            inject_count: 0,
            schedule_flag: ScheduleFlag::default(),
        };
        entry.set_keywords(record.keywords);
        entry
    }

    /// Lossless persisted form (runtime state excluded).
    pub fn to_record(&self) -> LoreRecord {
        LoreRecord {
            template: self.template,
            name: self.name.clone(),
            enabled: self.enabled,
            priority: self.priority,
            scope: self.scope.clone(),
            keywords: self.keywords.clone(),
            probability: self.probability,
            schedule: self.schedule.clone(),
            content: self.content.clone(),
            duration: self.duration,
            times: self.times,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> Template {
        self.template
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Raw cron expression, `None` when unscheduled.
    pub fn schedule(&self) -> Option<&str> {
        if self.schedule.is_empty() {
            None
        } else {
            Some(&self.schedule)
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn times(&self) -> u32 {
        self.times
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    pub fn inject_count(&self) -> u32 {
        self.inject_count
    }

    pub fn is_activated(&self) -> bool {
        self.activated_at.is_some()
    }

    /// Whether a fired schedule is waiting to be consumed by an activation.
    pub fn is_schedule_triggered(&self) -> bool {
        self.schedule_flag.get()
    }

    // ---------------------------------------------------------------
    // Gates
    // ---------------------------------------------------------------

    /// True when any compiled keyword pattern matches the text.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// Scope gate. Empty scope admits everyone.
    pub fn allow_scope(&self, query: &ScopeQuery<'_>) -> bool {
        if self.scope.is_empty() {
            return true;
        }

        self.scope.iter().any(|token| {
            (token == ADMIN_SCOPE && query.is_admin)
                || query.user_id == Some(token.as_str())
                || query.group_id == Some(token.as_str())
                || query.session_id == Some(token.as_str())
        })
    }

    /// Probability gate. Draws exactly one sample unless p is 0 or 1.
    pub fn allow_probability<R: Rng>(&self, rng: &mut R) -> bool {
        let p = self.probability;
        if p >= 1.0 {
            return true;
        }
        if p <= 0.0 {
            return false;
        }
        rng.gen::<f64>() < p
    }

    /// Decide whether this entry activates for a message.
    pub fn can_activate(&self, text: &str, query: &ScopeQuery<'_>) -> bool {
        self.can_activate_with_rng(text, query, &mut rand::thread_rng())
    }

    /// `can_activate` with a caller-provided RNG, for reproducible runs.
    pub fn can_activate_with_rng<R: Rng>(
        &self,
        text: &str,
        query: &ScopeQuery<'_>,
        rng: &mut R,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.allow_scope(query) {
            return false;
        }
        if !(self.is_match(text) || self.is_schedule_triggered()) {
            return false;
        }
        self.allow_probability(rng)
    }

    // ---------------------------------------------------------------
    // Lifecycle hooks
    // ---------------------------------------------------------------

    /// Consume the schedule eligibility token after a successful activation.
    pub fn on_activated(&self) {
        self.schedule_flag.clear();
    }

    /// Grant schedule eligibility for the next evaluation. Idempotent.
    pub fn on_schedule_triggered(&self) {
        self.schedule_flag.set();
    }

    /// Record one injection into an outgoing request.
    pub fn on_consume(&mut self) {
        self.inject_count = self.inject_count.saturating_add(1);
    }

    /// Stamp a fresh session copy.
    pub(crate) fn enter_session(&mut self, now: DateTime<Utc>) {
        self.activated_at = Some(now);
        self.inject_count = 0;
        self.schedule_flag.clear();
    }

    // ---------------------------------------------------------------
    // Expiry and availability
    // ---------------------------------------------------------------

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Duration elapsed since activation. Never true when unactivated or
    /// when duration is 0.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|end| now >= end)
    }

    /// End of the current activation, `None` when unactivated or indefinite.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.duration == 0 {
            return None;
        }
        let secs = i64::try_from(self.duration)
            .unwrap_or(i64::MAX)
            .min(MAX_DURATION_SECS);
        self.activated_at?.checked_add_signed(Duration::seconds(secs))
    }

    pub fn remaining(&self) -> u64 {
        self.remaining_at(Utc::now())
    }

    /// Seconds left; 0 for indefinite entries, full duration if unactivated.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        if self.duration == 0 {
            return 0;
        }
        match self.expires_at() {
            Some(end) => (end - now).num_seconds().max(0) as u64,
            None => self.duration,
        }
    }

    /// True when the injection budget is used up.
    pub fn is_exhausted(&self) -> bool {
        self.times > 0 && self.inject_count >= self.times
    }

    pub fn is_available(&self) -> bool {
        self.is_available_at(Utc::now())
    }

    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_exhausted()
    }

    // ---------------------------------------------------------------
    // Mutators
    // ---------------------------------------------------------------

    /// Replace keyword patterns. Blank patterns are dropped; an empty list
    /// falls back to matching the entry name. Invalid regexes are skipped.
    pub fn set_keywords(&mut self, keywords: Vec<String>) {
        let mut keywords: Vec<String> = keywords
            .into_iter()
            .filter(|k| !k.trim().is_empty())
            .collect();
        if keywords.is_empty() {
            keywords.push(self.name.clone());
        }

        self.patterns = keywords
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(entry = %self.name, pattern = %pattern, error = %e, "Skipping invalid keyword pattern");
                    None
                }
            })
            .collect();

        if self.patterns.is_empty() {
            // Every pattern failed to compile; match the name literally.
            if let Ok(re) = Regex::new(&regex::escape(&self.name)) {
                self.patterns.push(re);
            }
        }

        self.keywords = keywords;
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Add a scope token. Returns whether the scope changed.
    pub fn add_scope(&mut self, token: &str) -> bool {
        if self.scope.iter().any(|s| s == token) {
            return false;
        }
        self.scope.push(token.to_string());
        true
    }

    /// Remove a scope token. Returns whether the scope changed.
    ///
    /// Removing the last token reinstates `admin`; an entry never becomes
    /// unrestricted through removal.
    pub fn remove_scope(&mut self, token: &str) -> bool {
        let before = self.scope.len();
        self.scope.retain(|s| s != token);
        if self.scope.len() == before {
            return false;
        }
        if self.scope.is_empty() {
            self.scope.push(ADMIN_SCOPE.to_string());
        }
        true
    }

    // ---------------------------------------------------------------
    // Presentation
    // ---------------------------------------------------------------

    /// Human-readable summary of the entry configuration.
    pub fn display(&self) -> String {
        let status = if self.enabled { "enabled" } else { "disabled" };

        let mut triggers = self.keywords.join(" | ");
        if let Some(schedule) = self.schedule() {
            triggers.push_str(&format!(" ; schedule `{}`", schedule));
        }

        let scope = if self.scope.is_empty() {
            "all conversations".to_string()
        } else if self.scope.len() == 1 && self.scope[0] == ADMIN_SCOPE {
            "admins only".to_string()
        } else {
            self.scope
                .iter()
                .map(|s| if s == ADMIN_SCOPE { "admins" } else { s.as_str() })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let duration = if self.duration == 0 {
            "permanent".to_string()
        } else {
            format!("{} s", self.duration)
        };
        let times = if self.times == 0 {
            "unlimited".to_string()
        } else {
            format!("{} times", self.times)
        };

        [
            format!("### [{}]", self.name),
            format!("- Status: {}", status),
            format!("- Priority: {}", self.priority),
            format!("- Triggers: {}", triggers),
            format!("- Scope: {}", scope),
            format!("- Duration: {}", duration),
            format!("- Injections: {}", times),
            format!("- Probability: {:.0}%", self.probability * 100.0),
            String::new(),
            "```".to_string(),
            self.content.clone(),
            "```".to_string(),
        ]
        .join("\n")
    }

    /// One-line status of a session copy: remaining time and usage.
    pub fn display_remaining(&self) -> String {
        self.display_remaining_at(Utc::now())
    }

    pub fn display_remaining_at(&self, now: DateTime<Utc>) -> String {
        let time = if self.duration == 0 {
            "permanent".to_string()
        } else {
            format!("{}s left", self.remaining_at(now))
        };
        let usage = if self.times == 0 {
            format!("used {}", self.inject_count)
        } else {
            format!("used {}/{}", self.inject_count, self.times)
        };
        format!("{} (priority {}, {}, {})", self.name, self.priority, time, usage)
    }
}
