//! Per-conversation active-entry cache.
//!
//! Sessions hold independent snapshot copies of registry entries, so one
//! conversation's counters never leak into another or back into the
//! registry. Expired and exhausted copies are swept lazily on read.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::entry::LoreEntry;

/// Active entries keyed by conversation id.
#[derive(Default)]
pub struct SessionCache {
    sessions: RwLock<HashMap<String, Vec<LoreEntry>>>,
    allow_same_priority: bool,
}

impl SessionCache {
    /// Cache that keeps at most one entry per priority per conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// With `allow_same_priority`, entries merge by name only and equal
    /// priorities may coexist.
    pub fn with_same_priority(allow_same_priority: bool) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            allow_same_priority,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<LoreEntry>>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<LoreEntry>>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Attach freshly activated entries to a conversation.
    pub fn activate(&self, conversation_id: &str, entries: Vec<LoreEntry>) {
        self.activate_at(conversation_id, entries, Utc::now());
    }

    /// `activate` with an explicit clock.
    ///
    /// Every candidate is stamped with `now` and its counter reset. Existing
    /// copies are dropped when a candidate has the same name or, unless same
    /// priorities are allowed, the same priority. Among the candidates the
    /// later one wins the same way.
    pub fn activate_at(&self, conversation_id: &str, entries: Vec<LoreEntry>, now: DateTime<Utc>) {
        if entries.is_empty() {
            return;
        }

        let mut incoming: Vec<LoreEntry> = Vec::with_capacity(entries.len());
        for mut entry in entries {
            entry.enter_session(now);
            incoming.retain(|e| !self.collides(e, &entry));
            incoming.push(entry);
        }

        let mut sessions = self.write();
        let current = sessions.entry(conversation_id.to_string()).or_default();
        let before = current.len();
        current.retain(|old| {
            old.is_available_at(now) && !incoming.iter().any(|new| self.collides(old, new))
        });
        let replaced = before - current.len();

        let names: Vec<&str> = incoming.iter().map(|e| e.name()).collect();
        debug!(
            conversation = %conversation_id,
            activated = ?names,
            replaced,
            "Session merge"
        );

        current.extend(incoming);
        current.sort_by_key(|e| e.priority());
    }

    fn collides(&self, a: &LoreEntry, b: &LoreEntry) -> bool {
        a.name() == b.name() || (!self.allow_same_priority && a.priority() == b.priority())
    }

    /// Currently available entries, ascending by priority.
    ///
    /// Unavailable copies are discarded as a side effect; a conversation
    /// left with nothing is forgotten.
    pub fn get_sorted_active(&self, conversation_id: &str) -> Vec<LoreEntry> {
        self.get_sorted_active_at(conversation_id, Utc::now())
    }

    pub fn get_sorted_active_at(&self, conversation_id: &str, now: DateTime<Utc>) -> Vec<LoreEntry> {
        let mut sessions = self.write();
        let Some(current) = sessions.get_mut(conversation_id) else {
            return Vec::new();
        };

        let before = current.len();
        current.retain(|e| e.is_available_at(now));
        if current.len() != before {
            debug!(
                conversation = %conversation_id,
                swept = before - current.len(),
                "Swept unavailable session entries"
            );
        }

        if current.is_empty() {
            sessions.remove(conversation_id);
            return Vec::new();
        }

        current.sort_by_key(|e| e.priority());
        current.clone()
    }

    /// Count one injection for each named session copy.
    ///
    /// Returns how many copies were updated.
    pub fn consume<S: AsRef<str>>(&self, conversation_id: &str, names: &[S]) -> usize {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let mut sessions = self.write();
        let Some(current) = sessions.get_mut(conversation_id) else {
            return 0;
        };

        let mut consumed = 0;
        for entry in current.iter_mut().filter(|e| wanted.contains(e.name())) {
            entry.on_consume();
            consumed += 1;
        }
        consumed
    }

    /// Remove entries by name, returning the names actually removed.
    pub fn remove<S: AsRef<str>>(&self, conversation_id: &str, names: &[S]) -> Vec<String> {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let mut sessions = self.write();
        let Some(current) = sessions.get_mut(conversation_id) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        current.retain(|e| {
            let hit = wanted.contains(e.name());
            if hit {
                removed.push(e.name().to_string());
            }
            !hit
        });

        if current.is_empty() {
            sessions.remove(conversation_id);
        }
        removed
    }

    /// Remove the named entries from every conversation.
    pub fn remove_everywhere<S: AsRef<str>>(&self, names: &[S]) -> usize {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let mut sessions = self.write();
        let mut removed = 0;
        for current in sessions.values_mut() {
            let before = current.len();
            current.retain(|e| !wanted.contains(e.name()));
            removed += before - current.len();
        }
        sessions.retain(|_, current| !current.is_empty());
        removed
    }

    /// Drop every entry of a conversation. Returns how many were dropped.
    pub fn clear(&self, conversation_id: &str) -> usize {
        self.write()
            .remove(conversation_id)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Whether any state is held for the conversation.
    pub fn contains(&self, conversation_id: &str) -> bool {
        self.read().contains_key(conversation_id)
    }

    /// Number of conversations with stored state.
    pub fn conversation_count(&self) -> usize {
        self.read().len()
    }
}
