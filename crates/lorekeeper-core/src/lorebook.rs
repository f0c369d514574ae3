//! The lorebook: owner of every configured entry.
//!
//! Entries live in one `RwLock<Vec<LoreEntry>>` kept stably sorted by
//! priority. Every mutation happens under the write lock and persists the
//! full state before the lock is released, so a background import can
//! interleave with command-layer edits without losing either.

use rand::Rng;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

use crate::entry::{LoreEntry, ScopeQuery};
use crate::error::{ErrorCode, LoreError, LoreResult};
use crate::events::{EventBus, EventSubscriber, LorebookEvent, UpdateKind};
use crate::lorefile::{ImportStats, LoreFile};
use crate::record::{EntryDraft, LoreRecord};
use crate::store::{EntryStore, MemoryEntryStore};
use crate::template::Template;

/// Registry of lore entries.
pub struct Lorebook {
    entries: RwLock<Vec<LoreEntry>>,
    store: Arc<dyn EntryStore>,
    events: EventBus,
}

impl Lorebook {
    /// Open a lorebook over `store`, loading whatever it holds.
    ///
    /// Duplicate stored names are renamed `<name>_2`, `<name>_3`, ...
    pub fn new(store: Arc<dyn EntryStore>) -> LoreResult<Self> {
        let records = store.load_all()?;
        let mut taken: HashSet<String> = HashSet::new();
        let mut entries = Vec::with_capacity(records.len());

        for mut record in records {
            if taken.contains(&record.name) {
                let renamed = unique_name(&record.name, |n| taken.contains(n));
                warn!(name = %record.name, renamed = %renamed, "Renaming duplicate stored entry");
                record.name = renamed;
            }
            taken.insert(record.name.clone());
            entries.push(LoreEntry::new(record));
        }
        entries.sort_by_key(|e| e.priority());

        info!(count = entries.len(), "Lorebook loaded");
        Ok(Self {
            entries: RwLock::new(entries),
            store,
            events: EventBus::new(),
        })
    }

    /// A lorebook with no durable storage.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            store: Arc::new(MemoryEntryStore::new()),
            events: EventBus::new(),
        }
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> EventSubscriber {
        self.events.subscribe()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<LoreEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<LoreEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, entries: &[LoreEntry]) -> LoreResult<()> {
        let records: Vec<LoreRecord> = entries.iter().map(LoreEntry::to_record).collect();
        self.store.save_all(&records)
    }

    /// Persist after a mutation whose caller only learns found/not-found.
    fn persist_or_warn(&self, entries: &[LoreEntry]) {
        if let Err(e) = self.persist(entries) {
            warn!(error = %e, "Failed to persist lorebook");
        }
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn get_entry(&self, name: &str) -> Option<LoreEntry> {
        self.read().iter().find(|e| e.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|e| e.name() == name)
    }

    /// All entries, ascending by priority.
    pub fn list_entries(&self) -> Vec<LoreEntry> {
        self.read().clone()
    }

    pub fn list_enabled(&self) -> Vec<LoreEntry> {
        self.read().iter().filter(|e| e.enabled()).cloned().collect()
    }

    pub fn list_disabled(&self) -> Vec<LoreEntry> {
        self.read().iter().filter(|e| !e.enabled()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Persisted form of the named entries, in priority order.
    ///
    /// An empty `names` selects every entry; unknown names are ignored.
    pub fn records(&self, names: &[String]) -> Vec<LoreRecord> {
        self.read()
            .iter()
            .filter(|e| names.is_empty() || names.iter().any(|n| n == e.name()))
            .map(LoreEntry::to_record)
            .collect()
    }

    // ---------------------------------------------------------------
    // Activation
    // ---------------------------------------------------------------

    /// Run every entry's gate against a message.
    ///
    /// Winners have their schedule token consumed and are returned as
    /// snapshots ready to enter a session.
    pub fn activate_matching<R: Rng>(
        &self,
        text: &str,
        query: &ScopeQuery<'_>,
        rng: &mut R,
    ) -> Vec<LoreEntry> {
        let entries = self.read();
        let mut activated = Vec::new();
        for entry in entries.iter() {
            if entry.can_activate_with_rng(text, query, rng) {
                entry.on_activated();
                activated.push(entry.clone());
            }
        }
        activated
    }

    /// Grant schedule eligibility to the named entry.
    ///
    /// Returns false when no such entry exists.
    pub fn trigger_schedule(&self, name: &str) -> bool {
        match self.read().iter().find(|e| e.name() == name) {
            Some(entry) => {
                entry.on_schedule_triggered();
                debug!(entry = %name, "Schedule eligibility granted");
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Create an entry. A taken name gets a numeric suffix.
    pub fn add_entry(&self, draft: EntryDraft) -> LoreResult<LoreEntry> {
        let mut entries = self.write();
        let mut record = resolve_draft(draft, &entries)?;

        if entries.iter().any(|e| e.name() == record.name) {
            let renamed = unique_name(&record.name, |n| entries.iter().any(|e| e.name() == n));
            warn!(name = %record.name, renamed = %renamed, "Entry name taken, renaming");
            record.name = renamed;
        }

        let entry = LoreEntry::new(record);
        let mut updated = entries.clone();
        updated.push(entry.clone());
        updated.sort_by_key(|e| e.priority());
        self.persist(&updated)?;
        *entries = updated;
        drop(entries);

        info!(entry = %entry.name(), priority = entry.priority(), "Entry added");
        self.events.emit(LorebookEvent::added(entry.name()));
        Ok(entry)
    }

    /// Delete entries by name, reporting which existed and which did not.
    pub fn remove_entries<S: AsRef<str>>(&self, names: &[S]) -> (Vec<String>, Vec<String>) {
        let mut entries = self.write();
        let mut removed = Vec::new();
        let mut not_found = Vec::new();

        for name in names {
            let name = name.as_ref();
            match entries.iter().position(|e| e.name() == name) {
                Some(index) => {
                    entries.remove(index);
                    removed.push(name.to_string());
                }
                None if removed.iter().chain(&not_found).any(|n| n == name) => {}
                None => not_found.push(name.to_string()),
            }
        }

        if !removed.is_empty() {
            self.persist_or_warn(&entries);
            drop(entries);
            info!(removed = ?removed, "Entries removed");
            self.events.emit(LorebookEvent::removed(removed.clone()));
        }
        (removed, not_found)
    }

    fn update<F>(&self, name: &str, kind: UpdateKind, apply: F) -> bool
    where
        F: FnOnce(&mut LoreEntry),
    {
        let mut entries = self.write();
        let Some(entry) = entries.iter_mut().find(|e| e.name() == name) else {
            return false;
        };
        apply(entry);
        if kind == UpdateKind::Priority {
            entries.sort_by_key(|e| e.priority());
        }
        self.persist_or_warn(&entries);
        drop(entries);

        info!(entry = %name, kind = %kind, "Entry updated");
        self.events.emit(LorebookEvent::updated(name, kind));
        true
    }

    pub fn update_keywords(&self, name: &str, keywords: Vec<String>) -> bool {
        self.update(name, UpdateKind::Keywords, |e| e.set_keywords(keywords))
    }

    pub fn update_priority(&self, name: &str, priority: i32) -> bool {
        self.update(name, UpdateKind::Priority, |e| e.set_priority(priority))
    }

    pub fn add_scope_to_entry(&self, name: &str, token: &str) -> bool {
        self.update(name, UpdateKind::Scope, |e| {
            e.add_scope(token);
        })
    }

    pub fn remove_scope_from_entry(&self, name: &str, token: &str) -> bool {
        self.update(name, UpdateKind::Scope, |e| {
            e.remove_scope(token);
        })
    }

    // ---------------------------------------------------------------
    // Import / export
    // ---------------------------------------------------------------

    /// Import raw records.
    ///
    /// Records without a name or content are skipped, as are names already
    /// present unless `override_existing` is set, in which case the stored
    /// entry is replaced. A record that fails validation is counted and
    /// reported; it never aborts the batch.
    pub fn import_records(
        &self,
        items: Vec<Value>,
        override_existing: bool,
    ) -> LoreResult<ImportStats> {
        let mut stats = ImportStats::new();
        let mut current = self.write();
        let mut entries = current.clone();

        for item in items {
            stats.total += 1;

            let name = item
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string);
            let has_content = item
                .get("content")
                .and_then(Value::as_str)
                .is_some_and(|c| !c.trim().is_empty());

            let Some(name) = name.filter(|_| has_content) else {
                stats.skipped += 1;
                stats.skipped_names.push(
                    item.get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                );
                continue;
            };

            let existing = entries.iter().position(|e| e.name() == name);
            if existing.is_some() && !override_existing {
                stats.skipped += 1;
                stats.skipped_names.push(name);
                continue;
            }

            let record = serde_json::from_value::<EntryDraft>(item)
                .map_err(|e| LoreError::validation(e.to_string()))
                .and_then(|draft| {
                    // The entry being replaced must not block its own priority.
                    let others: Vec<LoreEntry> = entries
                        .iter()
                        .filter(|e| e.name() != name)
                        .cloned()
                        .collect();
                    resolve_draft(draft, &others)
                });

            match record {
                Ok(record) => {
                    let entry = LoreEntry::new(record);
                    match existing {
                        Some(index) => {
                            entries[index] = entry;
                            stats.replaced += 1;
                        }
                        None => {
                            entries.push(entry);
                            stats.loaded += 1;
                        }
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    stats.failures.push((name, e.to_string()));
                }
            }
        }

        if stats.loaded + stats.replaced > 0 {
            entries.sort_by_key(|e| e.priority());
            self.persist(&entries)?;
            *current = entries;
        }
        drop(current);

        info!(
            total = stats.total,
            loaded = stats.loaded,
            replaced = stats.replaced,
            skipped = stats.skipped,
            failed = stats.failed,
            "Lore records imported"
        );
        if !stats.skipped_names.is_empty() {
            debug!(skipped = ?stats.skipped_names, "Skipped lore records");
        }
        for (name, reason) in &stats.failures {
            debug!(entry = %name, reason = %reason, "Failed lore record");
        }

        self.events
            .emit(LorebookEvent::imported(stats.loaded, stats.replaced));
        Ok(stats)
    }

    /// Import every record of a lorefile.
    pub fn import_file(&self, path: &Path, override_existing: bool) -> LoreResult<ImportStats> {
        let items = LoreFile::load(path).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "Lorefile import failed");
        })?;
        info!(path = %path.display(), count = items.len(), "Importing lorefile");
        self.import_records(items, override_existing)
    }

    /// Write the named entries (all when empty) to a lorefile.
    ///
    /// Returns how many records were written.
    pub fn export_file(&self, path: &Path, names: &[String]) -> LoreResult<usize> {
        let records = self.records(names);
        LoreFile::save(path, &records).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "Lorefile export failed");
        })?;
        info!(path = %path.display(), count = records.len(), "Lorefile exported");
        Ok(records.len())
    }
}

/// First `<base>_N` (N >= 2) for which `taken` is false.
fn unique_name<F: Fn(&str) -> bool>(base: &str, taken: F) -> String {
    (2u32..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Resolve a draft into a complete record.
///
/// Every field is explicit > template default > fallback. Priority falls
/// back to the template base, or the first free value above it.
fn resolve_draft(draft: EntryDraft, existing: &[LoreEntry]) -> LoreResult<LoreRecord> {
    let name = draft
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| LoreError::missing_field("name"))?;
    let content = draft
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| LoreError::missing_field("content"))?;

    let template = match draft.template.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Template::parse(raw)?,
        _ => Template::Default,
    };
    let defaults = template.defaults();

    let probability = draft.probability.unwrap_or(1.0);
    if !(0.0..=1.0).contains(&probability) {
        return Err(LoreError::validation_with(
            ErrorCode::ValOutOfRange,
            format!("probability {} for '{}' is outside [0, 1]", probability, name),
            "Use a probability between 0.0 and 1.0",
        ));
    }

    let priority = match draft.priority {
        Some(p) => p,
        None => {
            let used: HashSet<i32> = existing.iter().map(LoreEntry::priority).collect();
            (defaults.priority..=i32::MAX)
                .find(|p| !used.contains(p))
                .unwrap_or(defaults.priority)
        }
    };

    Ok(LoreRecord {
        template,
        name,
        enabled: draft.enabled.unwrap_or(true),
        priority,
        scope: draft.scope.unwrap_or_default(),
        keywords: draft.keywords.unwrap_or(defaults.keywords),
        probability,
        schedule: draft.schedule.unwrap_or(defaults.schedule),
        content,
        duration: draft.duration.unwrap_or(defaults.duration),
        times: draft.times.unwrap_or(defaults.times),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteEntryStore;
    use serde_json::json;

    fn book() -> Lorebook {
        Lorebook::in_memory()
    }

    #[test]
    fn test_add_entry_resolves_template_defaults() {
        let book = book();
        let entry = book
            .add_entry(EntryDraft::new("dawn", "The sun rises.").template(Template::Schedule))
            .unwrap();

        assert_eq!(entry.priority(), 90);
        assert_eq!(entry.schedule(), Some("0 0 * * *"));
        assert_eq!(entry.duration(), 86_400);
        assert_eq!(entry.times(), 1);
        assert_eq!(entry.probability(), 1.0);
        assert!(entry.scope().is_empty());
        assert!(entry.enabled());
    }

    #[test]
    fn test_add_entry_requires_name_and_content() {
        let book = book();
        let err = book.add_entry(EntryDraft::new("  ", "x")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValMissingField);

        let err = book.add_entry(EntryDraft::new("a", "")).unwrap_err();
        assert!(err.to_string().contains("content"));
        assert!(book.is_empty());
    }

    #[test]
    fn test_add_entry_renames_duplicates() {
        let book = book();
        book.add_entry(EntryDraft::new("a", "x")).unwrap();
        let second = book.add_entry(EntryDraft::new("a", "y")).unwrap();
        let third = book.add_entry(EntryDraft::new("a", "z")).unwrap();

        assert_eq!(second.name(), "a_2");
        assert_eq!(third.name(), "a_3");
    }

    #[test]
    fn test_priority_allocation_skips_taken_values() {
        let book = book();
        let a = book.add_entry(EntryDraft::new("a", "x")).unwrap();
        let b = book.add_entry(EntryDraft::new("b", "x")).unwrap();
        let c = book.add_entry(EntryDraft::new("c", "x").priority(50)).unwrap();

        assert_eq!(a.priority(), 50);
        assert_eq!(b.priority(), 51);
        // Explicit priorities may collide.
        assert_eq!(c.priority(), 50);
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let book = book();
        let err = book
            .add_entry(EntryDraft::new("a", "x").probability(1.5))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValOutOfRange);

        let err = book
            .add_entry(EntryDraft::new("a", "x").probability(f64::NAN))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValOutOfRange);
    }

    #[test]
    fn test_unknown_template_rejected() {
        let book = book();
        let draft = EntryDraft {
            template: Some("legendary".to_string()),
            ..EntryDraft::new("a", "x")
        };
        let err = book.add_entry(draft).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValInvalidTemplate);
    }

    #[test]
    fn test_entries_sorted_by_priority() {
        let book = book();
        book.add_entry(EntryDraft::new("late", "x").priority(30)).unwrap();
        book.add_entry(EntryDraft::new("early", "x").priority(10)).unwrap();
        book.add_entry(EntryDraft::new("mid", "x").priority(20)).unwrap();

        let names: Vec<String> = book
            .list_entries()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["early", "mid", "late"]);

        assert!(book.update_priority("late", 1));
        assert_eq!(book.list_entries()[0].name(), "late");
    }

    #[test]
    fn test_remove_entries_reports_partial_success() {
        let book = book();
        book.add_entry(EntryDraft::new("a", "x")).unwrap();
        book.add_entry(EntryDraft::new("b", "x")).unwrap();

        let (removed, not_found) = book.remove_entries(&["a", "ghost"]);
        assert_eq!(removed, vec!["a"]);
        assert_eq!(not_found, vec!["ghost"]);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_targeted_updates_report_not_found() {
        let book = book();
        book.add_entry(EntryDraft::new("a", "x")).unwrap();

        assert!(!book.update_keywords("ghost", vec!["x".into()]));
        assert!(!book.update_priority("ghost", 1));
        assert!(!book.add_scope_to_entry("ghost", "g1"));
        assert!(!book.remove_scope_from_entry("ghost", "g1"));

        assert!(book.add_scope_to_entry("a", "g1"));
        assert_eq!(book.get_entry("a").unwrap().scope(), ["g1".to_string()]);
        assert!(book.remove_scope_from_entry("a", "g1"));
        assert_eq!(book.get_entry("a").unwrap().scope(), ["admin".to_string()]);
    }

    #[test]
    fn test_enabled_and_disabled_lists() {
        let book = book();
        book.add_entry(EntryDraft::new("on", "x")).unwrap();
        book.add_entry(EntryDraft::new("off", "x").enabled(false)).unwrap();

        assert_eq!(book.list_enabled().len(), 1);
        assert_eq!(book.list_disabled()[0].name(), "off");
    }

    #[test]
    fn test_import_skips_duplicates_and_bad_records() {
        let book = book();
        book.add_entry(EntryDraft::new("a", "old")).unwrap();

        let stats = book
            .import_records(
                vec![
                    json!({"name": "a", "content": "new"}),
                    json!({"name": "b", "content": "x", "priority": "high"}),
                    json!({"content": "nameless"}),
                    json!({"name": "c", "content": "x", "probability": 2.0}),
                    json!({"name": "d", "content": "x", "cron": "*/5 * * * *"}),
                ],
                false,
            )
            .unwrap();

        assert_eq!(stats.total, 5);
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.skipped_names, vec!["a", "unknown"]);
        assert!(!stats.is_success());

        assert_eq!(book.get_entry("a").unwrap().content(), "old");
        assert_eq!(book.get_entry("d").unwrap().schedule(), Some("*/5 * * * *"));
    }

    #[test]
    fn test_import_override_replaces() {
        let book = book();
        book.add_entry(EntryDraft::new("a", "old").priority(5)).unwrap();

        let stats = book
            .import_records(vec![json!({"name": "a", "content": "new"})], true)
            .unwrap();
        assert_eq!(stats.replaced, 1);
        assert_eq!(book.len(), 1);

        let entry = book.get_entry("a").unwrap();
        assert_eq!(entry.content(), "new");
        assert_eq!(entry.priority(), 50);
    }

    #[test]
    fn test_trigger_schedule() {
        let book = book();
        book.add_entry(EntryDraft::new("dawn", "x").keywords(["never-said"]))
            .unwrap();

        assert!(!book.trigger_schedule("ghost"));
        assert!(book.trigger_schedule("dawn"));

        let query = ScopeQuery::default();
        let mut rng = rand::thread_rng();
        let first = book.activate_matching("hello", &query, &mut rng);
        assert_eq!(first.len(), 1);

        // The token was consumed by the activation.
        let second = book.activate_matching("hello", &query, &mut rng);
        assert!(second.is_empty());
    }

    #[test]
    fn test_state_survives_reopen() {
        let store: Arc<dyn EntryStore> = Arc::new(SqliteEntryStore::in_memory().unwrap());
        {
            let book = Lorebook::new(store.clone()).unwrap();
            book.add_entry(EntryDraft::new("a", "x").scope(["g1"])).unwrap();
            book.update_keywords("a", vec!["hel+o".into()]);
        }

        let book = Lorebook::new(store).unwrap();
        let entry = book.get_entry("a").unwrap();
        assert_eq!(entry.keywords(), ["hel+o".to_string()]);
        assert_eq!(entry.scope(), ["g1".to_string()]);
    }

    #[test]
    fn test_load_renames_duplicate_stored_names() {
        let record = LoreRecord {
            template: Template::Default,
            name: "a".to_string(),
            enabled: true,
            priority: 1,
            scope: Vec::new(),
            keywords: Vec::new(),
            probability: 1.0,
            schedule: String::new(),
            content: "x".to_string(),
            duration: 0,
            times: 0,
        };
        let store = Arc::new(MemoryEntryStore::with_records(vec![
            record.clone(),
            record,
        ]));

        let book = Lorebook::new(store).unwrap();
        assert!(book.contains("a"));
        assert!(book.contains("a_2"));
        // The renamed entry falls back to matching its new name.
        assert_eq!(book.get_entry("a_2").unwrap().keywords(), ["a_2".to_string()]);
    }

    #[tokio::test]
    async fn test_mutations_emit_events() {
        let book = book();
        let mut sub = book.subscribe();

        book.add_entry(EntryDraft::new("a", "x")).unwrap();
        book.update_keywords("a", vec!["y".into()]);
        book.remove_entries(&["a"]);

        assert_eq!(sub.recv().await.unwrap().event_type(), "entry.added");
        assert_eq!(sub.recv().await.unwrap().event_type(), "entry.updated");
        assert_eq!(sub.recv().await.unwrap().event_type(), "entry.removed");
    }

    /// Store that accepts reads but refuses every write.
    struct ReadOnlyStore;

    impl EntryStore for ReadOnlyStore {
        fn load_all(&self) -> LoreResult<Vec<LoreRecord>> {
            Ok(Vec::new())
        }

        fn save_all(&self, _records: &[LoreRecord]) -> LoreResult<()> {
            Err(LoreError::database("store is read-only"))
        }
    }

    #[test]
    fn test_failed_persist_leaves_registry_unchanged() {
        let book = Lorebook::new(Arc::new(ReadOnlyStore)).unwrap();
        let mut sub = book.subscribe();

        assert!(book.add_entry(EntryDraft::new("a", "x").keywords(["go"])).is_err());
        assert!(!book.contains("a"));
        assert!(book.is_empty());
        assert!(book
            .activate_matching("go", &ScopeQuery::default(), &mut rand::thread_rng())
            .is_empty());

        let items = vec![json!({"name": "b", "content": "y"})];
        assert!(book.import_records(items, false).is_err());
        assert!(!book.contains("b"));

        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_remove_entries_repeated_names() {
        let book = book();
        book.add_entry(EntryDraft::new("a", "x")).unwrap();

        let (removed, not_found) = book.remove_entries(&["a", "a", "ghost", "ghost"]);
        assert_eq!(removed, vec!["a"]);
        assert_eq!(not_found, vec!["ghost"]);
    }
}
