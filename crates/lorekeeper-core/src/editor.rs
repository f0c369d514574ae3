//! Operations exposed to a command front end.
//!
//! Each operation takes structured arguments and returns a typed outcome;
//! parsing command text and presenting replies is the caller's business.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::LoreConfig;
use crate::entry::LoreEntry;
use crate::error::{ErrorCode, LoreError, LoreResult};
use crate::lorebook::Lorebook;
use crate::lorefile::{ImportStats, LoreFormat};
use crate::record::EntryDraft;
use crate::session::SessionCache;

/// Which entries `view_entries` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryFilter {
    All,
    Enabled,
    Disabled,
    Named(String),
}

/// Per-name result of a batch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub done: Vec<String>,
    pub not_found: Vec<String>,
}

/// Result of clearing a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Everything was dropped; carries how many entries were active.
    All(usize),
    /// Only these names were found and removed.
    Named(Vec<String>),
}

/// Command-layer facade over the lorebook and session cache.
pub struct LoreEditor {
    lorebook: Arc<Lorebook>,
    sessions: Arc<SessionCache>,
    max_name_chars: usize,
    export_dir: PathBuf,
    export_format: LoreFormat,
}

impl LoreEditor {
    pub fn new(lorebook: Arc<Lorebook>, sessions: Arc<SessionCache>, config: &LoreConfig) -> Self {
        Self {
            lorebook,
            sessions,
            max_name_chars: config.max_name_chars,
            export_dir: config.export_dir.clone(),
            export_format: config.export_format,
        }
    }

    // ---------------------------------------------------------------
    // Registry commands
    // ---------------------------------------------------------------

    /// Entries matching the filter, ascending by priority.
    pub fn view_entries(&self, filter: &EntryFilter) -> Vec<LoreEntry> {
        match filter {
            EntryFilter::All => self.lorebook.list_entries(),
            EntryFilter::Enabled => self.lorebook.list_enabled(),
            EntryFilter::Disabled => self.lorebook.list_disabled(),
            EntryFilter::Named(name) => self.lorebook.get_entry(name).into_iter().collect(),
        }
    }

    /// Entry summaries separated by blank lines.
    pub fn render_entries(entries: &[LoreEntry]) -> String {
        entries
            .iter()
            .map(LoreEntry::display)
            .collect::<Vec<_>>()
            .join("\n\n\n")
    }

    /// Create an entry from a name, content and optional extra fields.
    ///
    /// Keywords default to the name itself.
    pub fn add_entry(&self, name: &str, content: &str, extra: EntryDraft) -> LoreResult<LoreEntry> {
        let name = name.trim();
        let chars = name.chars().count();
        if chars > self.max_name_chars {
            return Err(LoreError::validation_with(
                ErrorCode::ValNameTooLong,
                format!("entry name '{}' is {} characters long", name, chars),
                format!("Use at most {} characters", self.max_name_chars),
            ));
        }
        if content.trim().is_empty() {
            return Err(LoreError::missing_field("content"));
        }

        let draft = EntryDraft {
            name: Some(name.to_string()),
            content: Some(content.trim().to_string()),
            keywords: extra.keywords.clone().or_else(|| Some(vec![name.to_string()])),
            ..extra
        };
        self.lorebook.add_entry(draft)
    }

    /// Delete entries and drop their copies from every conversation.
    pub fn delete_entries<S: AsRef<str>>(&self, names: &[S]) -> BatchOutcome {
        let (done, not_found) = self.lorebook.remove_entries(names);
        if !done.is_empty() {
            self.sessions.remove_everywhere(&done);
        }
        BatchOutcome { done, not_found }
    }

    pub fn set_keywords(&self, name: &str, keywords: Vec<String>) -> bool {
        self.lorebook.update_keywords(name, keywords)
    }

    pub fn set_priority(&self, name: &str, priority: i32) -> bool {
        self.lorebook.update_priority(name, priority)
    }

    // ---------------------------------------------------------------
    // Conversation commands
    // ---------------------------------------------------------------

    /// Admit a conversation to the named entries' scope.
    pub fn enable_for_conversation<S: AsRef<str>>(
        &self,
        conversation_id: &str,
        names: &[S],
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for name in names {
            let name = name.as_ref();
            if self.lorebook.add_scope_to_entry(name, conversation_id) {
                outcome.done.push(name.to_string());
            } else {
                outcome.not_found.push(name.to_string());
            }
        }
        outcome
    }

    /// Withdraw a conversation from the named entries' scope.
    ///
    /// Copies already active in that conversation are removed too, so a
    /// disabled entry stops injecting immediately.
    pub fn disable_for_conversation<S: AsRef<str>>(
        &self,
        conversation_id: &str,
        names: &[S],
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for name in names {
            let name = name.as_ref();
            if self.lorebook.remove_scope_from_entry(name, conversation_id) {
                outcome.done.push(name.to_string());
            } else {
                outcome.not_found.push(name.to_string());
            }
        }
        self.sessions.remove(conversation_id, &outcome.done);
        outcome
    }

    /// Numbered status lines for a conversation's active entries.
    pub fn session_state(&self, conversation_id: &str) -> Vec<String> {
        self.sessions
            .get_sorted_active(conversation_id)
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}", i + 1, e.display_remaining()))
            .collect()
    }

    /// Clear the named entries from a conversation, or all of them when
    /// `names` is empty.
    pub fn clear_session<S: AsRef<str>>(&self, conversation_id: &str, names: &[S]) -> ClearOutcome {
        if names.is_empty() {
            let count = self.sessions.clear(conversation_id);
            info!(conversation = %conversation_id, count, "Session cleared");
            ClearOutcome::All(count)
        } else {
            ClearOutcome::Named(self.sessions.remove(conversation_id, names))
        }
    }

    // ---------------------------------------------------------------
    // Files
    // ---------------------------------------------------------------

    pub fn import_file(&self, path: &Path, override_existing: bool) -> LoreResult<ImportStats> {
        self.lorebook.import_file(path, override_existing)
    }

    /// Export entries (all when `names` is empty) to a fresh file under the
    /// export directory, named `<file_name>.<format>`.
    pub fn export_file(&self, file_name: &str, names: &[String]) -> LoreResult<PathBuf> {
        let file_name = file_name.trim();
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(LoreError::validation(format!(
                "invalid export file name '{}'",
                file_name
            )));
        }

        let path = self
            .export_dir
            .join(Uuid::new_v4().simple().to_string())
            .join(format!("{}.{}", file_name, self.export_format.extension()));
        self.lorebook.export_file(&path, names)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_in(dir: &Path) -> LoreEditor {
        let config = LoreConfig::default().with_export_dir(dir);
        LoreEditor::new(
            Arc::new(Lorebook::in_memory()),
            Arc::new(SessionCache::new()),
            &config,
        )
    }

    fn editor() -> LoreEditor {
        editor_in(Path::new("/nonexistent"))
    }

    fn activate(editor: &LoreEditor, conversation: &str, names: &[&str]) {
        let entries = names
            .iter()
            .filter_map(|n| editor.lorebook.get_entry(n))
            .collect();
        editor.sessions.activate(conversation, entries);
    }

    #[test]
    fn test_add_entry_defaults_keywords_to_name() {
        let editor = editor();
        let entry = editor.add_entry("moon", "  The moon is full.  ", EntryDraft::default()).unwrap();
        assert_eq!(entry.keywords(), ["moon".to_string()]);
        assert_eq!(entry.content(), "The moon is full.");

        let entry = editor
            .add_entry("sun", "x", EntryDraft::default().keywords(["day", "noon"]))
            .unwrap();
        assert_eq!(entry.keywords().len(), 2);
    }

    #[test]
    fn test_add_entry_enforces_name_length() {
        let editor = editor();
        let err = editor
            .add_entry("abcdefghijk", "x", EntryDraft::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValNameTooLong);

        // Characters, not bytes.
        assert!(editor.add_entry("月光月光月光月光月光", "x", EntryDraft::default()).is_ok());
    }

    #[test]
    fn test_add_entry_requires_content() {
        let err = editor().add_entry("a", "   ", EntryDraft::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValMissingField);
    }

    #[test]
    fn test_view_entries_filters() {
        let editor = editor();
        editor.add_entry("a", "x", EntryDraft::default()).unwrap();
        editor
            .add_entry("b", "x", EntryDraft::default().enabled(false))
            .unwrap();

        assert_eq!(editor.view_entries(&EntryFilter::All).len(), 2);
        assert_eq!(editor.view_entries(&EntryFilter::Enabled)[0].name(), "a");
        assert_eq!(editor.view_entries(&EntryFilter::Disabled)[0].name(), "b");
        assert!(editor.view_entries(&EntryFilter::Named("c".into())).is_empty());

        let text = LoreEditor::render_entries(&editor.view_entries(&EntryFilter::All));
        assert!(text.contains("### [a]"));
        assert!(text.contains("### [b]"));
    }

    #[test]
    fn test_delete_entries_purges_sessions() {
        let editor = editor();
        editor.add_entry("a", "x", EntryDraft::default()).unwrap();
        activate(&editor, "c1", &["a"]);

        let outcome = editor.delete_entries(&["a", "ghost"]);
        assert_eq!(outcome.done, vec!["a"]);
        assert_eq!(outcome.not_found, vec!["ghost"]);
        assert!(!editor.sessions.contains("c1"));
    }

    #[test]
    fn test_enable_and_disable_for_conversation() {
        let editor = editor();
        editor
            .add_entry("a", "x", EntryDraft::default().scope(["admin"]))
            .unwrap();

        let outcome = editor.enable_for_conversation("c1", &["a", "ghost"]);
        assert_eq!(outcome.done, vec!["a"]);
        assert_eq!(outcome.not_found, vec!["ghost"]);
        assert_eq!(
            editor.lorebook.get_entry("a").unwrap().scope(),
            ["admin".to_string(), "c1".to_string()]
        );

        activate(&editor, "c1", &["a"]);
        let outcome = editor.disable_for_conversation("c1", &["a"]);
        assert_eq!(outcome.done, vec!["a"]);
        assert!(!editor.sessions.contains("c1"));
        assert_eq!(editor.lorebook.get_entry("a").unwrap().scope(), ["admin".to_string()]);
    }

    #[test]
    fn test_session_state_and_clear() {
        let editor = editor();
        editor.add_entry("a", "x", EntryDraft::default().priority(1)).unwrap();
        editor.add_entry("b", "x", EntryDraft::default().priority(2)).unwrap();
        activate(&editor, "c1", &["a", "b"]);

        let lines = editor.session_state("c1");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1. a "));

        let empty: [&str; 0] = [];
        assert_eq!(
            editor.clear_session("c1", &["b", "ghost"]),
            ClearOutcome::Named(vec!["b".to_string()])
        );
        assert_eq!(editor.clear_session("c1", &empty), ClearOutcome::All(1));
        assert!(editor.session_state("c1").is_empty());
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let editor = editor_in(dir.path());
        editor.add_entry("a", "x", EntryDraft::default()).unwrap();
        editor.add_entry("b", "y", EntryDraft::default()).unwrap();

        let path = editor.export_file("book", &[]).unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("yaml"));

        let other = editor_in(dir.path());
        let stats = other.import_file(&path, false).unwrap();
        assert_eq!(stats.loaded, 2);
        assert_eq!(
            other.lorebook.get_entry("b").unwrap().to_record(),
            editor.lorebook.get_entry("b").unwrap().to_record()
        );
    }

    #[test]
    fn test_export_rejects_bad_names() {
        let editor = editor();
        assert!(editor.export_file("../escape", &[]).is_err());
        assert!(editor.export_file("  ", &[]).is_err());
    }
}
