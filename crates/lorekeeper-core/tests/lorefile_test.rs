//! Lorefile export and import across lorebooks and stores.

use std::path::Path;
use std::sync::Arc;

use lorekeeper_core::{
    open_store, EntryDraft, ErrorCode, LoreError, LoreFile, LoreFormat, Lorebook, Template,
};
use tokio_test::{assert_err, assert_ok};

fn seeded() -> Lorebook {
    let lorebook = Lorebook::in_memory();
    lorebook
        .add_entry(
            EntryDraft::new("harbor", "Gulls circle the {session} docks.")
                .keywords(["harbou?r", "docks"])
                .scope(["admin", "group-7"])
                .probability(0.25)
                .duration(600)
                .times(3),
        )
        .unwrap();
    lorebook
        .add_entry(EntryDraft::new("nightly", "The bells toll.").template(Template::Schedule))
        .unwrap();
    lorebook
}

fn round_trip(file: &Path) {
    let source = seeded();
    assert_eq!(assert_ok!(source.export_file(file, &[])), 2);

    let target = Lorebook::in_memory();
    let stats = assert_ok!(target.import_file(file, false));
    assert_eq!(stats.total, 2);
    assert_eq!(stats.loaded, 2);
    assert!(stats.is_success());

    for name in ["harbor", "nightly"] {
        let before = source.get_entry(name).unwrap().to_record();
        let after = target.get_entry(name).unwrap().to_record();
        assert_eq!(before, after);
    }
}

#[test]
fn test_yaml_round_trip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    round_trip(&dir.path().join("book.yaml"));
}

#[test]
fn test_json_round_trip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    round_trip(&dir.path().join("nested/book.json"));
}

#[test]
fn test_partial_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.yaml");
    let source = seeded();
    assert_eq!(
        assert_ok!(source.export_file(&path, &["nightly".to_string()])),
        1
    );

    let items = assert_ok!(LoreFile::load(&path));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "nightly");
    assert_eq!(items[0]["template"], "schedule");
}

#[test]
fn test_reimport_skips_then_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.json");
    let lorebook = seeded();
    assert_ok!(lorebook.export_file(&path, &[]));

    let stats = assert_ok!(lorebook.import_file(&path, false));
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.loaded, 0);

    lorebook.update_priority("harbor", 77);
    let stats = assert_ok!(lorebook.import_file(&path, true));
    assert_eq!(stats.replaced, 2);
    assert_eq!(lorebook.len(), 2);
    assert_ne!(lorebook.get_entry("harbor").unwrap().priority(), 77);
}

#[test]
fn test_mixed_lorefile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.yaml");
    std::fs::write(
        &path,
        r#"
- name: good
  content: fine
- name: nameless-content
- content: no name here
- name: bad-odds
  content: x
  probability: 1.5
- 42
"#,
    )
    .unwrap();

    let lorebook = Lorebook::in_memory();
    let stats = assert_ok!(lorebook.import_file(&path, false));
    assert_eq!(stats.loaded, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.failures[0].0, "bad-odds");
    assert!(!stats.is_success());
    assert!(lorebook.contains("good"));
}

#[test]
fn test_unsupported_and_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let lorebook = Lorebook::in_memory();

    let err = assert_err!(lorebook.import_file(&dir.path().join("book.txt"), false));
    assert!(matches!(err, LoreError::UnsupportedFormat { .. }));

    let err = assert_err!(lorebook.import_file(&dir.path().join("absent.yaml"), false));
    assert_eq!(err.code(), ErrorCode::FileAccessFailed);

    assert!(LoreFormat::from_path(Path::new("x.yml")).is_ok());
}

#[test]
fn test_stores_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    for file in ["state.db", "state.json", "state.yaml"] {
        let path = dir.path().join(file);
        {
            let lorebook = Lorebook::new(assert_ok!(open_store(Some(&path)))).unwrap();
            lorebook
                .add_entry(EntryDraft::new("kept", "text").keywords(["k"]).priority(3))
                .unwrap();
            lorebook.add_entry(EntryDraft::new("gone", "text")).unwrap();
            lorebook.remove_entries(&["gone"]);
        }

        let store = assert_ok!(open_store(Some(&path)));
        let reopened = Lorebook::new(Arc::clone(&store)).unwrap();
        assert_eq!(reopened.len(), 1, "{}", file);
        let kept = reopened.get_entry("kept").unwrap();
        assert_eq!(kept.priority(), 3);
        assert_eq!(kept.keywords(), &["k".to_string()]);
    }
}
