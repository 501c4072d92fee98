//! Integration test: note store persistence round-trip.
//!
//! Drives the store through create, search and delete against a real
//! file-backed key-value store, then reopens it from disk.

use std::fs;
use std::sync::Arc;

use voice_notes::domain::traits::{KeyValueStore, NoteRepository, Notifier};
use voice_notes::notes::{FileStore, LoadReport, NoteStore, NOTES_KEY};

struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn success(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
}

fn open(storage: Arc<FileStore>) -> (NoteStore, LoadReport) {
    NoteStore::open(storage, NOTES_KEY, Arc::new(SilentNotifier)).expect("open store")
}

/// Two notes, search, delete one, reopen.
#[test]
fn create_search_delete_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStore::new(dir.path()));

    let (mut store, report) = open(storage.clone());
    assert_eq!(report, LoadReport::Missing);

    store.create_note("Buy milk").unwrap();
    let call = store.create_note("Call mom").unwrap().expect("note created");

    let hits = store.search("MILK");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "Buy milk");

    assert!(store.delete_note(&call.id).unwrap());

    let (reopened, report) = open(storage);
    assert_eq!(report, LoadReport::Loaded { count: 1 });
    assert_eq!(reopened.notes().len(), 1);
    assert_eq!(reopened.notes()[0].content, "Buy milk");
}

/// Content, ids and timestamps survive the file round-trip exactly.
#[test]
fn notes_survive_reload_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStore::new(dir.path()));

    let (mut store, _) = open(storage.clone());
    store.create_note("Reunião às 10h: levar o relatório").unwrap();
    store.create_note("line one\nline two").unwrap();
    store.create_note("  padded  ").unwrap();
    let before = store.notes().to_vec();

    let (reopened, _) = open(storage);
    assert_eq!(reopened.notes(), before.as_slice());
    assert_eq!(reopened.notes()[0].content, "  padded  ");
}

/// Stored value is a JSON array of `{id, date, content}` objects.
#[test]
fn stored_format_is_json_array() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStore::new(dir.path()));

    let (mut store, _) = open(storage.clone());
    let note = store.create_note("Shape check").unwrap().unwrap();

    let raw = storage.get(NOTES_KEY).unwrap().expect("stored value");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    let items = value.as_array().expect("array");
    assert_eq!(items.len(), 1);

    let object = items[0].as_object().expect("object");
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["content", "date", "id"]);
    assert_eq!(object["id"], note.id.as_str());
    assert_eq!(object["content"], "Shape check");
}

/// Notes written by hand in the storage format load in stored order.
#[test]
fn hand_written_storage_loads() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("notes.json"),
        r#"[
            {"id": "b", "date": "2024-05-02T09:00:00Z", "content": "Newer"},
            {"id": "a", "date": "2024-05-01T09:00:00Z", "content": "Older"}
        ]"#,
    )
    .unwrap();

    let (store, report) = open(Arc::new(FileStore::new(dir.path())));
    assert_eq!(report, LoadReport::Loaded { count: 2 });
    assert_eq!(store.notes()[0].id, "b");
    assert_eq!(store.search("older")[0].id, "a");
}

/// A corrupt file is kept aside and the store starts empty.
#[test]
fn corrupt_storage_is_backed_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("notes.json"), "this is not json").unwrap();
    let storage = Arc::new(FileStore::new(dir.path()));

    let (mut store, report) = open(storage.clone());
    assert!(matches!(report, LoadReport::Recovered { ref backup_key, .. } if backup_key == "notes.corrupt"));
    assert!(store.is_empty());

    store.create_note("Fresh start").unwrap();
    assert_eq!(
        storage.get("notes.corrupt").unwrap().as_deref(),
        Some("this is not json")
    );
}

/// Search with an empty query returns everything; deleting twice is the same
/// as deleting once.
#[test]
fn search_and_delete_properties() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _) = open(Arc::new(FileStore::new(dir.path())));

    for text in ["alpha", "beta", "gamma"] {
        store.create_note(text).unwrap();
    }
    let all: Vec<String> = store.search("").iter().map(|n| n.content.clone()).collect();
    assert_eq!(all, vec!["gamma", "beta", "alpha"]);

    let id = store.notes()[1].id.clone();
    assert!(store.delete_note(&id).unwrap());
    let after_once = store.notes().to_vec();
    assert!(!store.delete_note(&id).unwrap());
    assert_eq!(store.notes(), after_once.as_slice());
}

/// Records skipped on load stay recoverable after the next save rewrites
/// the file.
#[test]
fn skipped_records_survive_next_save() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("notes.json"),
        r#"[
            {"id": "a", "date": "2024-05-01T09:00:00Z", "content": "First"},
            {"id": "a", "date": "2024-05-02T09:00:00Z", "content": "Clashing id"}
        ]"#,
    )
    .unwrap();
    let storage = Arc::new(FileStore::new(dir.path()));

    let (mut store, report) = open(storage.clone());
    assert!(matches!(report, LoadReport::Repaired { count: 1, dropped: 1, .. }));

    store.create_note("After repair").unwrap();
    assert_eq!(store.len(), 2);
    let backup = fs::read_to_string(dir.path().join("notes.corrupt.json")).expect("backup file");
    assert!(backup.contains("Clashing id"));
    let current = storage.get(NOTES_KEY).unwrap().unwrap();
    assert!(!current.contains("Clashing id"));
}
