mod note;
mod persistence;

pub use note::Note;
pub use persistence::{
    default_data_dir, load_notes, parse_notes, save_notes, FileStore, LoadReport, MemoryStore,
    CORRUPT_SUFFIX, NOTES_KEY,
};

use anyhow::Result;
use std::sync::Arc;

use crate::domain::traits::{KeyValueStore, NoteRepository, Notifier};

pub const NOTE_DELETED_MESSAGE: &str = "Note deleted successfully!";

/// Whether `content` counts as an empty note.
///
/// Only the exact empty string is empty; whitespace is content. Creation,
/// the capture flow and load-time validation all use this rule.
pub fn is_empty_content(content: &str) -> bool {
    content.is_empty()
}

/// Ordered note collection mirrored to a key-value store.
///
/// Newest note first. Every create and delete rewrites the whole collection
/// under the configured key.
pub struct NoteStore {
    notes: Vec<Note>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    notifier: Arc<dyn Notifier>,
}

impl NoteStore {
    /// Load the collection stored under `key`.
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<(Self, LoadReport)> {
        let key = key.into();
        let (notes, report) = load_notes(storage.as_ref(), &key)?;
        log::debug!("Opened note store '{}': {:?}", key, report);

        Ok((
            Self {
                notes,
                storage,
                key,
                notifier,
            },
            report,
        ))
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn persist(&self) -> Result<()> {
        save_notes(self.storage.as_ref(), &self.key, &self.notes)
    }
}

impl NoteRepository for NoteStore {
    fn create_note(&mut self, content: &str) -> Result<Option<Note>> {
        if is_empty_content(content) {
            return Ok(None);
        }

        let note = Note::new(content);
        self.notes.insert(0, note.clone());
        self.persist()?;
        log::info!("Created note {} ({} chars)", note.id, note.content.chars().count());

        Ok(Some(note))
    }

    fn delete_note(&mut self, id: &str) -> Result<bool> {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        let removed = self.notes.len() != before;

        self.persist()?;
        if removed {
            log::info!("Deleted note {}", id);
        } else {
            log::debug!("Delete of unknown note {} ignored", id);
        }
        self.notifier.success(NOTE_DELETED_MESSAGE);

        Ok(removed)
    }

    fn notes(&self) -> &[Note] {
        &self.notes
    }

    fn search(&self, query: &str) -> Vec<&Note> {
        if query.is_empty() {
            return self.notes.iter().collect();
        }

        let query_lower = query.to_lowercase();
        self.notes
            .iter()
            .filter(|n| n.content.to_lowercase().contains(&query_lower))
            .collect()
    }
}
