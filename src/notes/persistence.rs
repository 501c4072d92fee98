use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use crate::domain::traits::KeyValueStore;
use crate::domain::types::Note;
use crate::notes::is_empty_content;

/// Storage key holding the whole note collection.
pub const NOTES_KEY: &str = "notes";

/// Suffix of the key a corrupt value is copied to before the store starts empty.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voice-notes")
}

/// What `load_notes` found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    /// Nothing stored yet; the collection starts empty.
    Missing,
    /// Every stored note was read.
    Loaded { count: usize },
    /// Some records had empty content or repeated an earlier id and were
    /// skipped. The raw value was copied to `backup_key` before any save
    /// could overwrite it.
    Repaired {
        count: usize,
        dropped: usize,
        backup_key: String,
    },
    /// The stored value could not be parsed. The collection starts empty
    /// and the raw value was copied to `backup_key`.
    Recovered { reason: String, backup_key: String },
}

/// Read the note collection stored under `key`.
///
/// Only storage I/O failures are errors. Whenever the stored value is not
/// taken as-is (unparseable, or records skipped by validation) the raw value
/// is first copied to `<key>.corrupt`, so the next save cannot destroy it.
pub fn load_notes(storage: &dyn KeyValueStore, key: &str) -> Result<(Vec<Note>, LoadReport)> {
    let Some(raw) = storage.get(key)? else {
        return Ok((Vec::new(), LoadReport::Missing));
    };

    match parse_notes(&raw) {
        Ok((notes, 0)) => {
            let count = notes.len();
            Ok((notes, LoadReport::Loaded { count }))
        }
        Ok((notes, dropped)) => {
            let backup_key = back_up(storage, key, &raw)?;
            log::warn!(
                "Skipped {} invalid stored notes under '{}'; original kept in '{}'",
                dropped,
                key,
                backup_key
            );
            let count = notes.len();
            Ok((
                notes,
                LoadReport::Repaired {
                    count,
                    dropped,
                    backup_key,
                },
            ))
        }
        Err(e) => {
            let backup_key = back_up(storage, key, &raw)?;
            log::warn!(
                "Stored notes under '{}' are unreadable ({:#}); starting empty, backup kept in '{}'",
                key,
                e,
                backup_key
            );
            Ok((
                Vec::new(),
                LoadReport::Recovered {
                    reason: format!("{e:#}"),
                    backup_key,
                },
            ))
        }
    }
}

fn back_up(storage: &dyn KeyValueStore, key: &str, raw: &str) -> Result<String> {
    let backup_key = format!("{key}{CORRUPT_SUFFIX}");
    storage
        .set(&backup_key, raw)
        .with_context(|| format!("Failed to back up stored notes to '{}'", backup_key))?;
    Ok(backup_key)
}

/// Serialize the whole collection and write it under `key`.
pub fn save_notes(storage: &dyn KeyValueStore, key: &str, notes: &[Note]) -> Result<()> {
    let content = serde_json::to_string(notes).context("Failed to serialize notes")?;
    storage.set(key, &content)
}

/// Parse a stored note array, dropping records that break collection
/// invariants (empty content, repeated id). Returns the notes and the
/// number of dropped records.
pub fn parse_notes(raw: &str) -> Result<(Vec<Note>, usize)> {
    let parsed: Vec<Note> = serde_json::from_str(raw).context("Failed to parse stored notes")?;

    let total = parsed.len();
    let mut seen = HashSet::new();
    let notes: Vec<Note> = parsed
        .into_iter()
        .filter(|note| !is_empty_content(&note.content) && seen.insert(note.id.clone()))
        .collect();
    let dropped = total - notes.len();

    Ok((notes, dropped))
}

/// File-backed key-value store: one `<key>.json` file per key.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory {}", self.dir.display()))?;

        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))?;

        crate::app::config::set_owner_only_permissions(&path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Keys become file names, so they must stay inside the data directory.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("Storage key must not be empty");
    }
    if key.contains("..") || key.contains('/') || key.contains('\\') {
        bail!("Storage key '{}' must not contain path separators", key);
    }
    Ok(())
}

/// In-memory key-value store.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}
