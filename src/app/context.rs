//! Application context bundling the store, the speech engine and shared
//! handles.
//!
//! Front ends receive one `AppContext` instead of building their own
//! storage, engine or recording slot.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::app::config::Config;
use crate::domain::traits::{KeyValueStore, Notifier, SpeechEngine};
use crate::notes::{FileStore, LoadReport, NoteStore};
use crate::speech::{create_engine, RecordingSlot};

pub struct AppContext {
    /// Validated application configuration
    pub config: Config,

    /// The note collection
    pub store: NoteStore,

    /// Speech engine for dictation
    pub engine: Box<dyn SpeechEngine>,

    /// Process-wide recording capability; at most one session holds it
    pub slot: RecordingSlot,

    /// User-facing messages
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    /// Open file-backed storage under the configured data dir and load the
    /// notes. `wav` selects file transcription instead of the microphone.
    pub fn open(config: Config, notifier: Arc<dyn Notifier>, wav: Option<&Path>) -> Result<Self> {
        let data_dir = config.data_dir();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(data_dir));

        let engine = create_engine(&config, wav);
        Self::with_parts(config, storage, engine, notifier)
    }

    /// Assemble a context from explicit parts.
    pub fn with_parts(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        engine: Box<dyn SpeechEngine>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let (store, report) = NoteStore::open(storage, config.storage_key.clone(), notifier.clone())?;
        match &report {
            LoadReport::Recovered { reason, backup_key } => notifier.warning(&format!(
                "Saved notes could not be read ({reason}); starting empty. \
                 The old data was kept under '{backup_key}'."
            )),
            LoadReport::Repaired {
                dropped,
                backup_key,
                ..
            } => notifier.warning(&format!(
                "Skipped {dropped} unreadable saved note(s). \
                 The original data was kept under '{backup_key}'."
            )),
            LoadReport::Loaded { .. } | LoadReport::Missing => {}
        }

        log::debug!(
            "Context ready: {} notes, engine '{}'",
            store.len(),
            engine.name()
        );

        Ok(Self {
            config,
            store,
            engine,
            slot: RecordingSlot::new(),
            notifier,
        })
    }
}
