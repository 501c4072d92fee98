//! Mock implementations for unit testing.
//!
//! These mocks implement the traits from `crate::domain::traits` so the
//! store and the capture flow can be tested without a disk, a terminal or a
//! speech engine.

use anyhow::{bail, Result};
use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::domain::traits::{
    KeyValueStore, NoteRepository, Notifier, SpeechEngine, TranscriptionSession,
};
use crate::domain::types::{Note, SpeechEvent};
use crate::notes::is_empty_content;

/// Notifier that remembers every message.
#[derive(Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}

/// In-memory note repository without persistence.
#[derive(Default)]
pub struct MockNoteRepository {
    notes: Vec<Note>,
}

impl MockNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteRepository for MockNoteRepository {
    fn create_note(&mut self, content: &str) -> Result<Option<Note>> {
        if is_empty_content(content) {
            return Ok(None);
        }
        let note = Note::new(content);
        self.notes.insert(0, note.clone());
        Ok(Some(note))
    }

    fn delete_note(&mut self, id: &str) -> Result<bool> {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        Ok(self.notes.len() != before)
    }

    fn notes(&self) -> &[Note] {
        &self.notes
    }

    fn search(&self, query: &str) -> Vec<&Note> {
        let query_lower = query.to_lowercase();
        self.notes
            .iter()
            .filter(|n| n.content.to_lowercase().contains(&query_lower))
            .collect()
    }
}

/// Key-value store whose writes always fail.
#[derive(Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        bail!("disk full while writing '{}'", key)
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct EngineState {
    sender: Option<Sender<SpeechEvent>>,
    flush_on_stop: Vec<(usize, String)>,
    on_start: Vec<SpeechEvent>,
    starts: usize,
    stops: usize,
    last_language: Option<String>,
}

/// Scripted speech engine.
///
/// Tests push events into the most recent session with `emit_*`, or queue
/// them with `queue_on_start` for the next session to deliver as soon as it
/// starts. Stopping a session delivers the `flush_on_stop` results followed
/// by `End`, like an engine flushing its last audio.
pub struct MockSpeechEngine {
    available: bool,
    start_error: Option<String>,
    state: Arc<Mutex<EngineState>>,
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self {
            available: true,
            start_error: None,
            state: Arc::new(Mutex::new(EngineState::default())),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing_start(message: &str) -> Self {
        Self {
            start_error: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Result delivered when the next session is stopped.
    pub fn flush_on_stop(&self, index: usize, text: &str) {
        self.state
            .lock()
            .flush_on_stop
            .push((index, text.to_string()));
    }

    /// Event the next session delivers right after it starts.
    pub fn queue_on_start(&self, event: SpeechEvent) {
        self.state.lock().on_start.push(event);
    }

    pub fn emit_result(&self, index: usize, text: &str, is_final: bool) {
        self.emit(SpeechEvent::Result {
            index,
            text: text.to_string(),
            is_final,
        });
    }

    pub fn emit_error(&self, message: &str) {
        self.emit(SpeechEvent::Error(message.to_string()));
    }

    pub fn emit_end(&self) {
        self.emit(SpeechEvent::End);
    }

    fn emit(&self, event: SpeechEvent) {
        let sender = self.state.lock().sender.clone();
        if let Some(sender) = sender {
            let _ = sender.try_send(event);
        }
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    pub fn last_language(&self) -> Option<String> {
        self.state.lock().last_language.clone()
    }
}

impl Default for MockSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&self, language: &str) -> Result<Box<dyn TranscriptionSession>> {
        if let Some(message) = &self.start_error {
            bail!("{}", message);
        }

        let (tx, rx) = async_channel::unbounded();
        let mut state = self.state.lock();
        state.sender = Some(tx.clone());
        state.starts += 1;
        state.last_language = Some(language.to_string());
        for event in std::mem::take(&mut state.on_start) {
            let _ = tx.try_send(event);
        }

        Ok(Box::new(MockSession {
            events: rx,
            sender: tx,
            state: self.state.clone(),
            stopped: false,
        }))
    }
}

struct MockSession {
    events: Receiver<SpeechEvent>,
    sender: Sender<SpeechEvent>,
    state: Arc<Mutex<EngineState>>,
    stopped: bool,
}

impl TranscriptionSession for MockSession {
    fn events(&self) -> &Receiver<SpeechEvent> {
        &self.events
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let flush = {
            let mut state = self.state.lock();
            state.stops += 1;
            std::mem::take(&mut state.flush_on_stop)
        };
        for (index, text) in flush {
            let _ = self.sender.try_send(SpeechEvent::Result {
                index,
                text,
                is_final: true,
            });
        }
        let _ = self.sender.try_send(SpeechEvent::End);
    }
}
