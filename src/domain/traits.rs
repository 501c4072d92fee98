//! Core domain traits for dependency inversion.
//!
//! These traits define contracts between layers without depending on
//! concrete implementations. They enable:
//! - Testability via mock implementations
//! - Swapping the storage backend or speech engine
//! - Clear API boundaries between the capture flow and the store

use anyhow::Result;
use async_channel::Receiver;

use crate::domain::types::{Note, SpeechEvent};

/// Note collection abstraction.
///
/// Implementors own the ordered note collection (most recent first) and
/// persist it after every mutation.
pub trait NoteRepository {
    /// Create a note from `content` and prepend it.
    ///
    /// Returns `Ok(None)` when the content is rejected as empty.
    fn create_note(&mut self, content: &str) -> Result<Option<Note>>;

    /// Remove the note with `id`. Unknown ids are a no-op.
    ///
    /// Returns whether a note was removed.
    fn delete_note(&mut self, id: &str) -> Result<bool>;

    /// Get all notes (most recent first).
    fn notes(&self) -> &[Note];

    /// Case-insensitive substring search; an empty query returns everything.
    fn search(&self, query: &str) -> Vec<&Note>;
}

/// Durable key-value storage.
///
/// Values are whole serialized documents: read whole, written whole.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;
}

/// User-facing transient notifications.
///
/// Presentation only; nothing reads them back programmatically.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Speech-to-text capability.
///
/// Engines may be missing at runtime (no model, no input device), so
/// callers must probe `is_available` before starting a session.
pub trait SpeechEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Check whether a session could be started right now.
    fn is_available(&self) -> bool;

    /// Start a transcription session.
    ///
    /// # Arguments
    /// * `language` - Language code (e.g., "pt", "en", "auto")
    fn start(&self, language: &str) -> Result<Box<dyn TranscriptionSession>>;
}

/// A running transcription session.
pub trait TranscriptionSession: Send {
    /// Channel of recognition events, in arrival order.
    fn events(&self) -> &Receiver<SpeechEvent>;

    /// Stop capturing audio.
    ///
    /// Blocks until the engine has flushed its remaining results, so every
    /// event is in the channel when this returns. Calling it twice is a
    /// no-op.
    fn stop(&mut self);
}
