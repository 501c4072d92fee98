//! Speech-to-text capability for dictated notes.
//!
//! The capture flow talks to engines through `SpeechEngine`. Engines are
//! optional at runtime: the default build ships `UnavailableEngine`, and the
//! `whisper` feature adds offline transcription from the microphone or a
//! WAV file.

#[cfg(feature = "whisper")]
mod audio;
#[cfg(feature = "whisper")]
mod microphone;
mod slot;
mod transcript;
#[cfg(feature = "whisper")]
mod wav;
#[cfg(feature = "whisper")]
mod whisper;

pub use slot::{RecordingLease, RecordingSlot};
pub use transcript::Transcript;
#[cfg(feature = "whisper")]
pub use whisper::{AudioSource, WhisperEngine};

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::app::config::Config;
use crate::domain::traits::{SpeechEngine, TranscriptionSession};

/// Errors of the speech capability surfaced to the capture flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech recognition is not available")]
    Unavailable,

    #[error("another recording session is already active")]
    SessionBusy,

    #[error("speech engine failed: {0}")]
    Engine(String),
}

/// Engine used when no speech backend is compiled in or configured.
pub struct UnavailableEngine;

impl SpeechEngine for UnavailableEngine {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn start(&self, _language: &str) -> Result<Box<dyn TranscriptionSession>> {
        bail!(SpeechError::Unavailable)
    }
}

/// Build the engine for live dictation, or for transcribing `wav` when given.
#[cfg(feature = "whisper")]
pub fn create_engine(config: &Config, wav: Option<&Path>) -> Box<dyn SpeechEngine> {
    let model = resolve_model_path(config);
    let source = match wav {
        Some(path) => AudioSource::WavFile(path.to_path_buf()),
        None => AudioSource::Microphone,
    };
    Box::new(WhisperEngine::new(model, source, config.segment_interval_secs))
}

/// Build the engine for live dictation, or for transcribing `wav` when given.
#[cfg(not(feature = "whisper"))]
pub fn create_engine(_config: &Config, wav: Option<&Path>) -> Box<dyn SpeechEngine> {
    log::debug!(
        "Built without the 'whisper' feature; dictation unavailable (wav: {:?})",
        wav
    );
    Box::new(UnavailableEngine)
}

/// Resolve the configured Whisper model to a path.
///
/// Bare file names are looked up in `models_dir()`.
pub fn resolve_model_path(config: &Config) -> PathBuf {
    let configured = Path::new(&config.whisper_model);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        crate::app::config::models_dir().join(configured)
    }
}
