//! Draft capture for new notes.
//!
//! A draft is written either by typing or by dictation. The flow is an
//! explicit state machine:
//!
//! ```text
//! Onboarding --start_typing--> Typing
//! Onboarding/Typing --start_recording--> Recording
//! Recording --stop_recording / engine end or error--> Typing
//! Typing --edit("")--> Onboarding
//! any --save / abandon--> Onboarding
//! ```
//!
//! Every other transition is rejected with `CaptureError::InvalidTransition`.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use async_channel::TryRecvError;

use crate::domain::traits::{NoteRepository, Notifier, SpeechEngine, TranscriptionSession};
use crate::domain::types::{Note, SpeechEvent};
use crate::notes::is_empty_content;
use crate::speech::{RecordingLease, RecordingSlot, SpeechError, Transcript};

pub const NOTE_CREATED_MESSAGE: &str = "Note created successfully!";
pub const SPEECH_UNSUPPORTED_MESSAGE: &str = "Your environment does not support speech recording!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No content yet; the instructional prompt is shown.
    Onboarding,
    /// Free-text entry.
    Typing,
    /// Live transcription replaces the draft as results arrive.
    Recording,
}

impl Display for CaptureState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Onboarding => "onboarding",
            Self::Typing => "typing",
            Self::Recording => "recording",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: CaptureState,
        action: &'static str,
    },

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Outcome of draining transcription events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollOutcome {
    /// Number of results applied to the draft.
    pub updates: usize,
    /// The session ended on its own (end of input or engine error) and the
    /// capture went back to `Typing`.
    pub finished: bool,
}

struct ActiveRecording {
    session: Box<dyn TranscriptionSession>,
    transcript: Transcript,
    _lease: RecordingLease,
}

/// One note-in-progress.
pub struct NoteCapture {
    state: CaptureState,
    draft: String,
    recording: Option<ActiveRecording>,
    notifier: Arc<dyn Notifier>,
}

impl NoteCapture {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: CaptureState::Onboarding,
            draft: String::new(),
            recording: None,
            notifier,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// (Re)open the capture surface; an empty draft shows the prompt again.
    pub fn open(&mut self) {
        if self.draft.is_empty() && self.state != CaptureState::Recording {
            self.state = CaptureState::Onboarding;
        }
    }

    pub fn start_typing(&mut self) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Onboarding => {
                self.state = CaptureState::Typing;
                Ok(())
            }
            state => Err(CaptureError::InvalidTransition {
                state,
                action: "start typing",
            }),
        }
    }

    /// Replace the draft with `content`; clearing it returns to the prompt.
    pub fn edit(&mut self, content: impl Into<String>) -> Result<(), CaptureError> {
        if self.state != CaptureState::Typing {
            return Err(CaptureError::InvalidTransition {
                state: self.state,
                action: "edit",
            });
        }

        self.draft = content.into();
        if self.draft.is_empty() {
            self.state = CaptureState::Onboarding;
        }
        Ok(())
    }

    /// Start dictation.
    ///
    /// When the engine is unavailable a warning is shown and the state is
    /// left untouched. Only one recording may hold `slot` at a time.
    pub fn start_recording(
        &mut self,
        engine: &dyn SpeechEngine,
        slot: &RecordingSlot,
        language: &str,
    ) -> Result<(), CaptureError> {
        if self.state == CaptureState::Recording {
            return Err(CaptureError::InvalidTransition {
                state: self.state,
                action: "start recording",
            });
        }

        if !engine.is_available() {
            log::warn!("Speech engine '{}' is not available", engine.name());
            self.notifier.warning(SPEECH_UNSUPPORTED_MESSAGE);
            return Err(SpeechError::Unavailable.into());
        }

        let lease = slot.acquire()?;
        let session = engine.start(language).map_err(|e| {
            log::error!("Failed to start '{}' session: {:#}", engine.name(), e);
            SpeechError::Engine(format!("{e:#}"))
        })?;

        log::info!("Recording started with '{}' ({})", engine.name(), language);
        self.recording = Some(ActiveRecording {
            session,
            transcript: Transcript::new(),
            _lease: lease,
        });
        self.state = CaptureState::Recording;
        Ok(())
    }

    /// Apply every transcription event received so far.
    ///
    /// Each result replaces the draft with the cumulative transcript. When
    /// the engine ends or fails, the session is released and the capture
    /// falls back to `Typing` with the text transcribed so far.
    pub fn poll_transcript(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        let Some(recording) = self.recording.as_mut() else {
            return outcome;
        };

        loop {
            match recording.session.events().try_recv() {
                Ok(event) => {
                    if Self::apply_event(recording, &mut self.draft, event, &mut outcome) {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    outcome.finished = true;
                    break;
                }
            }
        }

        if outcome.finished {
            self.finish_recording();
        }
        outcome
    }

    /// Returns true when the event ends the session.
    fn apply_event(
        recording: &mut ActiveRecording,
        draft: &mut String,
        event: SpeechEvent,
        outcome: &mut PollOutcome,
    ) -> bool {
        match event {
            SpeechEvent::Result { index, text, .. } => {
                recording.transcript.apply(index, &text);
                *draft = recording.transcript.text();
                outcome.updates += 1;
                false
            }
            SpeechEvent::Error(message) => {
                log::error!("Speech recognition error: {}", message);
                outcome.finished = true;
                true
            }
            SpeechEvent::End => {
                outcome.finished = true;
                true
            }
        }
    }

    /// Stop dictation and keep whatever was transcribed.
    pub fn stop_recording(&mut self) -> Result<PollOutcome, CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::InvalidTransition {
                state: self.state,
                action: "stop recording",
            });
        }

        if let Some(recording) = self.recording.as_mut() {
            recording.session.stop();
        }
        let mut outcome = self.poll_transcript();
        if !outcome.finished {
            outcome.finished = true;
            self.finish_recording();
        }
        Ok(outcome)
    }

    fn finish_recording(&mut self) {
        if let Some(mut recording) = self.recording.take() {
            recording.session.stop();
            log::info!(
                "Recording finished ({} segments, {} chars)",
                recording.transcript.segment_count(),
                self.draft.chars().count()
            );
        }
        self.state = CaptureState::Typing;
    }

    /// Hand the draft to `store` and reset.
    ///
    /// An empty draft is a silent no-op returning `Ok(None)`.
    pub fn save(&mut self, store: &mut dyn NoteRepository) -> Result<Option<Note>, CaptureError> {
        if self.state == CaptureState::Recording {
            return Err(CaptureError::InvalidTransition {
                state: self.state,
                action: "save",
            });
        }
        if is_empty_content(&self.draft) {
            return Ok(None);
        }

        let Some(note) = store.create_note(&self.draft)? else {
            return Ok(None);
        };

        self.draft.clear();
        self.state = CaptureState::Onboarding;
        self.notifier.success(NOTE_CREATED_MESSAGE);
        Ok(Some(note))
    }

    /// Close without saving: the draft is discarded and nothing persists.
    pub fn abandon(&mut self) {
        if let Some(mut recording) = self.recording.take() {
            recording.session.stop();
        }
        self.draft.clear();
        self.state = CaptureState::Onboarding;
    }
}

impl Drop for NoteCapture {
    fn drop(&mut self) {
        if let Some(mut recording) = self.recording.take() {
            recording.session.stop();
        }
    }
}
