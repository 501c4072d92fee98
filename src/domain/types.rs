//! Shared types used across multiple modules.
//!
//! This module contains the note record and the speech event vocabulary
//! shared by the store, the capture flow and the speech engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a note (UUID v4 rendered as a string).
pub type NoteId = String;

const PREVIEW_CHARS: usize = 80;

/// A single user-authored note.
///
/// Serialized as `{ "id", "date", "content" }`; the field names are the
/// storage format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub date: DateTime<Utc>,
    pub content: String,
}

impl Note {
    /// Creates a note with a fresh id stamped with the current time.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_date(content, Utc::now())
    }

    /// Creates a note with a fresh id and a caller-provided timestamp.
    pub fn with_date(content: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            content: content.into(),
        }
    }

    /// Returns a preview of the content (first 80 chars, single line)
    pub fn preview(&self) -> String {
        let text = self.content.replace(['\r', '\n'], " ");
        let chars: Vec<char> = text.chars().collect();
        if chars.len() > PREVIEW_CHARS {
            format!("{}...", chars[..PREVIEW_CHARS].iter().collect::<String>())
        } else {
            text
        }
    }

    /// Returns the creation time in local time (YYYY-MM-DD HH:MM)
    pub fn formatted_date(&self) -> String {
        let local = self.date.with_timezone(&chrono::Local);
        local.format("%Y-%m-%d %H:%M").to_string()
    }

    /// Returns how long ago the note was created, relative to `now`.
    ///
    /// Timestamps in the future (clock skew between machines) read as
    /// "just now".
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(self.date);
        let secs = elapsed.num_seconds();
        if secs < 60 {
            return "just now".to_string();
        }

        let (amount, unit) = if secs < 3600 {
            (elapsed.num_minutes(), "minute")
        } else if secs < 86_400 {
            (elapsed.num_hours(), "hour")
        } else if elapsed.num_days() < 30 {
            (elapsed.num_days(), "day")
        } else if elapsed.num_days() < 365 {
            (elapsed.num_days() / 30, "month")
        } else {
            (elapsed.num_days() / 365, "year")
        };

        if amount == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{amount} {unit}s ago")
        }
    }
}

/// Event delivered by a running transcription session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Recognized text for result slot `index`.
    ///
    /// Interim results for a slot are superseded by later results with the
    /// same index; a final result closes the slot.
    Result {
        index: usize,
        text: String,
        is_final: bool,
    },
    /// The engine failed; the session produces nothing further.
    Error(String),
    /// The session finished and flushed all results.
    End,
}
