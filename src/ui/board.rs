//! Note list with live search.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::domain::traits::NoteRepository;
use crate::domain::types::Note;

pub const CREATE_CARD_LABEL: &str = "[+] New note  (voice-notes new)";
pub const NO_MATCHES_LABEL: &str = "No notes match your search.";

/// One entry of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Card<'a> {
    /// Entry point for capturing a new note; always first.
    Create,
    Note(&'a Note),
}

/// Search query plus the card list derived from it.
#[derive(Debug, Clone, Default)]
pub struct NoteBoard {
    query: String,
}

impl NoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The create card followed by every note matching the query.
    pub fn cards<'a>(&self, store: &'a dyn NoteRepository) -> Vec<Card<'a>> {
        std::iter::once(Card::Create)
            .chain(store.search(&self.query).into_iter().map(Card::Note))
            .collect()
    }

    pub fn delete(&self, store: &mut dyn NoteRepository, id: &str) -> Result<bool> {
        store.delete_note(id)
    }

    /// Terminal rendering of the board at time `now`.
    pub fn render(&self, store: &dyn NoteRepository, now: DateTime<Utc>) -> String {
        let cards = self.cards(store);
        let mut out = String::new();

        if !self.query.is_empty() {
            let _ = writeln!(out, "Search: \"{}\"", self.query);
        }

        for card in &cards {
            match card {
                Card::Create => {
                    let _ = writeln!(out, "{CREATE_CARD_LABEL}");
                }
                Card::Note(note) => {
                    let _ = writeln!(
                        out,
                        "\n{}  {} ({})\n  {}",
                        note.id,
                        note.formatted_date(),
                        note.relative_age(now),
                        note.preview()
                    );
                }
            }
        }

        if cards.len() == 1 && !self.query.is_empty() {
            let _ = writeln!(out, "\n{NO_MATCHES_LABEL}");
        }
        out
    }
}
