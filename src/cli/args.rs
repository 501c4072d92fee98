//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voice Notes - type or dictate short notes from the terminal
#[derive(Parser, Debug)]
#[command(name = "voice-notes")]
#[command(about = "Type or dictate short notes, then search and delete them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file path (default: ~/.config/voice-notes/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the notes directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a note from the given text
    Add {
        /// Note content; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Show all notes, newest first
    List {
        /// Only show notes containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Delete a note by id
    Delete {
        /// Id shown by `list`
        id: String,
    },
    /// Open the interactive capture surface
    New,
    /// Record one note by voice and save it
    Dictate {
        /// Transcribe a WAV file instead of the microphone
        #[arg(long)]
        wav: Option<PathBuf>,

        /// Override the dictation language (pt-BR, en, auto, ...)
        #[arg(short, long)]
        language: Option<String>,
    },
}
