//! Command-line front end for voice-notes.

pub mod args;
pub mod commands;

pub use args::Cli;
pub use args::Commands;
