//! Subcommand implementations.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::app::config::{load_config, load_config_from, Config};
use crate::app::AppContext;
use crate::capture::{CaptureError, NoteCapture};
use crate::cli::args::{Cli, Commands};
use crate::domain::traits::Notifier;
use crate::ui::{spawn_line_reader, CaptureLoop, NoteBoard, TerminalNotifier};

/// Load config with cascade: custom path -> default path -> defaults, then
/// apply command-line overrides.
pub fn load_cli_config(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            load_config_from(path)?
        }
        None => load_config().unwrap_or_else(|e| {
            eprintln!("Failed to load config: {:#}. Using defaults.", e);
            Config::default()
        }),
    };

    if let Some(dir) = data_dir {
        config.data_dir = Some(dir.to_string_lossy().into_owned());
    }
    config.validate()?;
    Ok(config)
}

/// Run the parsed command line. `interrupted` is raised by Ctrl+C.
pub fn run(cli: Cli, config: Config, interrupted: Arc<AtomicBool>) -> Result<()> {
    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
    let command = cli.command.unwrap_or(Commands::List { search: None });

    let wav = match &command {
        Commands::Dictate { wav, .. } => wav.clone(),
        _ => None,
    };
    let mut ctx = AppContext::open(config, notifier, wav.as_deref())?;
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Add { text } => add(&mut ctx, &text.join(" "), &mut stdout),
        Commands::List { search } => list(&ctx, search.as_deref(), Utc::now(), &mut stdout),
        Commands::Delete { id } => delete(&mut ctx, &id, &mut stdout),
        Commands::New => {
            let lines = spawn_line_reader(BufReader::new(io::stdin()));
            interactive(&mut ctx, &lines, &interrupted, stdout)
        }
        Commands::Dictate { wav, language } => {
            let lines = spawn_line_reader(BufReader::new(io::stdin()));
            dictate(&mut ctx, wav, language, &lines, &interrupted, stdout)
        }
    }
}

/// Create a note from `text` through the same path as the capture surface.
pub fn add(ctx: &mut AppContext, text: &str, out: &mut impl Write) -> Result<()> {
    let mut capture = NoteCapture::new(ctx.notifier.clone());
    capture.start_typing()?;
    capture.edit(text)?;

    match capture.save(&mut ctx.store) {
        Ok(Some(note)) => {
            writeln!(out, "{}", note.id)?;
            Ok(())
        }
        Ok(None) => {
            eprintln!("Nothing to save: the note is empty.");
            Ok(())
        }
        Err(CaptureError::Store(e)) => Err(e),
        Err(e) => Err(e.into()),
    }
}

pub fn list(
    ctx: &AppContext,
    search: Option<&str>,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<()> {
    let board = NoteBoard::with_query(search.unwrap_or_default());
    write!(out, "{}", board.render(&ctx.store, now))?;
    Ok(())
}

pub fn delete(ctx: &mut AppContext, id: &str, out: &mut impl Write) -> Result<()> {
    if ctx.store.get(id).is_none() {
        bail!("Note not found: {}", id);
    }
    NoteBoard::new().delete(&mut ctx.store, id)?;
    writeln!(out, "{}", id)?;
    Ok(())
}

pub fn interactive(
    ctx: &mut AppContext,
    lines: &async_channel::Receiver<String>,
    interrupted: &AtomicBool,
    out: impl Write,
) -> Result<()> {
    let mut ui = CaptureLoop::new(
        &mut ctx.store,
        &*ctx.engine,
        &ctx.slot,
        &ctx.config.language,
        ctx.notifier.clone(),
        out,
    );
    ui.run(lines, interrupted)
}

pub fn dictate(
    ctx: &mut AppContext,
    wav: Option<PathBuf>,
    language: Option<String>,
    lines: &async_channel::Receiver<String>,
    interrupted: &AtomicBool,
    out: impl Write,
) -> Result<()> {
    if let Some(path) = &wav {
        if !path.exists() {
            bail!("WAV file not found: {}", path.display());
        }
    }
    let language = language.unwrap_or_else(|| ctx.config.language.clone());

    let mut ui = CaptureLoop::new(
        &mut ctx.store,
        &*ctx.engine,
        &ctx.slot,
        &language,
        ctx.notifier.clone(),
        out,
    );
    if let Some(id) = ui.dictate(lines, interrupted)? {
        let mut out = ui.into_output();
        writeln!(out, "{}", id)?;
    }
    Ok(())
}
