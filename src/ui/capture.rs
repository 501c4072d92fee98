//! Terminal front end of the capture flow.
//!
//! Input lines are read on a helper thread and delivered over a channel so
//! the loop can keep draining transcription events while the user is silent.

use anyhow::Result;
use async_channel::{Receiver, TryRecvError};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::capture::{CaptureError, CaptureState, NoteCapture};
use crate::domain::traits::{NoteRepository, Notifier, SpeechEngine};
use crate::speech::{RecordingSlot, SpeechError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub const ONBOARDING_PROMPT: &str = "Type your note, or :record to dictate it. \
Commands: :type :record :stop :save :clear :quit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Type,
    Record,
    Stop,
    Save,
    Clear,
    Quit,
    Text(String),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            ":type" => Self::Type,
            ":record" => Self::Record,
            ":stop" => Self::Stop,
            ":save" => Self::Save,
            ":clear" => Self::Clear,
            ":quit" | ":q" => Self::Quit,
            _ if trimmed.starts_with(':') && !trimmed.contains(char::is_whitespace) => {
                Self::Unknown(trimmed.to_string())
            }
            _ => Self::Text(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Read `input` line by line on a background thread.
///
/// The channel closes at end of input.
pub fn spawn_line_reader<R: BufRead + Send + 'static>(input: R) -> Receiver<String> {
    let (tx, rx) = async_channel::unbounded();
    thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.send_blocking(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Capture surface bound to a store and a speech engine.
pub struct CaptureLoop<'a, W: Write> {
    capture: NoteCapture,
    store: &'a mut dyn NoteRepository,
    engine: &'a dyn SpeechEngine,
    slot: &'a RecordingSlot,
    language: &'a str,
    out: W,
}

impl<'a, W: Write> CaptureLoop<'a, W> {
    pub fn new(
        store: &'a mut dyn NoteRepository,
        engine: &'a dyn SpeechEngine,
        slot: &'a RecordingSlot,
        language: &'a str,
        notifier: Arc<dyn Notifier>,
        out: W,
    ) -> Self {
        Self {
            capture: NoteCapture::new(notifier),
            store,
            engine,
            slot,
            language,
            out,
        }
    }

    pub fn capture(&self) -> &NoteCapture {
        &self.capture
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the interactive surface until `:quit`, end of input or, outside a
    /// recording, an interrupt. An interrupt during a recording stops it.
    pub fn run(&mut self, lines: &Receiver<String>, interrupted: &AtomicBool) -> Result<()> {
        self.capture.open();
        writeln!(self.out, "{ONBOARDING_PROMPT}")?;

        loop {
            if interrupted.swap(false, Ordering::SeqCst) {
                if self.capture.is_recording() {
                    self.stop()?;
                } else {
                    self.quit()?;
                    return Ok(());
                }
            }

            if self.capture.is_recording() {
                self.poll()?;
            }

            match lines.try_recv() {
                Ok(line) => {
                    if self.handle_line(&line)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Err(TryRecvError::Empty) => thread::sleep(POLL_INTERVAL),
                Err(TryRecvError::Closed) => {
                    self.quit()?;
                    return Ok(());
                }
            }
        }
    }

    /// Apply one input line.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        match Command::parse(line) {
            Command::Type => {
                if self.capture.state() == CaptureState::Onboarding {
                    let result = self.capture.start_typing();
                    self.report(result)?;
                }
            }
            Command::Record => self.start_recording()?,
            Command::Stop => self.stop()?,
            Command::Save => self.save()?,
            Command::Clear => {
                if self.capture.state() == CaptureState::Typing {
                    let result = self.capture.edit("");
                    self.report(result)?;
                    writeln!(self.out, "{ONBOARDING_PROMPT}")?;
                }
            }
            Command::Quit => {
                self.quit()?;
                return Ok(Flow::Quit);
            }
            Command::Text(text) => self.append(&text)?,
            Command::Unknown(command) => writeln!(self.out, "Unknown command: {command}")?,
        }
        Ok(Flow::Continue)
    }

    /// Print a rejected transition instead of failing the loop; storage
    /// errors still propagate.
    fn report(&mut self, result: Result<(), CaptureError>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(CaptureError::Store(e)) => Err(e),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                Ok(())
            }
        }
    }

    fn append(&mut self, text: &str) -> Result<()> {
        if self.capture.is_recording() {
            writeln!(self.out, "Recording in progress; :stop before typing.")?;
            return Ok(());
        }
        if self.capture.state() == CaptureState::Onboarding {
            let result = self.capture.start_typing();
            self.report(result)?;
        }

        let draft = if self.capture.draft().is_empty() {
            text.to_string()
        } else {
            format!("{}\n{}", self.capture.draft(), text)
        };
        let result = self.capture.edit(draft);
        self.report(result)
    }

    fn start_recording(&mut self) -> Result<()> {
        let (engine, slot, language) = (self.engine, self.slot, self.language);
        match self.capture.start_recording(engine, slot, language) {
            Ok(()) => {
                writeln!(self.out, "Recording... :stop (or Ctrl+C) to finish.")?;
                Ok(())
            }
            // Already surfaced through the notifier
            Err(CaptureError::Speech(SpeechError::Unavailable)) => Ok(()),
            Err(e) => self.report(Err(e)),
        }
    }

    fn poll(&mut self) -> Result<()> {
        let outcome = self.capture.poll_transcript();
        if outcome.updates > 0 {
            writeln!(self.out, "» {}", self.capture.draft())?;
        }
        if outcome.finished {
            writeln!(self.out, "Recording finished.")?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        match self.capture.stop_recording() {
            Ok(outcome) => {
                if outcome.updates > 0 {
                    writeln!(self.out, "» {}", self.capture.draft())?;
                }
                writeln!(self.out, "Recording stopped. :save to keep the note.")?;
                Ok(())
            }
            Err(e) => self.report(Err(e)),
        }
    }

    fn save(&mut self) -> Result<()> {
        match self.capture.save(&mut *self.store) {
            Ok(Some(note)) => {
                writeln!(self.out, "Saved {}", note.id)?;
                writeln!(self.out, "{ONBOARDING_PROMPT}")?;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => self.report(Err(e)),
        }
    }

    fn quit(&mut self) -> Result<()> {
        if !self.capture.draft().is_empty() {
            writeln!(self.out, "Draft discarded.")?;
        }
        self.capture.abandon();
        Ok(())
    }

    /// Record one note by voice and save it.
    ///
    /// Recording ends when the engine finishes, on Enter or on interrupt.
    /// Returns the id of the saved note, if anything was transcribed.
    pub fn dictate(
        &mut self,
        lines: &Receiver<String>,
        interrupted: &AtomicBool,
    ) -> Result<Option<String>> {
        let (engine, slot, language) = (self.engine, self.slot, self.language);
        match self.capture.start_recording(engine, slot, language) {
            Ok(()) => {}
            Err(CaptureError::Speech(SpeechError::Unavailable)) => return Ok(None),
            Err(CaptureError::Store(e)) => return Err(e),
            Err(e) => return Err(e.into()),
        }
        writeln!(self.out, "Recording... press Enter (or Ctrl+C) to finish.")?;

        let mut input_open = true;
        while self.capture.is_recording() {
            if interrupted.swap(false, Ordering::SeqCst) {
                self.stop()?;
                break;
            }
            if input_open {
                match lines.try_recv() {
                    Ok(_) => {
                        self.stop()?;
                        break;
                    }
                    Err(TryRecvError::Closed) => input_open = false,
                    Err(TryRecvError::Empty) => {}
                }
            }
            self.poll()?;
            thread::sleep(POLL_INTERVAL);
        }

        match self.capture.save(&mut *self.store) {
            Ok(Some(note)) => Ok(Some(note.id)),
            Ok(None) => {
                writeln!(self.out, "Nothing was transcribed.")?;
                Ok(None)
            }
            Err(CaptureError::Store(e)) => Err(e),
            Err(e) => Err(e.into()),
        }
    }
}
