//! Offline dictation with whisper.cpp.
//!
//! A session captures audio (microphone or WAV file) into a shared buffer.
//! A worker thread transcribes whatever accumulated every
//! `segment_interval_secs` and emits each chunk as one final result, so the
//! cumulative transcript grows while the user speaks.

use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::audio::{resample_to_16khz, WHISPER_SAMPLE_RATE};
use super::microphone::{input_device_present, MicrophoneRecorder};
use super::wav::read_wav_16k_mono;
use crate::domain::traits::{SpeechEngine, TranscriptionSession};
use crate::domain::types::SpeechEvent;

/// Chunks shorter than this wait for more audio unless the session is ending.
const MIN_CHUNK_SECS: f32 = 1.0;

/// Where session audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Microphone,
    WavFile(PathBuf),
}

pub struct WhisperEngine {
    model_path: PathBuf,
    source: AudioSource,
    segment_interval: Duration,
}

impl WhisperEngine {
    pub fn new(model_path: PathBuf, source: AudioSource, segment_interval_secs: u32) -> Self {
        Self {
            model_path,
            source,
            segment_interval: Duration::from_secs(u64::from(segment_interval_secs.max(1))),
        }
    }
}

impl SpeechEngine for WhisperEngine {
    fn name(&self) -> &str {
        "whisper"
    }

    fn is_available(&self) -> bool {
        if !self.model_path.exists() {
            log::debug!("Whisper model missing: {}", self.model_path.display());
            return false;
        }
        match &self.source {
            AudioSource::Microphone => input_device_present(),
            AudioSource::WavFile(path) => path.exists(),
        }
    }

    fn start(&self, language: &str) -> Result<Box<dyn TranscriptionSession>> {
        let (tx, rx) = async_channel::unbounded();

        let (recorder, samples, sample_rate, input_finished) = match &self.source {
            AudioSource::Microphone => {
                let recorder = MicrophoneRecorder::new();
                recorder.start(tx.clone())?;
                let samples = recorder.samples().clone();
                let rate = recorder.sample_rate();
                (Some(recorder), samples, rate, false)
            }
            AudioSource::WavFile(path) => {
                let audio = read_wav_16k_mono(path)?;
                (None, Arc::new(Mutex::new(audio)), WHISPER_SAMPLE_RATE, true)
            }
        };

        let stop_flag = Arc::new(AtomicBool::new(false));
        let job = WorkerJob {
            model_path: self.model_path.clone(),
            language: whisper_language(language),
            samples,
            sample_rate,
            input_finished,
            interval: self.segment_interval,
            stop_flag: stop_flag.clone(),
        };

        let worker = thread::spawn(move || run_worker(job, tx));
        log::info!("Whisper session started ({:?})", self.source);

        Ok(Box::new(WhisperSession {
            events: rx,
            stop_flag,
            recorder,
            worker: Some(worker),
        }))
    }
}

/// Whisper takes bare ISO 639-1 codes ("pt", not "pt-BR"); "auto" detects.
fn whisper_language(language: &str) -> Option<String> {
    let code = language.split(['-', '_']).next().unwrap_or("").trim();
    if code.is_empty() || code.eq_ignore_ascii_case("auto") {
        None
    } else {
        Some(code.to_lowercase())
    }
}

struct WhisperSession {
    events: Receiver<SpeechEvent>,
    stop_flag: Arc<AtomicBool>,
    recorder: Option<MicrophoneRecorder>,
    worker: Option<JoinHandle<()>>,
}

impl TranscriptionSession for WhisperSession {
    fn events(&self) -> &Receiver<SpeechEvent> {
        &self.events
    }

    fn stop(&mut self) {
        // Capture must be fully stopped before the worker takes its last chunk
        if let Some(recorder) = self.recorder.take() {
            recorder.stop();
        }
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Whisper worker panicked");
            }
        }
    }
}

impl Drop for WhisperSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WorkerJob {
    model_path: PathBuf,
    language: Option<String>,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    input_finished: bool,
    interval: Duration,
    stop_flag: Arc<AtomicBool>,
}

fn run_worker(job: WorkerJob, tx: Sender<SpeechEvent>) {
    if let Err(e) = transcribe_until_stopped(&job, &tx) {
        log::error!("Whisper transcription failed: {:#}", e);
        let _ = tx.send_blocking(SpeechEvent::Error(format!("{e:#}")));
    }
    let _ = tx.send_blocking(SpeechEvent::End);
}

fn transcribe_until_stopped(job: &WorkerJob, tx: &Sender<SpeechEvent>) -> Result<()> {
    let stt = WhisperStt::new(&job.model_path)?;

    let rate = job.sample_rate.max(1) as usize;
    let min_chunk = (MIN_CHUNK_SECS * rate as f32) as usize;
    let max_chunk = (job.interval.as_secs_f32() * rate as f32) as usize;
    let mut consumed = 0;
    let mut index = 0;

    loop {
        if !job.input_finished {
            wait_for_interval(&job.stop_flag, job.interval);
        }
        let stopping = job.input_finished || job.stop_flag.load(Ordering::SeqCst);
        let available = job.samples.lock().len();

        while consumed < available {
            let end = if stopping {
                (consumed + max_chunk.max(min_chunk)).min(available)
            } else {
                available
            };
            if !stopping && end - consumed < min_chunk {
                break;
            }

            let chunk = job.samples.lock()[consumed..end].to_vec();
            consumed = end;

            let audio = resample_to_16khz(&chunk, job.sample_rate)?;
            let text = stt.transcribe(&audio, job.language.as_deref())?;
            if text.is_empty() {
                continue;
            }

            let text = if index == 0 { text } else { format!(" {text}") };
            log::debug!("Whisper result {} ({} chars)", index, text.len());
            if tx
                .send_blocking(SpeechEvent::Result {
                    index,
                    text,
                    is_final: true,
                })
                .is_err()
            {
                // Receiver gone: nobody listens any more
                return Ok(());
            }
            index += 1;
        }

        if stopping {
            return Ok(());
        }
    }
}

fn wait_for_interval(stop_flag: &AtomicBool, interval: Duration) {
    let started = Instant::now();
    while started.elapsed() < interval && !stop_flag.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }
}

struct WhisperStt {
    ctx: WhisperContext,
}

impl WhisperStt {
    fn new(model_path: &Path) -> Result<Self> {
        let path = model_path
            .to_str()
            .context("Whisper model path is not valid UTF-8")?;
        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .with_context(|| format!("Failed to load Whisper model {}", model_path.display()))?;

        Ok(Self { ctx })
    }

    fn transcribe(&self, samples: &[f32], language: Option<&str>) -> Result<String> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        params.set_language(language);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_translate(false);

        let mut state = self.ctx.create_state()?;
        state.full(params, samples)?;

        let num_segments = state.full_n_segments()?;
        let mut text = String::new();

        for i in 0..num_segments {
            if let Ok(segment) = state.full_get_segment_text(i) {
                text.push_str(&segment);
                text.push(' ');
            }
        }

        Ok(text.trim().to_string())
    }
}
