use anyhow::{Context, Result};
use async_channel::Receiver;
use parking_lot::Mutex;
use rubato::{FftFixedIn, Resampler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Average interleaved frames down to one channel.
pub(crate) fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample mono audio to 16kHz using rubato.
pub(crate) fn resample_to_16khz(samples: &[f32], input_rate: u32) -> Result<Vec<f32>> {
    if input_rate == WHISPER_SAMPLE_RATE || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(
        input_rate as usize,
        WHISPER_SAMPLE_RATE as usize,
        1024, // chunk size
        2,    // sub chunks
        1,    // channels
    )
    .context("Failed to create resampler")?;

    let frames_needed = resampler.input_frames_next();
    let mut output = Vec::with_capacity(
        samples.len() * WHISPER_SAMPLE_RATE as usize / input_rate as usize + frames_needed,
    );

    for chunk in samples.chunks(frames_needed) {
        if chunk.len() == frames_needed {
            let resampled = resampler
                .process(&[chunk.to_vec()], None)
                .context("Resampling failed")?;
            output.extend_from_slice(&resampled[0]);
        } else {
            // Pad the tail and keep only its proportional share of output
            let mut padded = chunk.to_vec();
            padded.resize(frames_needed, 0.0);
            let resampled = resampler
                .process(&[padded], None)
                .context("Resampling final chunk failed")?;
            let keep = chunk.len() * resampled[0].len() / frames_needed;
            output.extend_from_slice(&resampled[0][..keep.min(resampled[0].len())]);
        }
    }

    Ok(output)
}

/// Capture state shared with the capture thread.
pub(crate) struct RecordingCore {
    pub(crate) samples: Arc<Mutex<Vec<f32>>>,
    is_recording: Arc<AtomicBool>,
    completion_rx: Mutex<Option<Receiver<()>>>,
}

/// Handles passed to a spawned capture thread so it can append samples,
/// check the recording flag and signal completion.
pub(crate) struct RecordingHandles {
    pub(crate) samples: Arc<Mutex<Vec<f32>>>,
    pub(crate) is_recording: Arc<AtomicBool>,
    pub(crate) completion_tx: async_channel::Sender<()>,
}

impl RecordingCore {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
            is_recording: Arc::new(AtomicBool::new(false)),
            completion_rx: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// Clear samples, set the recording flag and hand out thread handles.
    pub fn prepare_recording(&self) -> RecordingHandles {
        self.samples.lock().clear();
        self.is_recording.store(true, Ordering::SeqCst);

        let (completion_tx, completion_rx) = async_channel::bounded::<()>(1);
        *self.completion_rx.lock() = Some(completion_rx);

        RecordingHandles {
            samples: self.samples.clone(),
            is_recording: self.is_recording.clone(),
            completion_tx,
        }
    }

    /// Clear the recording flag and wait for the capture thread to finish.
    pub fn stop(&self) {
        self.is_recording.store(false, Ordering::SeqCst);
        if let Some(rx) = self.completion_rx.lock().take() {
            // Closed without a message when the thread died early
            let _ = rx.recv_blocking();
        }
    }
}

impl Drop for RecordingCore {
    fn drop(&mut self) {
        // Capture threads poll this flag; never leave them spinning
        self.is_recording.store(false, Ordering::SeqCst);
    }
}
