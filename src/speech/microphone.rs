use anyhow::{Context, Result};
use async_channel::Sender;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::audio::{to_mono, RecordingCore};
use crate::domain::types::SpeechEvent;

/// Whether the default host exposes an input device.
pub(crate) fn input_device_present() -> bool {
    cpal::default_host().default_input_device().is_some()
}

/// Default-microphone capture into a shared mono buffer.
///
/// Samples are stored at the device rate; `sample_rate()` reports it so the
/// transcription worker can resample chunk by chunk.
pub(crate) struct MicrophoneRecorder {
    core: RecordingCore,
    sample_rate: Arc<AtomicU32>,
}

impl MicrophoneRecorder {
    pub fn new() -> Self {
        Self {
            core: RecordingCore::new(),
            sample_rate: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn samples(&self) -> &Arc<Mutex<Vec<f32>>> {
        &self.core.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::SeqCst)
    }

    /// Open the default input device and start capturing.
    ///
    /// Stream failures after this returns are reported on `events` as
    /// `SpeechEvent::Error`.
    pub fn start(&self, events: Sender<SpeechEvent>) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No microphone found")?;

        let config = device
            .default_input_config()
            .context("Failed to query microphone configuration")?;
        self.sample_rate
            .store(config.sample_rate().0, Ordering::SeqCst);
        let channels = config.channels() as usize;

        let handles = self.core.prepare_recording();
        let samples = handles.samples;
        let is_recording = handles.is_recording.clone();
        let is_recording_for_loop = handles.is_recording;
        let completion_tx = handles.completion_tx;

        thread::spawn(move || {
            let stream_events = events.clone();
            let stream = device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::SeqCst) {
                        return;
                    }
                    samples.lock().extend(to_mono(data, channels));
                },
                move |err| {
                    log::error!("Microphone stream error: {}", err);
                    let _ = stream_events.try_send(SpeechEvent::Error(err.to_string()));
                },
                None,
            );

            let started = stream
                .map_err(anyhow::Error::from)
                .and_then(|s| s.play().map(|_| s).map_err(anyhow::Error::from));

            match started {
                Ok(_stream) => {
                    while is_recording_for_loop.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(50));
                    }
                }
                Err(e) => {
                    log::error!("Failed to start microphone stream: {:#}", e);
                    let _ = events.send_blocking(SpeechEvent::Error(format!("{e:#}")));
                }
            }

            // Signal completion
            let _ = completion_tx.send_blocking(());
        });

        Ok(())
    }

    /// Stop capturing; returns once the capture thread has released the device.
    pub fn stop(&self) {
        self.core.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_initial_state() {
        let recorder = MicrophoneRecorder::new();
        assert!(recorder.samples().lock().is_empty());
        assert_eq!(recorder.sample_rate(), 0);
    }

    #[test]
    fn test_stop_without_start_returns() {
        let recorder = MicrophoneRecorder::new();
        recorder.stop();
    }
}
