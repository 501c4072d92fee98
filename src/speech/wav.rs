//! WAV input for dictation from a recording instead of the microphone.

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::audio::{resample_to_16khz, to_mono};

/// Read a WAV file as 16kHz mono samples.
///
/// Supports 8/16/24/32-bit integer and 32-bit float formats.
pub(crate) fn read_wav_16k_mono(path: &Path) -> Result<Vec<f32>> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("WAV file has no channels: {}", path.display());
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read WAV samples")?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read WAV samples")?,
    };

    let mono = to_mono(&samples, spec.channels as usize);
    resample_to_16khz(&mono, spec.sample_rate)
}
