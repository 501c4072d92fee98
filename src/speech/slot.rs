use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::SpeechError;

/// Owned handle to the recording capability.
///
/// At most one `RecordingLease` exists per slot at a time. The application
/// creates one slot and hands it to every capture surface, so a second
/// surface trying to record while another records fails fast.
#[derive(Clone, Default)]
pub struct RecordingSlot {
    busy: Arc<AtomicBool>,
}

impl RecordingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for one recording span.
    pub fn acquire(&self) -> Result<RecordingLease, SpeechError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SpeechError::SessionBusy)?;

        Ok(RecordingLease {
            busy: self.busy.clone(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of an active recording span; releases the slot when dropped.
pub struct RecordingLease {
    busy: Arc<AtomicBool>,
}

impl Drop for RecordingLease {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
