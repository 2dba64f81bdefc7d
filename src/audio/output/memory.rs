//! Capturing device: everything rendered lands in a shared byte buffer.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use super::{pump, AudioOutputDevice};
use crate::audio::format::PcmFormat;
use crate::audio::source::FrameSource;
use crate::error::Error;
use crate::Result;

#[derive(Debug, Default)]
struct CaptureState {
    bytes: Vec<u8>,
    requests: Vec<usize>,
    ended: bool,
}

/// Shared view of what a [`MemoryDevice`] received. Stays valid after the
/// device has been moved onto the playback thread.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    inner: Arc<Mutex<CaptureState>>,
}

impl Capture {
    /// Copy of every byte written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner
            .lock()
            .map(|s| s.bytes.clone())
            .unwrap_or_default()
    }

    /// Frame count of each non-empty request, in order.
    pub fn requests(&self) -> Vec<usize> {
        self.inner
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    /// Whether the device was told the stream ended.
    pub fn ended(&self) -> bool {
        self.inner.lock().map(|s| s.ended).unwrap_or(false)
    }
}

/// Unpaced device that records its output instead of playing it.
pub struct MemoryDevice {
    period_size: usize,
    forced: Option<PcmFormat>,
    capture: Capture,
}

impl MemoryDevice {
    pub fn new(period_size: usize) -> Self {
        Self {
            period_size,
            forced: None,
            capture: Capture::default(),
        }
    }

    /// Always negotiate `format`, like hardware with a fixed mix format.
    pub fn with_format(mut self, format: PcmFormat) -> Self {
        self.forced = Some(format);
        self
    }

    pub fn capture(&self) -> Capture {
        self.capture.clone()
    }
}

impl AudioOutputDevice for MemoryDevice {
    fn name(&self) -> &str {
        "memory"
    }

    fn negotiate_format(&mut self, requested: &PcmFormat) -> Result<PcmFormat> {
        let accepted = self.forced.unwrap_or(*requested);
        log::debug!("Memory device: requested {}, accepted {}", requested, accepted);
        Ok(accepted)
    }

    fn max_frames(&self) -> usize {
        self.period_size
    }

    fn play(&mut self, source: &mut dyn FrameSource, running: &AtomicBool) -> Result<u64> {
        let inner = Arc::clone(&self.capture.inner);
        pump(source, self.period_size, running, |bytes, frames| {
            let mut state = inner
                .lock()
                .map_err(|_| Error::Output("capture buffer poisoned".into()))?;
            state.bytes.extend_from_slice(bytes);
            state.requests.push(frames);
            Ok(())
        })
    }

    fn signal_stream_end(&mut self) -> Result<()> {
        let mut state = self
            .capture
            .inner
            .lock()
            .map_err(|_| Error::Output("capture buffer poisoned".into()))?;
        state.ended = true;
        Ok(())
    }
}
