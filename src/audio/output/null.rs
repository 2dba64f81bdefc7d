//! Discarding device that keeps real-time pace.

use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

use super::{pump, AudioOutputDevice};
use crate::audio::format::PcmFormat;
use crate::audio::source::FrameSource;
use crate::error::Error;
use crate::Result;

/// Accepts any format, throws the audio away, and sleeps as long as the
/// audio would take to play.
pub struct NullDevice {
    period_size: usize,
    forced: Option<PcmFormat>,
    paced: bool,
}

impl NullDevice {
    pub fn new(period_size: usize) -> Self {
        Self {
            period_size,
            forced: None,
            paced: true,
        }
    }

    /// Always negotiate `format`, whatever is requested.
    pub fn with_format(mut self, format: PcmFormat) -> Self {
        self.forced = Some(format);
        self
    }

    /// Skip the sleeping; pull as fast as the source renders.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }
}

impl AudioOutputDevice for NullDevice {
    fn name(&self) -> &str {
        "null"
    }

    fn negotiate_format(&mut self, requested: &PcmFormat) -> Result<PcmFormat> {
        let accepted = self.forced.unwrap_or(*requested);
        if accepted.channels == 0 || accepted.sample_rate == 0 {
            return Err(Error::Output(format!("null device cannot play {}", accepted)));
        }
        log::info!("Null device: requested {}, accepted {}", requested, accepted);
        Ok(accepted)
    }

    fn max_frames(&self) -> usize {
        self.period_size
    }

    fn play(&mut self, source: &mut dyn FrameSource, running: &AtomicBool) -> Result<u64> {
        let rate = source.format().sample_rate.max(1) as f64;
        let paced = self.paced;
        let started = Instant::now();
        let mut clock = Duration::ZERO;

        pump(source, self.period_size, running, |_bytes, frames| {
            if paced {
                // Sleep until the hardware clock would have consumed this period
                clock += Duration::from_secs_f64(frames as f64 / rate);
                if let Some(ahead) = clock.checked_sub(started.elapsed()) {
                    thread::sleep(ahead);
                }
            }
            Ok(())
        })
    }

    fn signal_stream_end(&mut self) -> Result<()> {
        log::debug!("Null device: stream end");
        Ok(())
    }
}
