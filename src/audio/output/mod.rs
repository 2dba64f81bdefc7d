//! Output device capability and its implementations.
//!
//! The conversion pipeline never names a device type; devices only see a
//! [`FrameSource`] and the negotiated [`PcmFormat`].

#[cfg(feature = "alsa")]
mod alsa_device;
mod memory;
mod null;

#[cfg(feature = "alsa")]
pub use alsa_device::{AlsaDevice, AlsaParams};
pub use memory::{Capture, MemoryDevice};
pub use null::NullDevice;

use std::sync::atomic::{AtomicBool, Ordering};

use super::format::PcmFormat;
use super::source::FrameSource;
use crate::error::Error;
use crate::Result;

/// Frames per request for devices without a hardware period.
pub const DEFAULT_PERIOD_SIZE: usize = 1024;

/// A platform audio sink that pulls frames on its own schedule.
pub trait AudioOutputDevice: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Agree on a sample layout. The device may return something other than
    /// `requested`; the caller must render whatever comes back.
    fn negotiate_format(&mut self, requested: &PcmFormat) -> Result<PcmFormat>;

    /// Largest frame count a single request may ask for. Valid after negotiation.
    fn max_frames(&self) -> usize;

    /// Pull from `source` until it is exhausted or `running` goes false.
    /// Returns the frames handed to the hardware.
    fn play(&mut self, source: &mut dyn FrameSource, running: &AtomicBool) -> Result<u64>;

    /// The source is exhausted; let queued audio finish.
    fn signal_stream_end(&mut self) -> Result<()>;
}

/// Open a device by name: `null`, `memory`, or (with the `alsa` feature) any
/// ALSA PCM name such as `default` or `plughw:0,0`.
///
/// A `period_size` of 0 lets the device decide; software devices pick
/// [`DEFAULT_PERIOD_SIZE`].
pub fn open_device(name: &str, period_size: usize) -> Result<Box<dyn AudioOutputDevice>> {
    let soft_period = if period_size == 0 { DEFAULT_PERIOD_SIZE } else { period_size };
    match name {
        "null" => Ok(Box::new(NullDevice::new(soft_period))),
        "memory" => Ok(Box::new(MemoryDevice::new(soft_period))),
        #[cfg(feature = "alsa")]
        other => Ok(Box::new(AlsaDevice::new(other, period_size))),
        #[cfg(not(feature = "alsa"))]
        other => Err(Error::Output(format!(
            "unknown device '{}' (built without ALSA support)",
            other
        ))),
    }
}

/// The request loop shared by every device: one buffer sized for a full
/// period is allocated up front, then each request is handed to `write`.
pub(crate) fn pump<W>(
    source: &mut dyn FrameSource,
    period: usize,
    running: &AtomicBool,
    mut write: W,
) -> Result<u64>
where
    W: FnMut(&[u8], usize) -> Result<()>,
{
    if period == 0 {
        return Err(Error::Output("device period is 0 frames".into()));
    }
    let block_align = source.format().block_align();
    let mut buffer = vec![0u8; period * block_align];
    let mut total = 0u64;

    while running.load(Ordering::Relaxed) {
        let frames = source.pull(&mut buffer, period)?;
        if frames == 0 {
            break;
        }
        write(&buffer[..frames * block_align], frames)?;
        total += frames as u64;
    }
    Ok(total)
}
