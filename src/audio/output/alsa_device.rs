//! ALSA PCM playback device.

use std::sync::atomic::AtomicBool;

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result as AnyResult};

use super::{pump, AudioOutputDevice};
use crate::audio::format::{PcmFormat, SampleEncoding};
use crate::audio::source::FrameSource;
use crate::error::Error;
use crate::Result;

/// Consecutive failed writes tolerated before the rest of a period is dropped.
const MAX_RECOVERY_RETRIES: u32 = 3;

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct AlsaParams {
    /// Actual sample layout after negotiation
    pub format: PcmFormat,
    /// Period size in frames (one frame = channels × sample width)
    pub period_size: usize,
}

/// Playback on a named ALSA PCM (e.g. "default", "plughw:0,0").
pub struct AlsaDevice {
    device: String,
    period_size: usize,
    pcm: Option<PCM>,
    params: Option<AlsaParams>,
}

impl AlsaDevice {
    /// `period_size` of 0 lets ALSA decide.
    pub fn new(device: &str, period_size: usize) -> Self {
        Self {
            device: device.to_string(),
            period_size,
            pcm: None,
            params: None,
        }
    }

    pub fn params(&self) -> Option<&AlsaParams> {
        self.params.as_ref()
    }
}

impl AudioOutputDevice for AlsaDevice {
    fn name(&self) -> &str {
        &self.device
    }

    fn negotiate_format(&mut self, requested: &PcmFormat) -> Result<PcmFormat> {
        let period = (self.period_size > 0).then_some(self.period_size);
        let (pcm, params) = open_playback(&self.device, requested, period)
            .map_err(|e| Error::Output(format!("{:#}", e)))?;
        let accepted = params.format;
        self.pcm = Some(pcm);
        self.params = Some(params);
        Ok(accepted)
    }

    fn max_frames(&self) -> usize {
        self.params
            .as_ref()
            .map(|p| p.period_size)
            .unwrap_or(self.period_size)
    }

    fn play(&mut self, source: &mut dyn FrameSource, running: &AtomicBool) -> Result<u64> {
        let period = self.max_frames();
        let pcm = self
            .pcm
            .as_ref()
            .ok_or_else(|| Error::Output("ALSA device used before negotiation".into()))?;
        let io = pcm.io_bytes();
        let block_align = source.format().block_align();

        pump(source, period, running, |bytes, total_frames| {
            // Retry short writes and XRUNs without losing frames
            let mut frames_written = 0;
            let mut retry_count = 0u32;

            while frames_written < total_frames {
                match io.writei(&bytes[frames_written * block_align..]) {
                    Ok(n) => {
                        frames_written += n;
                        retry_count = 0;
                    }
                    Err(e) => {
                        log::warn!("ALSA XRUN or error: {}, recovering...", e);
                        retry_count += 1;

                        if let Err(e2) = pcm.prepare() {
                            return Err(Error::Output(format!(
                                "failed to recover PCM playback: {}",
                                e2
                            )));
                        }

                        // Hardware keeps falling behind: drop the rest of this period
                        if retry_count >= MAX_RECOVERY_RETRIES {
                            log::error!(
                                "Max recovery retries ({}) reached. Dropping {} unwritten frames.",
                                retry_count,
                                total_frames - frames_written
                            );
                            break;
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn signal_stream_end(&mut self) -> Result<()> {
        if let Some(pcm) = self.pcm.as_ref() {
            pcm.drain()
                .map_err(|e| Error::Output(format!("failed to drain PCM: {}", e)))?;
        }
        Ok(())
    }
}

fn alsa_format(format: &PcmFormat) -> Option<Format> {
    match (format.encoding, format.bits_per_sample) {
        (SampleEncoding::UnsignedInt, 8) => Some(Format::U8),
        (SampleEncoding::SignedInt, 8) => Some(Format::S8),
        (SampleEncoding::SignedInt, 16) => Some(Format::S16LE),
        (SampleEncoding::SignedInt, 24) => Some(Format::S243LE),
        (SampleEncoding::SignedInt, 32) => Some(Format::S32LE),
        (SampleEncoding::Float, 32) => Some(Format::FloatLE),
        _ => None,
    }
}

fn sample_layout(format: Format) -> Option<(SampleEncoding, u16)> {
    match format {
        Format::U8 => Some((SampleEncoding::UnsignedInt, 8)),
        Format::S8 => Some((SampleEncoding::SignedInt, 8)),
        Format::S16LE => Some((SampleEncoding::SignedInt, 16)),
        Format::S243LE => Some((SampleEncoding::SignedInt, 24)),
        Format::S32LE => Some((SampleEncoding::SignedInt, 32)),
        Format::FloatLE => Some((SampleEncoding::Float, 32)),
        _ => None,
    }
}

/// Open a PCM device for playback, preferring the requested sample format and
/// falling back to float then 16-bit if the hardware refuses it.
fn open_playback(
    device: &str,
    requested: &PcmFormat,
    period_size: Option<usize>,
) -> AnyResult<(PCM, AlsaParams)> {
    let pcm = PCM::new(device, Direction::Playback, false)
        .with_context(|| format!("Failed to open PCM device '{}' for Playback", device))?;

    {
        let hwp = HwParams::any(&pcm).with_context(|| "Failed to initialize HwParams")?;
        hwp.set_access(Access::RWInterleaved)?;

        let candidates = [
            alsa_format(requested),
            Some(Format::FloatLE),
            Some(Format::S16LE),
        ];
        let mut chosen = None;
        for fmt in candidates.into_iter().flatten() {
            match hwp.set_format(fmt) {
                Ok(()) => {
                    chosen = Some(fmt);
                    break;
                }
                Err(e) => log::debug!("ALSA refused {:?}: {}", fmt, e),
            }
        }
        chosen.with_context(|| format!("'{}' accepts none of the supported sample formats", device))?;

        hwp.set_channels(requested.channels as u32)?;
        hwp.set_rate_near(requested.sample_rate, ValueOr::Nearest)?;
        if let Some(ps) = period_size {
            hwp.set_period_size_near(ps as alsa::pcm::Frames, ValueOr::Nearest)?;
        }
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let (rate, channels, period_size, format) = {
        let hwp = pcm.hw_params_current()?;
        (
            hwp.get_rate()?,
            hwp.get_channels()?,
            hwp.get_period_size()? as usize,
            hwp.get_format()?,
        )
    };
    let (encoding, bits_per_sample) =
        sample_layout(format).with_context(|| format!("unexpected ALSA format {:?}", format))?;

    let params = AlsaParams {
        format: PcmFormat {
            sample_rate: rate,
            channels: channels as u16,
            bits_per_sample,
            encoding,
        },
        period_size,
    };

    log::info!(
        "ALSA Playback: device={}, format={}, period_size={}",
        device,
        params.format,
        period_size,
    );

    Ok((pcm, params))
}
