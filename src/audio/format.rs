//! PCM format descriptors for the source stream and the output device.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// How one sample is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    UnsignedInt,
    SignedInt,
    Float,
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleEncoding::UnsignedInt => f.write_str("unsigned"),
            SampleEncoding::SignedInt => f.write_str("signed"),
            SampleEncoding::Float => f.write_str("float"),
        }
    }
}

/// Sample layout negotiated with (or requested from) an output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub encoding: SampleEncoding,
}

impl PcmFormat {
    /// Interleaved 32-bit float, the layout most hosts prefer.
    pub fn float32(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: 32,
            encoding: SampleEncoding::Float,
        }
    }

    /// Interleaved 16-bit signed integer.
    pub fn s16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: 16,
            encoding: SampleEncoding::SignedInt,
        }
    }

    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Bytes occupied by one frame across all channels.
    #[inline]
    pub fn block_align(&self) -> usize {
        self.channels as usize * self.bytes_per_sample()
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz {}ch {}-bit {}",
            self.sample_rate, self.channels, self.bits_per_sample, self.encoding
        )
    }
}

/// Validated description of the source stream, as read from the `fmt ` chunk.
///
/// Every descriptor the container parser returns satisfies
/// `byte_rate == sample_rate * block_align` and
/// `block_align == channels * bytes_per_sample`. Hand-built descriptors are
/// checked with [`PcmDescriptor::validate`] before a feeder accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmDescriptor {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub encoding: SampleEncoding,
    pub byte_rate: u32,
    pub block_align: u16,
}

impl PcmDescriptor {
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Check the frame geometry: a non-empty sample size that is a whole
    /// number of bytes, at least one channel, and `block_align`/`byte_rate`
    /// consistent with them.
    pub fn validate(&self) -> Result<()> {
        let bits = self.bits_per_sample;
        if bits == 0 || bits % 8 != 0 {
            return Err(Error::FormatUnsupported(format!(
                "bits per sample must be a positive multiple of 8, got {}",
                bits
            )));
        }
        if self.channels == 0 {
            return Err(Error::FormatUnsupported("channel count is 0".into()));
        }

        let expected_align = self.channels as u64 * (bits as u64 / 8);
        if self.block_align as u64 != expected_align {
            return Err(Error::FormatUnsupported(format!(
                "block align {} does not match {} channels x {} bytes",
                self.block_align,
                self.channels,
                bits / 8
            )));
        }
        let expected_rate = self.sample_rate as u64 * expected_align;
        if self.byte_rate as u64 != expected_rate {
            return Err(Error::FormatUnsupported(format!(
                "byte rate {} does not match {} Hz x {} bytes per frame",
                self.byte_rate, self.sample_rate, expected_align
            )));
        }
        Ok(())
    }

    /// The descriptor viewed as a plain sample layout.
    pub fn format(&self) -> PcmFormat {
        PcmFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
            encoding: self.encoding,
        }
    }

    /// Playback length of `data_len` payload bytes.
    pub fn duration(&self, data_len: usize) -> Duration {
        if self.byte_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(data_len as f64 / self.byte_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_align_counts_all_channels() {
        assert_eq!(PcmFormat::float32(48000, 2).block_align(), 8);
        assert_eq!(PcmFormat::s16(44100, 1).block_align(), 2);
    }

    #[test]
    fn duration_from_byte_rate() {
        let desc = PcmDescriptor {
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 16,
            encoding: SampleEncoding::SignedInt,
            byte_rate: 16000,
            block_align: 2,
        };
        assert_eq!(desc.duration(32000), Duration::from_secs(2));
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inconsistent_geometry() {
        let good = PcmDescriptor {
            sample_rate: 8000,
            channels: 2,
            bits_per_sample: 16,
            encoding: SampleEncoding::SignedInt,
            byte_rate: 32000,
            block_align: 4,
        };
        let broken = [
            PcmDescriptor { block_align: 0, ..good },
            PcmDescriptor { block_align: 2, ..good },
            PcmDescriptor { byte_rate: 16000, ..good },
            PcmDescriptor { channels: 0, block_align: 0, byte_rate: 0, ..good },
            PcmDescriptor { bits_per_sample: 12, ..good },
        ];
        for desc in broken {
            assert!(
                matches!(desc.validate(), Err(Error::FormatUnsupported(_))),
                "{:?} passed validation",
                desc
            );
        }
    }
}
