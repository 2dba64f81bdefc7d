//! Runtime settings: built-in defaults, then an optional TOML file, then
//! `WAVPLAY_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::{PcmFormat, SampleEncoding};
use crate::Result;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Output device: "null", "memory", or an ALSA PCM name
    pub playback_device: String,
    /// Channel count requested from the device
    pub output_channels: u16,
    /// Bits per sample requested from the device
    pub output_bits: u16,
    /// Sample encoding requested from the device
    pub output_encoding: SampleEncoding,
    /// Frames per device request (0 = let the device decide)
    pub period_size: usize,
    /// How often the main task checks for completion
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback_device: (if cfg!(feature = "alsa") { "default" } else { "null" }).to_string(),
            output_channels: 2,
            output_bits: 32,
            output_encoding: SampleEncoding::Float,
            period_size: 1024,
            poll_interval_ms: 100,
        }
    }
}

impl Config {
    /// Layer the sources. A missing `path` is an error; no path means defaults
    /// plus environment only.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("WAVPLAY").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Format to ask the device for; the sample rate always follows the source.
    pub fn requested_format(&self, sample_rate: u32) -> PcmFormat {
        PcmFormat {
            sample_rate,
            channels: self.output_channels,
            bits_per_sample: self.output_bits,
            encoding: self.output_encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_request_float_stereo() {
        let config = Config::default();
        assert_eq!(
            config.requested_format(44100),
            PcmFormat::float32(44100, 2)
        );
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "playback_device = \"memory\"\noutput_bits = 16\noutput_encoding = \"signed_int\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.playback_device, "memory");
        assert_eq!(config.requested_format(8000), PcmFormat::s16(8000, 2));
        assert_eq!(config.period_size, 1024);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/wavplay.toml"))).is_err());
    }
}
