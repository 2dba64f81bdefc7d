//! # wavplay
//!
//! Streams a RIFF/WAVE PCM file to an output device, converting every frame
//! into whatever sample format and channel count the device negotiated.
//!
//! ```no_run
//! use wavplay::audio::{self, MemoryDevice, PcmFormat, Playback};
//!
//! # fn main() -> wavplay::Result<()> {
//! let bytes = std::fs::read("sample.wav")?;
//! let stream = audio::open_stream(&bytes)?;
//! let mut device = MemoryDevice::new(1024);
//! let requested = PcmFormat::float32(stream.descriptor().sample_rate, 2);
//! let feeder = audio::playback::prepare(stream, &mut device, &requested)?;
//! let report = Playback::start(feeder, Box::new(device))?.wait()?;
//! assert!(report.completed);
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;

pub use audio::{open_stream, Feeder, PcmDescriptor, PcmFormat, PcmStream};
pub use config::Config;
pub use error::{Error, FrameError};

/// Result type for wavplay operations
pub type Result<T> = std::result::Result<T, error::Error>;
