//! Error types shared by the parser, the conversion pipeline and the devices.

use thiserror::Error;

use crate::audio::SampleEncoding;

/// Fatal errors surfaced to the caller as a typed result.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad magic, truncated or missing chunk, size overrunning the input
    #[error("container error: {0}")]
    Container(String),

    /// The stream parsed but describes something we refuse to play
    #[error("unsupported format: {0}")]
    FormatUnsupported(String),

    /// Short read of the sample payload or an underlying read failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio output device failure
    #[error("audio output error: {0}")]
    Output(String),

    /// Caller handed `pull` a destination that cannot hold the frames
    #[error("destination buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Per-frame conversion failure. Never fatal: the feeder substitutes silence.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("cannot decode {encoding:?} source samples of {bits} bits")]
    Decode { encoding: SampleEncoding, bits: u16 },

    #[error("cannot encode {encoding:?} destination samples of {bits} bits")]
    Encode { encoding: SampleEncoding, bits: u16 },
}
