//! audio - WAV parsing, format conversion, and device playback
//!
//! Parser → {descriptor, payload} → Feeder; on every device request the
//! feeder decodes, remaps and encodes exactly the frames available.

pub mod container;
pub mod decode;
pub mod encode;
pub mod feeder;
pub mod format;
pub mod output;
pub mod playback;
pub mod remap;
pub mod source;

pub use container::{open_file, open_stream, read_stream, PcmStream};
pub use feeder::{CursorObserver, Feeder, FeederState};
pub use format::{PcmDescriptor, PcmFormat, SampleEncoding};
pub use output::{open_device, AudioOutputDevice, MemoryDevice, NullDevice};
pub use playback::{Playback, PlaybackReport};
pub use source::FrameSource;
