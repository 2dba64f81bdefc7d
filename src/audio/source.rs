//! Pull interface between an output device and whatever renders its frames.

use super::format::PcmFormat;
use crate::Result;

/// A source of interleaved frames already encoded in the device's format.
///
/// Devices call `pull` from their real-time thread, one request at a time.
/// Implementations must not block or allocate inside `pull`.
pub trait FrameSource: Send {
    /// Layout of the bytes `pull` writes.
    fn format(&self) -> &PcmFormat;

    /// Fill `dest` with up to `frames` frames and return how many were written.
    ///
    /// Zero in answer to a non-zero request means the stream is exhausted and
    /// callers should stop pulling. Asking for zero frames is a no-op that
    /// returns zero without ending the stream.
    fn pull(&mut self, dest: &mut [u8], frames: usize) -> Result<usize>;
}
