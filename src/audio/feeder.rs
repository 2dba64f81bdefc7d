//! Pull-driven stream feeder.
//!
//! Owns the encoded payload and a cursor into it. Every pull converts exactly
//! the whole frames available (decode, remap, encode) into the caller's
//! buffer using scratch allocated once at construction.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::decode;
use super::encode;
use super::format::{PcmDescriptor, PcmFormat};
use super::remap;
use super::source::FrameSource;
use crate::error::Error;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeederState {
    /// Whole frames remain past the cursor
    Streaming,
    /// Cursor reached the end of the payload; terminal
    Drained,
}

/// Read-only view of a feeder's cursor for completion polling.
#[derive(Debug, Clone)]
pub struct CursorObserver {
    offset: Arc<AtomicUsize>,
    len: usize,
}

impl CursorObserver {
    /// Current byte offset into the encoded payload.
    pub fn position(&self) -> usize {
        self.offset.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_drained(&self) -> bool {
        self.position() >= self.len
    }

    /// Fraction of the payload consumed, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.len == 0 {
            return 1.0;
        }
        self.position() as f64 / self.len as f64
    }
}

/// Per-pull working storage plus the once-only warning bookkeeping.
struct Scratch {
    canonical_in: Vec<f32>,
    canonical_out: Vec<f32>,
    silenced_decode: u64,
    silenced_encode: u64,
}

impl Scratch {
    fn new(max_frames: usize, in_channels: usize, out_channels: usize) -> Self {
        Self {
            canonical_in: vec![0.0; max_frames * in_channels],
            canonical_out: vec![0.0; max_frames * out_channels],
            silenced_decode: 0,
            silenced_encode: 0,
        }
    }

    /// Convert `frames` frames of `src` into `dst`. `frames` never exceeds
    /// the capacity the scratch was sized for.
    fn render(
        &mut self,
        descriptor: &PcmDescriptor,
        destination: &PcmFormat,
        src: &[u8],
        frames: usize,
        dst: &mut [u8],
    ) {
        let in_ch = descriptor.channels as usize;
        let out_ch = destination.channels as usize;
        let canonical_in = &mut self.canonical_in[..frames * in_ch];
        let canonical_out = &mut self.canonical_out[..frames * out_ch];

        if let Err(e) = decode::decode_block(src, descriptor, frames, canonical_in) {
            if self.silenced_decode == 0 {
                log::warn!("{}, substituting silence", e);
            }
            self.silenced_decode += frames as u64;
            canonical_in.fill(0.0);
        }

        remap::remap_block(canonical_in, in_ch, canonical_out, out_ch, frames);

        if let Err(e) = encode::encode_block(canonical_out, destination, frames, dst) {
            if self.silenced_encode == 0 {
                log::warn!("{}, writing silence", e);
            }
            self.silenced_encode += frames as u64;
            dst.fill(0);
        }
    }
}

/// Single-use renderer of one parsed stream into one destination format.
pub struct Feeder {
    descriptor: PcmDescriptor,
    destination: PcmFormat,
    data: Box<[u8]>,
    cursor: Arc<AtomicUsize>,
    max_frames: usize,
    scratch: Scratch,
    frames_rendered: u64,
    drain_reported: bool,
}

impl Feeder {
    /// Build a feeder over `data`.
    ///
    /// `max_frames` is the largest request the device issues per pull. Larger
    /// requests still work; they are rendered in `max_frames`-sized chunks.
    /// A descriptor whose frame geometry does not add up is rejected here, so
    /// `pull` never slices past a frame.
    pub fn new(
        descriptor: PcmDescriptor,
        data: Vec<u8>,
        destination: PcmFormat,
        max_frames: usize,
    ) -> Result<Self> {
        descriptor.validate()?;
        if max_frames == 0 {
            return Err(Error::Output("device period must be at least one frame".into()));
        }
        if destination.channels == 0 {
            return Err(Error::FormatUnsupported(
                "destination channel count is 0".into(),
            ));
        }
        if destination.sample_rate != descriptor.sample_rate {
            // No resampling: the device clocks the source rate as-is.
            log::warn!(
                "Device rate {}Hz differs from stream rate {}Hz, playback speed will be off",
                destination.sample_rate,
                descriptor.sample_rate
            );
        }

        log::debug!(
            "Feeder: {} -> {}, {} bytes, scratch for {} frames",
            descriptor.format(),
            destination,
            data.len(),
            max_frames
        );

        let scratch = Scratch::new(
            max_frames,
            descriptor.channels as usize,
            destination.channels as usize,
        );

        Ok(Self {
            descriptor,
            destination,
            data: data.into_boxed_slice(),
            cursor: Arc::new(AtomicUsize::new(0)),
            max_frames,
            scratch,
            frames_rendered: 0,
            drain_reported: false,
        })
    }

    pub fn descriptor(&self) -> &PcmDescriptor {
        &self.descriptor
    }

    pub fn destination(&self) -> &PcmFormat {
        &self.destination
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Handle for polling completion from another thread.
    pub fn observer(&self) -> CursorObserver {
        CursorObserver {
            offset: Arc::clone(&self.cursor),
            len: self.data.len(),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn state(&self) -> FeederState {
        if self.position() >= self.data.len() {
            FeederState::Drained
        } else {
            FeederState::Streaming
        }
    }

    /// Whole source frames still ahead of the cursor.
    pub fn frames_remaining(&self) -> usize {
        (self.data.len() - self.position()) / self.descriptor.block_align as usize
    }

    /// Destination bytes needed for `frames` frames.
    pub fn bytes_for(&self, frames: usize) -> usize {
        frames * self.destination.block_align()
    }

    /// Render up to `frame_count` frames into `dest`; returns the frames written.
    ///
    /// Zero for a non-zero `frame_count` means end of stream, and once drained
    /// every further pull returns zero. A request for zero frames writes
    /// nothing and leaves the cursor and state untouched.
    pub fn pull(&mut self, dest: &mut [u8], frame_count: usize) -> Result<usize> {
        let src_align = self.descriptor.block_align as usize;
        let dst_align = self.destination.block_align();
        let offset = self.position();
        let len = self.data.len();

        // A dangling partial frame is dropped, never padded.
        let frames = frame_count.min((len - offset) / src_align);
        if frames == 0 {
            if offset < len && frame_count > 0 {
                self.cursor.store(len, Ordering::Release);
            }
            if self.position() >= len {
                self.report_drained();
            }
            return Ok(0);
        }

        let needed = frames * dst_align;
        if dest.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                actual: dest.len(),
            });
        }

        let mut done = 0;
        while done < frames {
            let chunk = (frames - done).min(self.max_frames);
            let src_start = offset + done * src_align;
            let src = &self.data[src_start..src_start + chunk * src_align];
            let dst = &mut dest[done * dst_align..(done + chunk) * dst_align];
            self.scratch
                .render(&self.descriptor, &self.destination, src, chunk, dst);
            done += chunk;
        }

        let mut next = offset + frames * src_align;
        if len - next < src_align {
            next = len;
        }
        self.cursor.store(next, Ordering::Release);
        self.frames_rendered += frames as u64;

        if next == len {
            self.report_drained();
        }
        Ok(frames)
    }

    fn report_drained(&mut self) {
        if self.drain_reported {
            return;
        }
        self.drain_reported = true;

        log::info!("Stream drained after {} frames", self.frames_rendered);
        if self.scratch.silenced_decode > 0 {
            log::warn!(
                "{} frames were silenced because the source could not be decoded",
                self.scratch.silenced_decode
            );
        }
        if self.scratch.silenced_encode > 0 {
            log::warn!(
                "{} frames were silenced because the destination could not be encoded",
                self.scratch.silenced_encode
            );
        }
    }
}

impl FrameSource for Feeder {
    fn format(&self) -> &PcmFormat {
        &self.destination
    }

    fn pull(&mut self, dest: &mut [u8], frames: usize) -> Result<usize> {
        Feeder::pull(self, dest, frames)
    }
}
