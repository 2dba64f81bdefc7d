//! Source sample decoding into canonical `f32` frames in [-1.0, 1.0].

use super::format::{PcmDescriptor, SampleEncoding};
use crate::error::FrameError;

/// Decode one interleaved frame.
///
/// `src` must hold at least `descriptor.block_align` bytes and `out` one slot
/// per source channel. On error `out` is left untouched.
pub fn decode_frame(
    src: &[u8],
    descriptor: &PcmDescriptor,
    out: &mut [f32],
) -> Result<(), FrameError> {
    let convert = sample_reader(descriptor.encoding, descriptor.bits_per_sample)?;
    let width = descriptor.bytes_per_sample();
    for (slot, raw) in out
        .iter_mut()
        .zip(src.chunks_exact(width))
        .take(descriptor.channels as usize)
    {
        *slot = convert(raw);
    }
    Ok(())
}

/// Decode `frames` consecutive frames into `out` (interleaved, source channels).
pub fn decode_block(
    src: &[u8],
    descriptor: &PcmDescriptor,
    frames: usize,
    out: &mut [f32],
) -> Result<(), FrameError> {
    let convert = sample_reader(descriptor.encoding, descriptor.bits_per_sample)?;
    let width = descriptor.bytes_per_sample();
    let samples = frames * descriptor.channels as usize;
    for (slot, raw) in out[..samples]
        .iter_mut()
        .zip(src[..samples * width].chunks_exact(width))
    {
        *slot = convert(raw);
    }
    Ok(())
}

/// Pick the per-sample conversion for a source layout.
fn sample_reader(encoding: SampleEncoding, bits: u16) -> Result<fn(&[u8]) -> f32, FrameError> {
    match (encoding, bits) {
        (SampleEncoding::UnsignedInt, 8) => Ok(read_u8),
        (SampleEncoding::SignedInt, 16) => Ok(read_i16),
        (SampleEncoding::SignedInt, 24) => Ok(read_i24),
        (SampleEncoding::SignedInt, 32) => Ok(read_i32),
        (SampleEncoding::Float, 32) => Ok(read_f32),
        _ => Err(FrameError::Decode { encoding, bits }),
    }
}

#[inline]
fn read_u8(b: &[u8]) -> f32 {
    (b[0] as f32 - 128.0) / 128.0
}

#[inline]
fn read_i16(b: &[u8]) -> f32 {
    i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0
}

#[inline]
fn read_i24(b: &[u8]) -> f32 {
    i24_from_le([b[0], b[1], b[2]]) as f32 / 8_388_608.0
}

#[inline]
fn read_i32(b: &[u8]) -> f32 {
    (i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64 / 2_147_483_648.0) as f32
}

#[inline]
fn read_f32(b: &[u8]) -> f32 {
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Sign-extend three packed little-endian bytes.
#[inline]
pub fn i24_from_le(bytes: [u8; 3]) -> i32 {
    // Place the 24 bits at the top of an i32, then arithmetic-shift back down
    i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8
}
