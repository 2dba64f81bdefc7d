//! Canonical frames to destination bytes, with clipping.

use super::format::{PcmFormat, SampleEncoding};
use crate::error::FrameError;

/// Encode one canonical frame into `out` (at least `destination.block_align()` bytes).
///
/// On error `out` is left untouched; the caller decides what silence means.
pub fn encode_frame(
    frame: &[f32],
    destination: &PcmFormat,
    out: &mut [u8],
) -> Result<(), FrameError> {
    let write = sample_writer(destination.encoding, destination.bits_per_sample)?;
    let width = destination.bytes_per_sample();
    for (&value, raw) in frame.iter().zip(out.chunks_exact_mut(width)) {
        write(value, raw);
    }
    Ok(())
}

/// Encode `frames` interleaved canonical frames into `out`.
pub fn encode_block(
    input: &[f32],
    destination: &PcmFormat,
    frames: usize,
    out: &mut [u8],
) -> Result<(), FrameError> {
    let write = sample_writer(destination.encoding, destination.bits_per_sample)?;
    let width = destination.bytes_per_sample();
    let samples = frames * destination.channels as usize;
    for (&value, raw) in input[..samples]
        .iter()
        .zip(out[..samples * width].chunks_exact_mut(width))
    {
        write(value, raw);
    }
    Ok(())
}

/// Whether `encode_frame` can produce this layout at all.
pub fn is_supported(format: &PcmFormat) -> bool {
    sample_writer(format.encoding, format.bits_per_sample).is_ok()
}

fn sample_writer(encoding: SampleEncoding, bits: u16) -> Result<fn(f32, &mut [u8]), FrameError> {
    match (encoding, bits) {
        (SampleEncoding::UnsignedInt, 8) => Ok(write_u8),
        (SampleEncoding::SignedInt, 8) => Ok(write_i8),
        (SampleEncoding::SignedInt, 16) => Ok(write_i16),
        (SampleEncoding::SignedInt, 24) => Ok(write_i24),
        (SampleEncoding::SignedInt, 32) => Ok(write_i32),
        (SampleEncoding::Float, 32) => Ok(write_f32),
        _ => Err(FrameError::Encode { encoding, bits }),
    }
}

/// Clip to [-1, 1] and scale to a signed integer of `bits` width (truncating).
#[inline]
fn scale(value: f32, bits: u32) -> i32 {
    let max = ((1i64 << (bits - 1)) - 1) as f64;
    (value.clamp(-1.0, 1.0) as f64 * max) as i32
}

#[inline]
fn write_u8(value: f32, out: &mut [u8]) {
    out[0] = (scale(value, 8) + 128) as u8;
}

#[inline]
fn write_i8(value: f32, out: &mut [u8]) {
    out[0] = scale(value, 8) as i8 as u8;
}

#[inline]
fn write_i16(value: f32, out: &mut [u8]) {
    out.copy_from_slice(&(scale(value, 16) as i16).to_le_bytes());
}

#[inline]
fn write_i24(value: f32, out: &mut [u8]) {
    let b = scale(value, 24).to_le_bytes();
    out.copy_from_slice(&b[..3]);
}

#[inline]
fn write_i32(value: f32, out: &mut [u8]) {
    out.copy_from_slice(&scale(value, 32).to_le_bytes());
}

#[inline]
fn write_f32(value: f32, out: &mut [u8]) {
    out.copy_from_slice(&value.to_le_bytes());
}
