//! Hand-built RIFF/WAVE images for parser and pipeline tests.

#![allow(dead_code)]

use std::path::Path;

pub const FORMAT_PCM: u16 = 1;
pub const FORMAT_FLOAT: u16 = 3;

/// Raw `fmt ` fields; `consistent` fills byte rate and block align correctly.
#[derive(Clone, Copy, Debug)]
pub struct Fmt {
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl Fmt {
    pub fn consistent(format_code: u16, channels: u16, sample_rate: u32, bits: u16) -> Self {
        let block_align = channels * (bits / 8);
        Self {
            format_code,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: bits,
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut p = Vec::with_capacity(16);
        p.extend_from_slice(&self.format_code.to_le_bytes());
        p.extend_from_slice(&self.channels.to_le_bytes());
        p.extend_from_slice(&self.sample_rate.to_le_bytes());
        p.extend_from_slice(&self.byte_rate.to_le_bytes());
        p.extend_from_slice(&self.block_align.to_le_bytes());
        p.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        p
    }
}

/// Builds a WAV image chunk by chunk; `finish` writes the RIFF header.
#[derive(Default)]
pub struct WavBuilder {
    body: Vec<u8>,
}

impl WavBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk with a correct size field and RIFF padding.
    pub fn chunk(self, tag: &[u8; 4], payload: &[u8]) -> Self {
        self.chunk_with_size(tag, payload.len() as u32, payload, true)
    }

    /// Append a chunk whose size field may lie about its payload.
    pub fn chunk_with_size(mut self, tag: &[u8; 4], size: u32, payload: &[u8], pad: bool) -> Self {
        self.body.extend_from_slice(tag);
        self.body.extend_from_slice(&size.to_le_bytes());
        self.body.extend_from_slice(payload);
        if pad && payload.len() % 2 == 1 {
            self.body.push(0);
        }
        self
    }

    pub fn fmt(self, fmt: &Fmt) -> Self {
        self.chunk(b"fmt ", &fmt.payload())
    }

    pub fn data(self, data: &[u8]) -> Self {
        self.chunk(b"data", data)
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 12);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(self.body.len() as u32 + 4).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&self.body);
        out
    }
}

/// Minimal WAV image: one `fmt ` and one `data` chunk.
pub fn wav(fmt: &Fmt, data: &[u8]) -> Vec<u8> {
    WavBuilder::new().fmt(fmt).data(data).finish()
}

pub fn s16_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

pub fn f32_values(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Write interleaved 16-bit samples as a WAV file with hound.
pub fn write_s16_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}
