//! RIFF/WAVE container parsing.
//!
//! Scans the chunk list for `fmt ` and `data`, validates the format
//! description before touching the sample payload, then copies the payload
//! once into an owned buffer.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::Duration;

use super::feeder::Feeder;
use super::format::{PcmDescriptor, PcmFormat, SampleEncoding};
use crate::error::Error;
use crate::Result;

const FORMAT_PCM: u16 = 0x0001;
const FORMAT_IEEE_FLOAT: u16 = 0x0003;

/// Minimal `fmt ` payload: code, channels, rate, byte rate, align, bits.
const FMT_MIN_LEN: u32 = 16;

pub const MIN_SAMPLE_RATE: u32 = 8000;
pub const MAX_SAMPLE_RATE: u32 = 96000;

/// A parsed stream: validated descriptor plus the raw encoded samples.
#[derive(Debug, Clone)]
pub struct PcmStream {
    descriptor: PcmDescriptor,
    data: Vec<u8>,
}

impl PcmStream {
    pub fn descriptor(&self) -> &PcmDescriptor {
        &self.descriptor
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Whole frames in the payload; a trailing partial frame is not counted.
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.descriptor.block_align as usize
    }

    pub fn duration(&self) -> Duration {
        self.descriptor.duration(self.data.len())
    }

    /// Hand the payload to a feeder rendering into `destination`.
    ///
    /// `max_frames` is the largest request the device will issue per pull;
    /// the feeder sizes its scratch from it once.
    pub fn into_feeder(self, destination: PcmFormat, max_frames: usize) -> Result<Feeder> {
        Feeder::new(self.descriptor, self.data, destination, max_frames)
    }

    pub fn into_parts(self) -> (PcmDescriptor, Vec<u8>) {
        (self.descriptor, self.data)
    }
}

/// Upfront reservation for a `data` chunk when the input length is unknown;
/// beyond this the buffer grows as bytes actually arrive.
const UNSIZED_RESERVE_LIMIT: usize = 1 << 20;

/// Parse an in-memory WAV image.
pub fn open_stream(bytes: &[u8]) -> Result<PcmStream> {
    let (descriptor, data) = parse_input(Input::with_len(bytes, bytes.len() as u64))?;
    Ok(PcmStream { descriptor, data })
}

/// Parse a WAV file from disk.
pub fn open_file<P: AsRef<Path>>(path: P) -> Result<PcmStream> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    let (descriptor, data) = parse_input(Input::with_len(BufReader::new(file), len))?;
    Ok(PcmStream { descriptor, data })
}

/// Parse from any reader. The input length is unknown, so a `data` chunk
/// that promises more than the reader delivers is an I/O error.
pub fn read_stream<R: Read>(reader: R) -> Result<PcmStream> {
    let (descriptor, data) = parse(reader)?;
    Ok(PcmStream { descriptor, data })
}

/// Parse a RIFF/WAVE byte source into a descriptor and its sample payload.
pub fn parse<R: Read>(reader: R) -> Result<(PcmDescriptor, Vec<u8>)> {
    parse_input(Input::new(reader))
}

/// A reader that counts what it hands out, and knows its total length when
/// the caller does.
struct Input<R> {
    reader: R,
    consumed: u64,
    total: Option<u64>,
}

impl<R: Read> Input<R> {
    fn with_len(reader: R, total: u64) -> Self {
        Self {
            reader,
            consumed: 0,
            total: Some(total),
        }
    }

    fn new(reader: R) -> Self {
        Self {
            reader,
            consumed: 0,
            total: None,
        }
    }

    fn remaining(&self) -> Option<u64> {
        self.total.map(|total| total.saturating_sub(self.consumed))
    }
}

impl<R: Read> Read for Input<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

fn parse_input<R: Read>(mut reader: Input<R>) -> Result<(PcmDescriptor, Vec<u8>)> {
    let mut header = [0u8; 12];
    if fill(&mut reader, &mut header)? < header.len() {
        return Err(Error::Container("truncated RIFF header".into()));
    }
    if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        return Err(Error::Container("not a RIFF/WAVE stream".into()));
    }
    log::debug!("RIFF chunk: size={}, format=WAVE", le_u32(&header[4..8]));

    let mut descriptor: Option<PcmDescriptor> = None;

    while let Some((tag, size)) = read_chunk_header(&mut reader)? {
        log::debug!("Chunk: id={}, size={}", tag_name(&tag), size);

        match &tag {
            b"fmt " => {
                if descriptor.is_some() {
                    return Err(Error::Container("duplicate fmt chunk".into()));
                }
                if size < FMT_MIN_LEN {
                    return Err(Error::Container(format!(
                        "fmt chunk is {} bytes, need at least {}",
                        size, FMT_MIN_LEN
                    )));
                }
                let mut payload = [0u8; FMT_MIN_LEN as usize];
                if fill(&mut reader, &mut payload)? < payload.len() {
                    return Err(Error::Container("truncated fmt chunk".into()));
                }
                descriptor = Some(validate(&FmtFields::from_bytes(&payload))?);

                // Extension bytes (cbSize and friends) are not interpreted.
                skip(&mut reader, padded(size) - FMT_MIN_LEN as u64, &tag)?;
            }
            b"data" => {
                let Some(descriptor) = descriptor else {
                    return Err(Error::Container("data chunk precedes fmt chunk".into()));
                };
                if let Some(available) = reader.remaining() {
                    if size as u64 > available {
                        return Err(Error::Container(format!(
                            "data chunk declares {} bytes but only {} are available",
                            size, available
                        )));
                    }
                }
                let reserve = match reader.total {
                    Some(_) => size as usize,
                    None => (size as usize).min(UNSIZED_RESERVE_LIMIT),
                };
                let data = read_payload(&mut reader, size, reserve)?;
                return Ok((descriptor, data));
            }
            _ => skip(&mut reader, padded(size), &tag)?,
        }
    }

    match descriptor {
        None => Err(Error::Container("fmt chunk not found".into())),
        Some(_) => Err(Error::Container("data chunk not found".into())),
    }
}

/// Raw fields of the 16-byte `fmt ` payload.
#[derive(Debug, Clone, Copy)]
struct FmtFields {
    format_code: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FmtFields {
    fn from_bytes(b: &[u8; FMT_MIN_LEN as usize]) -> Self {
        Self {
            format_code: le_u16(&b[0..2]),
            channels: le_u16(&b[2..4]),
            sample_rate: le_u32(&b[4..8]),
            byte_rate: le_u32(&b[8..12]),
            block_align: le_u16(&b[12..14]),
            bits_per_sample: le_u16(&b[14..16]),
        }
    }
}

fn validate(f: &FmtFields) -> Result<PcmDescriptor> {
    let bits = f.bits_per_sample;

    let encoding = match f.format_code {
        FORMAT_PCM if bits == 8 => SampleEncoding::UnsignedInt,
        FORMAT_PCM => SampleEncoding::SignedInt,
        FORMAT_IEEE_FLOAT => {
            if bits != 32 {
                return Err(Error::FormatUnsupported(format!(
                    "IEEE float samples must be 32-bit, got {}",
                    bits
                )));
            }
            SampleEncoding::Float
        }
        other => {
            return Err(Error::FormatUnsupported(format!(
                "format code {:#06x} is neither integer PCM nor IEEE float",
                other
            )));
        }
    };

    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&f.sample_rate) {
        return Err(Error::FormatUnsupported(format!(
            "sample rate {} Hz is outside {}-{} Hz",
            f.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
        )));
    }

    let descriptor = PcmDescriptor {
        sample_rate: f.sample_rate,
        channels: f.channels,
        bits_per_sample: bits,
        encoding,
        byte_rate: f.byte_rate,
        block_align: f.block_align,
    };
    descriptor.validate()?;
    Ok(descriptor)
}

/// Next chunk header, or `None` on a clean end of input.
fn read_chunk_header<R: Read>(reader: &mut R) -> Result<Option<([u8; 4], u32)>> {
    let mut buf = [0u8; 8];
    match fill(reader, &mut buf)? {
        0 => Ok(None),
        8 => {
            let tag = [buf[0], buf[1], buf[2], buf[3]];
            Ok(Some((tag, le_u32(&buf[4..8]))))
        }
        n => Err(Error::Container(format!(
            "truncated chunk header ({} of 8 bytes)",
            n
        ))),
    }
}

/// Copy `size` payload bytes, reserving `reserve` of them before reading.
fn read_payload<R: Read>(reader: &mut R, size: u32, reserve: usize) -> Result<Vec<u8>> {
    let size = size as usize;
    let mut data = Vec::new();
    data.try_reserve_exact(reserve).map_err(|e| {
        io::Error::new(
            io::ErrorKind::OutOfMemory,
            format!("cannot allocate {} bytes for sample data: {}", reserve, e),
        )
    })?;

    reader.take(size as u64).read_to_end(&mut data)?;
    if data.len() != size {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "failed to read audio data ({} bytes read, expected {})",
                data.len(),
                size
            ),
        )));
    }
    Ok(data)
}

fn skip<R: Read>(reader: &mut R, len: u64, tag: &[u8; 4]) -> Result<()> {
    let skipped = io::copy(&mut reader.take(len), &mut io::sink())?;
    if skipped < len {
        return Err(Error::Container(format!(
            "chunk {} declares {} more bytes but input ends after {}",
            tag_name(tag),
            len,
            skipped
        )));
    }
    Ok(())
}

/// Read until `buf` is full or the input ends; returns the bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// RIFF chunks are word aligned: odd sizes carry one pad byte.
#[inline]
fn padded(size: u32) -> u64 {
    size as u64 + (size as u64 & 1)
}

#[inline]
fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

#[inline]
fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn tag_name(tag: &[u8; 4]) -> String {
    tag.iter()
        .map(|&c| if c.is_ascii_graphic() || c == b' ' { c as char } else { '?' })
        .collect()
}
