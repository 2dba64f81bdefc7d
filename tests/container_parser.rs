mod common;

use std::io::{self, Read};

use common::{wav, Fmt, WavBuilder, FORMAT_FLOAT, FORMAT_PCM};
use wavplay::audio::{self, SampleEncoding};
use wavplay::Error;

#[test]
fn test_parse_hound_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    common::write_s16_wav(&path, 2, 44100, &[0, 1, -1, 32767, -32768, 100]);

    let stream = audio::open_file(&path).unwrap();
    let d = stream.descriptor();

    assert_eq!(d.sample_rate, 44100);
    assert_eq!(d.channels, 2);
    assert_eq!(d.bits_per_sample, 16);
    assert_eq!(d.encoding, SampleEncoding::SignedInt);
    assert_eq!(d.block_align, 4);
    assert_eq!(d.byte_rate, 176_400);
    assert_eq!(stream.data_len(), 12);
    assert_eq!(stream.frame_count(), 3);
    assert_eq!(&stream.data()[6..8], &32767i16.to_le_bytes());
}

#[test]
fn test_unknown_chunks_are_skipped() {
    let fmt = Fmt::consistent(FORMAT_PCM, 1, 8000, 16);
    let bytes = WavBuilder::new()
        .chunk(b"JUNK", &[0xAA; 5]) // odd size, padded
        .fmt(&fmt)
        .chunk(b"LIST", b"INFOISFT\x04\x00\x00\x00test")
        .data(&[1, 0, 2, 0])
        .finish();

    let stream = audio::open_stream(&bytes).unwrap();
    assert_eq!(stream.data(), &[1, 0, 2, 0]);
}

#[test]
fn test_fmt_extension_bytes_are_skipped() {
    let fmt = Fmt::consistent(FORMAT_FLOAT, 2, 48000, 32);
    let mut payload = fmt.payload();
    payload.extend_from_slice(&[0, 0]); // cbSize = 0

    let bytes = WavBuilder::new()
        .chunk(b"fmt ", &payload)
        .data(&[0; 8])
        .finish();

    let stream = audio::open_stream(&bytes).unwrap();
    assert_eq!(stream.descriptor().encoding, SampleEncoding::Float);
    assert_eq!(stream.data_len(), 8);
}

#[test]
fn test_data_chunk_is_sized_exactly() {
    let fmt = Fmt::consistent(FORMAT_PCM, 1, 8000, 8);
    let bytes = WavBuilder::new()
        .fmt(&fmt)
        .data(&[128, 129, 130])
        .chunk(b"id3 ", &[0; 10])
        .finish();

    let stream = audio::open_stream(&bytes).unwrap();
    assert_eq!(stream.data(), &[128, 129, 130]);
    assert_eq!(stream.descriptor().encoding, SampleEncoding::UnsignedInt);
}

#[test]
fn test_bad_magic() {
    let mut bytes = wav(&Fmt::consistent(FORMAT_PCM, 1, 8000, 16), &[0; 4]);
    bytes[8..12].copy_from_slice(b"AVI ");
    assert!(matches!(audio::open_stream(&bytes), Err(Error::Container(_))));

    let mut bytes = wav(&Fmt::consistent(FORMAT_PCM, 1, 8000, 16), &[0; 4]);
    bytes[0..4].copy_from_slice(b"RIFX");
    assert!(matches!(audio::open_stream(&bytes), Err(Error::Container(_))));
}

#[test]
fn test_truncated_header() {
    assert!(matches!(audio::open_stream(b"RIFF\0\0"), Err(Error::Container(_))));
    assert!(matches!(audio::open_stream(&[]), Err(Error::Container(_))));
}

#[test]
fn test_missing_chunks() {
    let only_fmt = WavBuilder::new()
        .fmt(&Fmt::consistent(FORMAT_PCM, 1, 8000, 16))
        .finish();
    assert!(matches!(audio::open_stream(&only_fmt), Err(Error::Container(_))));

    let nothing = WavBuilder::new().chunk(b"LIST", &[0; 4]).finish();
    assert!(matches!(audio::open_stream(&nothing), Err(Error::Container(_))));
}

#[test]
fn test_data_before_fmt() {
    let bytes = WavBuilder::new()
        .data(&[0; 4])
        .fmt(&Fmt::consistent(FORMAT_PCM, 1, 8000, 16))
        .finish();
    assert!(matches!(audio::open_stream(&bytes), Err(Error::Container(_))));
}

#[test]
fn test_skipped_chunk_overruns_input() {
    let bytes = WavBuilder::new()
        .chunk_with_size(b"JUNK", 1000, &[0; 10], false)
        .finish();
    assert!(matches!(audio::open_stream(&bytes), Err(Error::Container(_))));
}

#[test]
fn test_short_fmt_chunk() {
    let bytes = WavBuilder::new().chunk(b"fmt ", &[1, 0, 1, 0]).finish();
    assert!(matches!(audio::open_stream(&bytes), Err(Error::Container(_))));
}

#[test]
fn test_short_data_is_io_error() {
    let bytes = WavBuilder::new()
        .fmt(&Fmt::consistent(FORMAT_PCM, 1, 8000, 16))
        .chunk_with_size(b"data", 100, &[0; 10], false)
        .finish();

    // A plain reader cannot say how much is left, so the short read surfaces
    match audio::read_stream(&bytes[..]) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
        other => panic!("expected I/O error, got {:?}", other),
    }
}

#[test]
fn test_data_size_beyond_image_is_container_error() {
    let bytes = WavBuilder::new()
        .fmt(&Fmt::consistent(FORMAT_PCM, 1, 8000, 16))
        .chunk_with_size(b"data", u32::MAX, &[], false)
        .finish();
    assert_eq!(bytes.len(), 44);

    match audio::open_stream(&bytes) {
        Err(Error::Container(msg)) => assert!(msg.contains("available"), "{}", msg),
        other => panic!("expected container error, got {:?}", other),
    }
}

#[test]
fn test_truncated_file_is_container_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cut.wav");
    let bytes = WavBuilder::new()
        .fmt(&Fmt::consistent(FORMAT_PCM, 2, 8000, 16))
        .chunk_with_size(b"data", 4000, &[0; 400], false)
        .finish();
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(audio::open_file(&path), Err(Error::Container(_))));
}

#[test]
fn test_unsupported_format_codes() {
    for code in [2u16, 6, 7, 0xFFFE] {
        let bytes = wav(&Fmt::consistent(code, 1, 8000, 16), &[0; 4]);
        assert!(matches!(
            audio::open_stream(&bytes),
            Err(Error::FormatUnsupported(_))
        ));
    }
}

#[test]
fn test_float_must_be_32bit() {
    let bytes = wav(&Fmt::consistent(FORMAT_FLOAT, 1, 8000, 64), &[0; 8]);
    assert!(matches!(
        audio::open_stream(&bytes),
        Err(Error::FormatUnsupported(_))
    ));
}

#[test]
fn test_zero_channels() {
    let bytes = wav(&Fmt::consistent(FORMAT_PCM, 0, 8000, 16), &[]);
    assert!(matches!(
        audio::open_stream(&bytes),
        Err(Error::FormatUnsupported(_))
    ));
}

#[test]
fn test_sample_rate_out_of_range() {
    for rate in [4000, 192_000] {
        let bytes = wav(&Fmt::consistent(FORMAT_PCM, 2, rate, 16), &[0; 4]);
        assert!(matches!(
            audio::open_stream(&bytes),
            Err(Error::FormatUnsupported(_))
        ));
    }
}

/// Counts bytes handed out so tests can see how far the parser read.
struct CountingReader<'a> {
    inner: &'a [u8],
    consumed: usize,
}

impl Read for CountingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n;
        Ok(n)
    }
}

#[test]
fn test_byte_rate_mismatch_rejected_before_data() {
    let mut fmt = Fmt::consistent(FORMAT_PCM, 2, 44100, 16);
    fmt.byte_rate += 1;
    let bytes = wav(&fmt, &[0; 4000]);

    let mut reader = CountingReader {
        inner: &bytes,
        consumed: 0,
    };
    let result = audio::read_stream(&mut reader);

    assert!(matches!(result, Err(Error::FormatUnsupported(_))));
    // RIFF header + fmt header + fmt payload, nothing from the data chunk
    assert_eq!(reader.consumed, 12 + 8 + 16);
}

#[test]
fn test_block_align_mismatch() {
    let mut fmt = Fmt::consistent(FORMAT_PCM, 2, 44100, 16);
    fmt.block_align = 2;
    fmt.byte_rate = 88200;
    let bytes = wav(&fmt, &[0; 4]);
    assert!(matches!(
        audio::open_stream(&bytes),
        Err(Error::FormatUnsupported(_))
    ));
}
