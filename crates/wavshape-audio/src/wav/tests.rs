//! Tests for the streaming WAV reader and writer.

use std::io::Cursor;

use pretty_assertions::assert_eq;

use super::chunk::{ChunkId, ChunkRecord};
use super::codec::SampleDepth;
use super::format::{FormatDescriptor, WAVE_FORMAT_EXTENSIBLE};
use super::reader::{ReaderState, WavStreamReader};
use super::writer::WavStreamWriter;
use crate::error::{FormatErrorKind, StateErrorKind, WavError};

// =========================================================================
// Helpers
// =========================================================================

fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(id);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn riff(form: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
    let body: usize = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((4 + body) as u32).to_le_bytes());
    out.extend_from_slice(form);
    for c in chunks {
        out.extend_from_slice(c);
    }
    out
}

fn fmt_payload(format_code: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * bits.div_ceil(8);
    let mut out = Vec::new();
    out.extend_from_slice(&format_code.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&rate.wrapping_mul(u32::from(block_align)).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out
}

fn pcm16_data(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn write_to_vec(format: FormatDescriptor, left: &[f32], right: Option<&[f32]>) -> Vec<u8> {
    let mut writer = WavStreamWriter::new(Cursor::new(Vec::new()), format).unwrap();
    writer.write_block(left, right).unwrap();
    writer.finish().unwrap().into_inner()
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn format_kind(result: Result<WavStreamReader<Cursor<Vec<u8>>>, WavError>) -> FormatErrorKind {
    result.unwrap_err().format_kind().expect("format error")
}

// =========================================================================
// Writer layout tests
// =========================================================================

#[test]
fn test_writer_header_layout() {
    let bytes = write_to_vec(
        FormatDescriptor::mono(44100, SampleDepth::Pcm16),
        &[0.0; 10],
        None,
    );

    assert_eq!(bytes.len(), 44 + 20);
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(u32_at(&bytes, 4), 36 + 20);
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(&bytes[12..16], b"fmt ");
    assert_eq!(u32_at(&bytes, 16), 16);
    assert_eq!(&bytes[36..40], b"data");
    assert_eq!(u32_at(&bytes, 40), 20);
}

#[test]
fn test_writer_pads_odd_data() {
    let bytes = write_to_vec(
        FormatDescriptor::mono(8000, SampleDepth::Pcm24),
        &[0.5],
        None,
    );

    assert_eq!(bytes.len(), 44 + 4);
    assert_eq!(u32_at(&bytes, 40), 3);
    assert_eq!(u32_at(&bytes, 4), 36 + 4);
    assert_eq!(bytes[47], 0);
}

#[test]
fn test_writer_close_is_idempotent() {
    let mut writer = WavStreamWriter::new(
        Cursor::new(Vec::new()),
        FormatDescriptor::mono(44100, SampleDepth::Pcm16),
    )
    .unwrap();
    writer.write_block(&[0.1, 0.2], None).unwrap();
    writer.close().unwrap();
    writer.close().unwrap();
    assert!(writer.is_closed());

    let err = writer.write_block(&[0.3], None).unwrap_err();
    assert_eq!(err.state_kind(), Some(StateErrorKind::Closed));
    assert_eq!(writer.written_frames(), 2);
}

#[test]
fn test_writer_drop_patches_sizes() {
    let mut buf = Vec::new();
    {
        let mut writer = WavStreamWriter::new(
            Cursor::new(&mut buf),
            FormatDescriptor::stereo(22050, SampleDepth::Pcm16),
        )
        .unwrap();
        writer
            .write_block(&[0.25; 4], Some(&[-0.25; 4][..]))
            .unwrap();
    }

    assert_eq!(u32_at(&buf, 40), 16);
    assert_eq!(u32_at(&buf, 4), 36 + 16);
}

#[test]
fn test_writer_channel_rules() {
    let mut mono = WavStreamWriter::new(
        Cursor::new(Vec::new()),
        FormatDescriptor::mono(44100, SampleDepth::Pcm16),
    )
    .unwrap();
    mono.write_block(&[0.5; 3], Some(&[0.9; 3][..])).unwrap();
    let bytes = mono.finish().unwrap().into_inner();
    assert_eq!(u32_at(&bytes, 40), 6);

    let mut stereo = WavStreamWriter::new(
        Cursor::new(Vec::new()),
        FormatDescriptor::stereo(44100, SampleDepth::Pcm16),
    )
    .unwrap();
    assert!(matches!(
        stereo.write_block(&[0.5; 3], None),
        Err(WavError::MissingChannelData)
    ));
    assert!(matches!(
        stereo.write_block(&[0.5; 3], Some(&[0.5; 2][..])),
        Err(WavError::ChannelLengthMismatch { left: 3, right: 2 })
    ));
}

#[test]
fn test_writer_rejects_unsupported_formats() {
    let err = WavStreamWriter::new(
        Cursor::new(Vec::new()),
        FormatDescriptor::pcm(3, 44100, SampleDepth::Pcm16),
    )
    .unwrap_err();
    assert_eq!(
        err.format_kind(),
        Some(FormatErrorKind::UnsupportedChannels(3))
    );

    let mut format = FormatDescriptor::mono(44100, SampleDepth::Pcm16);
    format.bits_per_sample = 8;
    let err = WavStreamWriter::new(Cursor::new(Vec::new()), format).unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::UnsupportedDepth(8)));
}

#[test]
fn test_huge_sample_rate_is_an_error_not_an_overflow() {
    let rate = 0x8000_0000;
    let bytes = riff(
        b"WAVE",
        &[
            chunk(b"fmt ", &fmt_payload(1, 2, rate, 16)),
            chunk(b"data", &pcm16_data(&[0; 8])),
        ],
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();
    let format = *reader.format().unwrap();
    assert_eq!(format.sample_rate, rate);
    assert_eq!(
        reader.read_block(4).unwrap_err().format_kind(),
        Some(FormatErrorKind::UnsupportedSampleRate(rate))
    );

    let err = WavStreamWriter::new(
        Cursor::new(Vec::new()),
        FormatDescriptor::pcm(format.channels, format.sample_rate, SampleDepth::Pcm16),
    )
    .unwrap_err();
    assert_eq!(
        err.format_kind(),
        Some(FormatErrorKind::UnsupportedSampleRate(rate))
    );
}

// =========================================================================
// Reader round-trip tests
// =========================================================================

#[test]
fn test_roundtrip_format_and_frames() {
    for depth in [SampleDepth::Pcm16, SampleDepth::Pcm24] {
        for channels in [1u16, 2] {
            let format = FormatDescriptor::pcm(channels, 48000, depth);
            let left: Vec<f32> = (0..100).map(|i| (i as f32 / 100.0) - 0.5).collect();
            let right: Vec<f32> = left.iter().map(|s| -s).collect();
            let right = (channels == 2).then_some(right.as_slice());

            let bytes = write_to_vec(format, &left, right);
            let reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();

            assert_eq!(reader.format(), Some(&format));
            assert_eq!(reader.frames_per_channel(), 100);
            assert_eq!(reader.state(), ReaderState::DataPositioned);
            assert_eq!(reader.data_offset(), 44);
        }
    }
}

#[test]
fn test_read_block_exact_then_end() {
    let bytes = write_to_vec(
        FormatDescriptor::mono(44100, SampleDepth::Pcm16),
        &[0.25; 8],
        None,
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();

    let block = reader.read_block(8).unwrap();
    assert_eq!(block.valid_frames(), 8);
    assert!(!block.is_end_of_stream());
    assert!(block.channel(0).iter().all(|s| (s - 0.25).abs() < 1e-4));
    assert_eq!(reader.state(), ReaderState::Streaming);

    let block = reader.read_block(8).unwrap();
    assert_eq!(block.valid_frames(), 0);
    assert!(block.is_end_of_stream());
    assert!(reader.is_exhausted());
}

#[test]
fn test_short_final_block_is_zero_padded() {
    let bytes = write_to_vec(
        FormatDescriptor::mono(44100, SampleDepth::Pcm16),
        &[0.5; 10],
        None,
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();

    let block = reader.read_block(16).unwrap();
    assert_eq!(block.len(), 16);
    assert_eq!(block.valid_frames(), 10);
    assert!(block.is_end_of_stream());
    assert!(block.channel(0)[10..].iter().all(|&s| s == 0.0));
    assert!((block.channel(0)[9] - 0.5).abs() < 1e-4);

    let err = reader.read_block(16).unwrap_err();
    assert_eq!(err.state_kind(), Some(StateErrorKind::PastEnd));
}

#[test]
fn test_stereo_channels_from_one_read() {
    let bytes = write_to_vec(
        FormatDescriptor::stereo(44100, SampleDepth::Pcm24),
        &[0.5; 8],
        Some(&[-0.25; 8][..]),
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();

    let err = reader.next_audio_block(1, 8).unwrap_err();
    assert_eq!(err.state_kind(), Some(StateErrorKind::NoBlockRead));

    let left = reader.next_audio_block(0, 8).unwrap().to_vec();
    let right = reader.next_audio_block(1, 8).unwrap().to_vec();
    assert!(left.iter().all(|s| (s - 0.5).abs() < 1e-6));
    assert!(right.iter().all(|s| (s + 0.25).abs() < 1e-6));
    assert_eq!(reader.frames_read(), 8);
}

#[test]
fn test_next_audio_block_check_order() {
    let bytes = write_to_vec(
        FormatDescriptor::mono(44100, SampleDepth::Pcm16),
        &[0.0; 4],
        None,
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();

    assert!(matches!(
        reader.next_audio_block(1, 0),
        Err(WavError::ChannelOutOfRange {
            channel: 1,
            channels: 1
        })
    ));
    assert!(matches!(
        reader.next_audio_block(0, 0),
        Err(WavError::ZeroLengthBlock)
    ));

    let mut unopened = WavStreamReader::new(Cursor::new(Vec::<u8>::new()));
    let err = unopened.next_audio_block(0, 4).unwrap_err();
    assert_eq!(err.state_kind(), Some(StateErrorKind::NotPositioned));
}

#[test]
fn test_unsupported_depth_reported_on_read() {
    let bytes = riff(
        b"WAVE",
        &[
            chunk(b"fmt ", &fmt_payload(1, 1, 8000, 8)),
            chunk(b"data", &[0x80; 4]),
        ],
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();
    let err = reader.read_block(4).unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::UnsupportedDepth(8)));

    // raw access still works for hashing
    assert_eq!(reader.read_raw(16).unwrap(), &[0x80; 4]);
}

#[test]
fn test_read_raw_matches_payload() {
    let samples = [1i16, -2, 300, -400, 5000];
    let data = pcm16_data(&samples);
    let bytes = riff(
        b"WAVE",
        &[
            chunk(b"fmt ", &fmt_payload(1, 1, 8000, 16)),
            chunk(b"data", &data),
        ],
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();

    let mut collected = Vec::new();
    collected.extend_from_slice(reader.read_raw(2).unwrap());
    collected.extend_from_slice(reader.read_raw(2).unwrap());
    collected.extend_from_slice(reader.read_raw(2).unwrap());
    assert!(reader.is_exhausted());
    assert_eq!(collected, data);
}

// =========================================================================
// Malformed container tests
// =========================================================================

#[test]
fn test_not_riff() {
    let mut bytes = riff(b"WAVE", &[]);
    bytes[3] = b'X';
    assert_eq!(
        format_kind(WavStreamReader::open(Cursor::new(bytes))),
        FormatErrorKind::NotRiff
    );
}

#[test]
fn test_not_wave() {
    let bytes = riff(b"AVI ", &[]);
    assert_eq!(
        format_kind(WavStreamReader::open(Cursor::new(bytes))),
        FormatErrorKind::NotWave
    );
}

#[test]
fn test_data_before_fmt() {
    let bytes = riff(
        b"WAVE",
        &[
            chunk(b"data", &[0; 4]),
            chunk(b"fmt ", &fmt_payload(1, 1, 8000, 16)),
        ],
    );
    let err = WavStreamReader::open(Cursor::new(bytes)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed WAV container at byte offset 12: data chunk found before fmt chunk"
    );
}

#[test]
fn test_duplicate_fmt() {
    let fmt = chunk(b"fmt ", &fmt_payload(1, 1, 8000, 16));
    let bytes = riff(b"WAVE", &[fmt.clone(), fmt, chunk(b"data", &[0; 4])]);
    assert_eq!(
        format_kind(WavStreamReader::open(Cursor::new(bytes))),
        FormatErrorKind::DuplicateFmt
    );
}

#[test]
fn test_missing_data_chunk() {
    let bytes = riff(
        b"WAVE",
        &[
            chunk(b"fmt ", &fmt_payload(1, 1, 8000, 16)),
            chunk(b"LIST", &[0; 6]),
        ],
    );
    assert_eq!(
        format_kind(WavStreamReader::open(Cursor::new(bytes))),
        FormatErrorKind::NoDataChunk
    );
}

#[test]
fn test_missing_fmt_chunk() {
    let bytes = riff(b"WAVE", &[chunk(b"JUNK", &[0; 4])]);
    assert_eq!(
        format_kind(WavStreamReader::open(Cursor::new(bytes))),
        FormatErrorKind::MissingFmt
    );
}

#[test]
fn test_data_chunk_overruns_riff() {
    let mut bytes = riff(
        b"WAVE",
        &[
            chunk(b"fmt ", &fmt_payload(1, 1, 8000, 16)),
            chunk(b"data", &[0; 4]),
        ],
    );
    // declare more data than the RIFF form holds
    bytes[40..44].copy_from_slice(&1000u32.to_le_bytes());
    assert_eq!(
        format_kind(WavStreamReader::open(Cursor::new(bytes))),
        FormatErrorKind::ChunkOverrun
    );
}

#[test]
fn test_header_steps_out_of_order() {
    let mut reader = WavStreamReader::new(Cursor::new(riff(b"WAVE", &[])));
    let err = reader.locate_data().unwrap_err();
    assert_eq!(err.state_kind(), Some(StateErrorKind::OutOfOrder));
}

// =========================================================================
// Chunk skipping tests
// =========================================================================

#[test]
fn test_skips_odd_unknown_chunk() {
    let data = pcm16_data(&[100, 200, 300]);
    let bytes = riff(
        b"WAVE",
        &[
            chunk(b"fmt ", &fmt_payload(1, 1, 8000, 16)),
            chunk(b"LIST", &[1, 2, 3]),
            chunk(b"data", &data),
        ],
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();

    assert_eq!(
        reader.chunks(),
        &[
            ChunkRecord {
                id: ChunkId::RIFF,
                size: 4 + 24 + 12 + 14,
                offset: 0
            },
            ChunkRecord {
                id: ChunkId::FMT,
                size: 16,
                offset: 12
            },
            ChunkRecord {
                id: ChunkId(*b"LIST"),
                size: 3,
                offset: 36
            },
            ChunkRecord {
                id: ChunkId::DATA,
                size: 6,
                offset: 48
            },
        ]
    );
    assert_eq!(reader.data_offset(), 56);

    let block = reader.read_block(3).unwrap();
    assert!((block.channel(0)[2] - 300.0 / 32768.0).abs() < 1e-7);
}

#[test]
fn test_reads_extensible_pcm() {
    let mut payload = fmt_payload(WAVE_FORMAT_EXTENSIBLE, 1, 8000, 16);
    payload.extend_from_slice(&22u16.to_le_bytes());
    payload.extend_from_slice(&16u16.to_le_bytes());
    payload.extend_from_slice(&4u32.to_le_bytes());
    payload.extend_from_slice(&[0x01, 0x00]);
    payload.extend_from_slice(&[0; 14]);

    let bytes = riff(
        b"WAVE",
        &[chunk(b"fmt ", &payload), chunk(b"data", &pcm16_data(&[16384]))],
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.format().unwrap().fmt_size, 40);

    let block = reader.read_block(1).unwrap();
    assert_eq!(block.channel(0)[0], 0.5);
}

#[test]
fn test_rejects_float_encoding_on_read() {
    let bytes = riff(
        b"WAVE",
        &[
            chunk(b"fmt ", &fmt_payload(3, 1, 8000, 32)),
            chunk(b"data", &[0; 8]),
        ],
    );
    let mut reader = WavStreamReader::open(Cursor::new(bytes)).unwrap();
    let err = reader.read_block(2).unwrap_err();
    assert_eq!(
        err.format_kind(),
        Some(FormatErrorKind::UnsupportedEncoding(3))
    );
}
