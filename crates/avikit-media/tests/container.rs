//! Integration tests for avikit-media: write with `AviOutput`, read back with
//! `AviInput`, and damage the bytes in between.

use avikit_media::avi::{AVIIF_KEYFRAME, AVIIF_NO_TIME};
use avikit_media::{
    AviFrame, AviInput, AviOutput, Event, FourCc, FrameSink, FrameSource, FrameType, IndexSource,
    OutputOptions, VideoStream,
};
use std::cell::RefCell;
use std::io::Cursor;

fn video_stream() -> VideoStream {
    VideoStream {
        width: 32,
        height: 16,
        frame_rate: 25.0,
        codec: FourCc(*b"MJPG"),
        compression: FourCc(*b"MJPG"),
        bit_depth: 24,
        ..Default::default()
    }
}

/// Payloads of 10, 11, 12 bytes in rotation so odd sizes get padded.
fn payload(n: u32) -> Vec<u8> {
    vec![n as u8 | 0x80; 10 + (n % 3) as usize]
}

fn write_avi(frames: u32) -> Vec<u8> {
    let mut output = AviOutput::new(Cursor::new(Vec::new()));
    let index = output.add_video_stream(video_stream()).unwrap();
    for n in 0..frames {
        let frame = AviFrame::new(FrameType::Compressed, payload(n));
        assert_eq!(output.write_frame(index, &frame).unwrap(), n);
    }
    output.close().unwrap().into_inner()
}

fn read_all(data: Vec<u8>) -> (IndexSource, Vec<AviFrame>) {
    let mut input = AviInput::new(Cursor::new(data)).unwrap();
    let source = input.index_source();
    let mut video = input.video(0).unwrap();
    let count = video.stream().frame_count;
    let frames = (0..count)
        .map(|n| video.get_frame(n).unwrap().unwrap())
        .collect();
    (source, frames)
}

fn idx1_position(data: &[u8]) -> usize {
    data.windows(4).rposition(|w| w == b"idx1").unwrap()
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap())
}

#[test]
fn test_round_trip() {
    let mut output = AviOutput::new(Cursor::new(Vec::new()));
    output.add_video_stream(video_stream()).unwrap();
    let mut written = Vec::new();
    {
        let mut writer = output.stream(0).unwrap();
        for n in 0..12u32 {
            let frame_type = if n % 4 == 0 {
                FrameType::Uncompressed
            } else {
                FrameType::Compressed
            };
            let mut frame = AviFrame::new(frame_type, payload(n));
            if n % 2 == 1 {
                frame.flags = AVIIF_NO_TIME;
            }
            frame.number = writer.write_frame(&frame).unwrap();
            written.push(frame);
        }
    }
    let data = output.close().unwrap().into_inner();

    let (source, frames) = read_all(data);
    assert_eq!(source, IndexSource::Idx1);
    assert_eq!(frames, written);
}

#[test]
fn test_interleaved_streams() {
    let mut output = AviOutput::new(Cursor::new(Vec::new()));
    let a = output.add_video_stream(video_stream()).unwrap();
    let b = output.new_stream(&video_stream()).unwrap();
    for n in 0..6 {
        output
            .write_frame(a, &AviFrame::new(FrameType::Compressed, vec![0xA0 | n; 5]))
            .unwrap();
        if n % 2 == 0 {
            output
                .write_frame(b, &AviFrame::new(FrameType::Uncompressed, vec![0xB0 | n; 7]))
                .unwrap();
        }
    }
    let data = output.close().unwrap().into_inner();

    let mut input = AviInput::new(Cursor::new(data)).unwrap();
    assert_eq!(input.main_header().total_frames, 6);
    let counts: Vec<u32> = input.video_streams().iter().map(|v| v.frame_count).collect();
    assert_eq!(counts, vec![6, 3]);

    let frame = input.get_frame(1, 2).unwrap().unwrap();
    assert_eq!(frame.data, vec![0xB4; 7]);
    assert_eq!(frame.frame_type, FrameType::Uncompressed);
    assert!(input.get_frame(1, 3).unwrap().is_none());
}

#[test]
fn test_odd_payload_is_padded_but_not_counted() {
    let mut output = AviOutput::new(Cursor::new(Vec::new()));
    output.add_video_stream(video_stream()).unwrap();
    for data in [vec![1u8, 2, 3], vec![4u8, 5]] {
        output
            .write_frame(0, &AviFrame::new(FrameType::Compressed, data))
            .unwrap();
    }
    let data = output.close().unwrap().into_inner();

    let input = AviInput::new(Cursor::new(data.clone())).unwrap();
    let movi = input.movi_offset() as usize;
    assert_eq!(&data[movi..movi + 4], b"00dc");
    assert_eq!(read_u32(&data, movi + 4), 3);
    assert_eq!(data[movi + 11], 0);
    // the next chunk starts after the pad byte
    assert_eq!(&data[movi + 12..movi + 16], b"00dc");
    assert_eq!(read_u32(&data, movi + 16), 2);

    let (_, frames) = read_all(data);
    assert_eq!(frames[0].data.len(), 3);
    assert_eq!(frames[1].data.len(), 2);
}

#[test]
fn test_absolute_idx1_offsets_are_healed() {
    let original = write_avi(8);
    let movi = AviInput::new(Cursor::new(original.clone()))
        .unwrap()
        .movi_offset() as u32;

    let mut damaged = original.clone();
    let entries = idx1_position(&damaged) + 8;
    for n in 0..8 {
        let pos = entries + n * 16 + 8;
        let offset = read_u32(&damaged, pos) + movi;
        damaged[pos..pos + 4].copy_from_slice(&offset.to_le_bytes());
    }

    let repairs = RefCell::new(Vec::new());
    let sink = |e: &Event<'_>| {
        if let Event::OffsetsRepaired { stream, delta, .. } = e {
            repairs.borrow_mut().push((*stream, *delta));
        }
    };
    let mut input = AviInput::with_diagnostics(Cursor::new(damaged), &sink).unwrap();
    assert_eq!(*repairs.borrow(), vec![(0, movi as u64)]);

    let healed: Vec<Vec<u8>> = (0..8)
        .map(|n| input.get_frame(0, n).unwrap().unwrap().data)
        .collect();
    let expected: Vec<Vec<u8>> = (0..8).map(payload).collect();
    assert_eq!(healed, expected);
}

#[test]
fn test_offsets_are_healed_per_stream() {
    let mut output = AviOutput::new(Cursor::new(Vec::new()));
    let a = output.add_video_stream(video_stream()).unwrap();
    let b = output.new_stream(&video_stream()).unwrap();
    let mut expected_a = Vec::new();
    let mut expected_b = Vec::new();
    for n in 0..6u8 {
        expected_a.push(vec![0xA0 | n; 5]);
        output
            .write_frame(a, &AviFrame::new(FrameType::Compressed, vec![0xA0 | n; 5]))
            .unwrap();
        if n % 2 == 0 {
            expected_b.push(vec![0xB0 | n; 7]);
            output
                .write_frame(b, &AviFrame::new(FrameType::Uncompressed, vec![0xB0 | n; 7]))
                .unwrap();
        }
    }
    let original = output.close().unwrap().into_inner();
    let movi = AviInput::new(Cursor::new(original.clone()))
        .unwrap()
        .movi_offset() as u32;

    // stream 0 gets absolute offsets, stream 1 stays movi-relative
    let mut damaged = original;
    let entries = idx1_position(&damaged) + 8;
    for n in 0..9 {
        let entry = entries + n * 16;
        if &damaged[entry..entry + 2] == b"00" {
            let offset = read_u32(&damaged, entry + 8) + movi;
            damaged[entry + 8..entry + 12].copy_from_slice(&offset.to_le_bytes());
        }
    }

    let repairs = RefCell::new(Vec::new());
    let sink = |e: &Event<'_>| {
        if let Event::OffsetsRepaired { stream, delta, .. } = e {
            repairs.borrow_mut().push((*stream, *delta));
        }
    };
    let mut input = AviInput::with_diagnostics(Cursor::new(damaged), &sink).unwrap();
    assert_eq!(*repairs.borrow(), vec![(0, movi as u64)]);

    let read_a: Vec<Vec<u8>> = (0..6)
        .map(|n| input.get_frame(a, n).unwrap().unwrap().data)
        .collect();
    let read_b: Vec<Vec<u8>> = (0..3)
        .map(|n| input.get_frame(b, n).unwrap().unwrap().data)
        .collect();
    assert_eq!(read_a, expected_a);
    assert_eq!(read_b, expected_b);
}

#[test]
fn test_relative_offsets_are_left_alone() {
    let data = write_avi(5);
    let repairs = RefCell::new(0);
    let sink = |e: &Event<'_>| {
        if matches!(e, Event::OffsetsRepaired { .. }) {
            *repairs.borrow_mut() += 1;
        }
    };
    let input = AviInput::with_diagnostics(Cursor::new(data.clone()), &sink).unwrap();
    assert_eq!(*repairs.borrow(), 0);

    let entries = idx1_position(&data) + 8;
    let stored: Vec<u32> = (0..5).map(|n| read_u32(&data, entries + n * 16 + 8)).collect();
    let resolved: Vec<u32> = input.index().track(0).iter().map(|e| e.offset).collect();
    assert_eq!(resolved, stored);
}

#[test]
fn test_rebuilt_index_matches_idx1() {
    let with_index = write_avi(9);
    let mut without_index = with_index.clone();
    without_index.truncate(idx1_position(&without_index));
    let riff_len = (without_index.len() - 8) as u32;
    without_index[4..8].copy_from_slice(&riff_len.to_le_bytes());

    let (source_a, frames_a) = read_all(with_index);
    let (source_b, frames_b) = read_all(without_index);
    assert_eq!(source_a, IndexSource::Idx1);
    assert_eq!(source_b, IndexSource::Rebuilt);
    assert_eq!(frames_a, frames_b);
    assert!(frames_b.iter().all(|f| f.flags == AVIIF_KEYFRAME));
}

#[test]
fn test_copy_with_repeated_frames() {
    let source = write_avi(4);
    let mut input = AviInput::new(Cursor::new(source)).unwrap();
    let template = input.video_streams()[0].clone();

    let mut output = AviOutput::with_options(
        Cursor::new(Vec::new()),
        OutputOptions {
            frame_rate: template.frame_rate,
            ..Default::default()
        },
    );
    let out = output.new_stream(&template).unwrap();
    for n in 0..template.frame_count {
        let frame = input.get_frame(template.index, n).unwrap().unwrap();
        let repeats = if n == 2 { 3 } else { 1 };
        for _ in 0..repeats {
            output.write_frame(out, &frame).unwrap();
        }
    }
    let copy = output.close().unwrap().into_inner();

    let (_, frames) = read_all(copy);
    let sizes: Vec<usize> = frames.iter().map(|f| f.data.len()).collect();
    assert_eq!(sizes, vec![10, 11, 12, 12, 12, 10]);
    assert_eq!(frames[3].data, payload(2));
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.avi");

    let mut output = AviOutput::create(&path, OutputOptions::default()).unwrap();
    output.add_video_stream(video_stream()).unwrap();
    for n in 0..3 {
        output
            .write_frame(0, &AviFrame::new(FrameType::Compressed, payload(n)))
            .unwrap();
    }
    output.close().unwrap();

    let mut input = AviInput::open(&path).unwrap();
    let stream = &input.video_streams()[0];
    assert_eq!((stream.width, stream.height), (32, 16));
    assert_eq!(stream.codec, FourCc(*b"MJPG"));
    assert_eq!(stream.frame_count, 3);
    assert_eq!(input.get_frame(0, 2).unwrap().unwrap().data, payload(2));
}

#[test]
fn test_timecode_addressing_at_29_97() {
    let mut output = AviOutput::with_options(
        Cursor::new(Vec::new()),
        OutputOptions {
            frame_rate: 29.97,
            ..Default::default()
        },
    );
    let mut stream = video_stream();
    stream.frame_rate = 29.97;
    output.add_video_stream(stream).unwrap();
    for n in 0..1801u32 {
        output
            .write_frame(0, &AviFrame::new(FrameType::Compressed, n.to_le_bytes().to_vec()))
            .unwrap();
    }
    let data = output.close().unwrap().into_inner();

    let mut input = AviInput::new(Cursor::new(data)).unwrap();
    let info = &input.streams()[0].header;
    assert_eq!((info.rate, info.scale), (30000, 1001));

    let mut video = input.video(0).unwrap();
    let frame = video.frame_at_timecode("00:01:00;02", None).unwrap().unwrap();
    assert_eq!(frame.data, 1800u32.to_le_bytes());
    let frame = video.frame_at_timecode("00:00:01:00", Some(false)).unwrap().unwrap();
    assert_eq!(frame.number, 30);
}
