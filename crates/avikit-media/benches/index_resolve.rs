//! Benchmark opening an AVI: header parsing plus idx1 load or movi rescan.

use avikit_media::{AviFrame, AviInput, AviOutput, FrameType};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;

fn make_avi(frames: u32, frame_size: usize) -> Vec<u8> {
    let mut output = AviOutput::new(Cursor::new(Vec::new()));
    output
        .add_video_stream(avikit_media::VideoStream {
            width: 640,
            height: 360,
            frame_rate: 25.0,
            ..Default::default()
        })
        .unwrap();
    let frame = AviFrame::new(FrameType::Compressed, vec![0x5A; frame_size]);
    for _ in 0..frames {
        output.write_frame(0, &frame).unwrap();
    }
    output.close().unwrap().into_inner()
}

fn strip_idx1(mut data: Vec<u8>) -> Vec<u8> {
    let pos = data.windows(4).rposition(|w| w == b"idx1").unwrap();
    data.truncate(pos);
    let riff_len = (data.len() - 8) as u32;
    data[4..8].copy_from_slice(&riff_len.to_le_bytes());
    data
}

fn bench_index_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_resolve");

    // 10 minutes at 25 fps.
    let indexed = make_avi(15_000, 64);
    let unindexed = strip_idx1(indexed.clone());

    group.bench_function("idx1_15000", |b| {
        b.iter(|| AviInput::new(Cursor::new(black_box(indexed.as_slice()))).unwrap());
    });

    group.bench_function("rebuild_15000", |b| {
        b.iter(|| AviInput::new(Cursor::new(black_box(unindexed.as_slice()))).unwrap());
    });

    group.finish();
}

fn bench_get_frame(c: &mut Criterion) {
    let data = make_avi(2_000, 4096);
    let mut input = AviInput::new(Cursor::new(data)).unwrap();

    c.bench_function("get_frame_random", |b| {
        let mut n = 0u32;
        b.iter(|| {
            n = (n + 7919) % 2_000;
            black_box(input.get_frame(0, n).unwrap())
        });
    });
}

criterion_group!(benches, bench_index_resolve, bench_get_frame);
criterion_main!(benches);
