use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use stl_stream::{
    ascii::AsciiWriter,
    binary::write_binary,
    probe_format, read_stl, CounterSink, Triangle,
};


const TRIANGLE_COUNT: u32 = 10_000;

/// A synthetic triangle strip, enough to amortize per-call overhead.
fn strip(count: u32) -> Vec<Triangle> {
    (0..count)
        .map(|i| {
            let x = i as f32 * 0.5;
            Triangle {
                normal: [0.0, 0.0, 1.0],
                vertices: [
                    [x, 0.0, 0.0],
                    [x + 1.0, 0.0, 0.0],
                    [x + 0.5, 1.0, 0.0],
                ],
                attribute_byte_count: 0,
            }
        })
        .collect()
}

fn encoded_binary() -> Vec<u8> {
    let mut out = Vec::new();
    write_binary(&mut out, &strip(TRIANGLE_COUNT)[..]).unwrap();
    out
}

fn encoded_ascii() -> Vec<u8> {
    let mut writer = AsciiWriter::new(Vec::new());
    writer.write_from(&strip(TRIANGLE_COUNT)[..]).unwrap();
    writer.into_inner()
}

fn read_benches(c: &mut Criterion) {
    let binary = encoded_binary();
    let ascii = encoded_ascii();

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(binary.len() as u64));
    group.bench_function("binary_le", |b| {
        b.iter(|| {
            let mut sink = CounterSink::new();
            read_stl(&mut Cursor::new(black_box(&binary[..])), &mut sink).unwrap();
            black_box(sink.triangle_count)
        })
    });
    group.throughput(Throughput::Bytes(ascii.len() as u64));
    group.bench_function("ascii", |b| {
        b.iter(|| {
            let mut sink = CounterSink::new();
            read_stl(&mut Cursor::new(black_box(&ascii[..])), &mut sink).unwrap();
            black_box(sink.triangle_count)
        })
    });
    group.finish();
}

fn write_benches(c: &mut Criterion) {
    let triangles = strip(TRIANGLE_COUNT);

    let mut group = c.benchmark_group("write");
    group.bench_function("binary_le", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(84 + 50 * TRIANGLE_COUNT as usize);
            write_binary(&mut out, black_box(&triangles[..])).unwrap();
            black_box(out.len())
        })
    });
    group.bench_function("ascii", |b| {
        b.iter(|| {
            let mut writer = AsciiWriter::new(Vec::new());
            writer.write_from(black_box(&triangles[..])).unwrap();
            black_box(writer.into_inner().len())
        })
    });
    group.finish();
}

fn sniff_benches(c: &mut Criterion) {
    let binary = encoded_binary();
    let ascii = encoded_ascii();

    c.bench_function("sniff_binary", |b| {
        b.iter(|| probe_format(&mut Cursor::new(black_box(&binary[..]))).unwrap())
    });
    c.bench_function("sniff_ascii", |b| {
        b.iter(|| probe_format(&mut Cursor::new(black_box(&ascii[..]))).unwrap())
    });
}

criterion_group!(benches, read_benches, write_benches, sniff_benches);
criterion_main!(benches);
