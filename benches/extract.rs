//! Benchmark suite specifically for frame extraction.
//!
//! Isolates the byte scanner from async runtime overhead to enable precise
//! measurement of the hot path that runs on every poll.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rfid_forwarder::extract_events;

/// One inventory report: marker, ten EPC bytes, RSSI.
fn record(i: u8) -> Vec<u8> {
    let mut bytes = vec![0xE2, 0x80, 0x11, 0x60, 0x60, 0x00, 0x02, 0x0A, 0x00, 0x00, 0x00, i];
    bytes.push(0xC5);
    bytes
}

/// Reader framing around each report, as seen on the wire.
fn framed(i: u8) -> Vec<u8> {
    let mut bytes = vec![0x13, 0x00, 0xEE, 0x00];
    bytes.extend(record(i));
    bytes.extend([0x5A, 0x3C]);
    bytes
}

fn bench_extract_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_batch");

    for count in [1u8, 10, 100] {
        let buf: Vec<u8> = (0..count).flat_map(framed).collect();
        group.throughput(Throughput::Bytes(buf.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &buf, |b, buf| {
            b.iter(|| black_box(extract_events(black_box(buf))))
        });
    }

    group.finish();
}

fn bench_extract_noise(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_noise");

    // 4 KiB of bytes without any marker: worst case scan
    let noise: Vec<u8> = (0..4096u32).map(|i| (i % 0xE0) as u8).collect();
    group.throughput(Throughput::Bytes(noise.len() as u64));
    group.bench_function("4k_no_marker", |b| {
        b.iter(|| black_box(extract_events(black_box(&noise))))
    });

    group.finish();
}

criterion_group!(benches, bench_extract_batch_sizes, bench_extract_noise);
criterion_main!(benches);
