use core::fmt::Write as _;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use edgelink::lb::Config;
use edgelink::time;

fn bench_timestamp_subtract(c: &mut Criterion) {
    c.bench_function("timestamp_subtract", |b| {
        b.iter(|| {
            time::subtract(
                black_box("2020-09-03T17:14:25.431-04:00"),
                black_box("2020-09-03 09:50:25.2-04:00"),
            )
        })
    });
}

fn bench_config_import(c: &mut Criterion) {
    let mut doc = String::from("{\"params\":[");
    for i in 0..100 {
        if i > 0 {
            doc.push(',');
        }
        let _ = write!(doc, "{{\"identifier\":\"param_{i}\",\"value\":{i}}}");
    }
    doc.push_str("]}");

    c.bench_function("config_import_100_params", |b| {
        b.iter(|| Config::from_json(black_box(&doc)).unwrap())
    });
}

fn bench_byte_array_import(c: &mut Criterion) {
    let mut doc = String::from("{\"identifier\":1,\"value\":[");
    for i in 0..4096 {
        if i > 0 {
            doc.push(',');
        }
        let _ = write!(doc, "{}", i % 256);
    }
    doc.push_str("]}");

    c.bench_function("general_import_4k_bytes", |b| {
        b.iter(|| edgelink::lb::General::from_json(black_box(&doc)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_timestamp_subtract,
    bench_config_import,
    bench_byte_array_import
);
criterion_main!(benches);
