// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gitstream_core::{ParseOptions, parse_commits, truncate_to_byte_limit};

/// Build a synthetic history of `commits` commits, each touching `files` files
fn synthetic_log(commits: usize, files: usize, lines: usize) -> String {
    let mut out = String::new();
    for c in 0..commits {
        out.push_str(&format!(
            "c {c:040x}\na Author {}\nm author{}@example.com\nt {}\n\n",
            c % 10,
            c % 10,
            1_700_000_000 + c
        ));
        for f in 0..files {
            out.push_str(&format!(
                "diff --git a/src/module_{f}.rs b/src/module_{f}.rs\nindex 83db48f..bf269f4 100644\n--- a/src/module_{f}.rs\n+++ b/src/module_{f}.rs\n@@ -1,{lines} +1,{lines} @@ fn bench() {{\n"
            ));
            for l in 0..lines {
                out.push_str(&format!("+    let value_{l} = compute({l}, {c});\n"));
            }
        }
    }
    out
}

fn parse_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for &(commits, files) in &[(100, 5), (20, 50)] {
        let log = synthetic_log(commits, files, 20);
        group.throughput(Throughput::Bytes(log.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("unlimited", format!("{commits}x{files}")),
            &log,
            |b, log| {
                b.iter(|| {
                    parse_commits(log.as_bytes(), &ParseOptions::unlimited()).expect("parse failed")
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("capped", format!("{commits}x{files}")),
            &log,
            |b, log| {
                let options = ParseOptions::unlimited()
                    .with_max_files(10)
                    .with_max_bytes(512);
                b.iter(|| parse_commits(log.as_bytes(), &options).expect("parse failed"))
            },
        );
    }

    group.finish();
}

fn long_line_benchmarks(c: &mut Criterion) {
    let mut log = synthetic_log(1, 1, 1);
    log.push_str(&format!("+{}\n", "x".repeat(4 * 1024 * 1024)));

    let mut group = c.benchmark_group("long_lines");
    group.throughput(Throughput::Bytes(log.len() as u64));
    group.bench_function("minified_4mib", |b| {
        let options = ParseOptions::unlimited().with_buffer_capacity(64 * 1024);
        b.iter(|| parse_commits(log.as_bytes(), &options).expect("parse failed"))
    });
    group.finish();
}

fn capture_benchmarks(c: &mut Criterion) {
    let log = synthetic_log(200, 5, 20);

    c.bench_function("capture_1mib", |b| {
        b.iter(|| truncate_to_byte_limit(log.as_bytes(), Some(1024 * 1024)).expect("capture failed"))
    });
}

criterion_group!(
    benches,
    parse_benchmarks,
    long_line_benchmarks,
    capture_benchmarks
);
criterion_main!(benches);
