// SPDX-License-Identifier: MPL-2.0
//! Benchmarks for media navigation operations.
//!
//! Measures the performance of:
//! - Opening a large list (active-record lookup)
//! - Navigation operations (peek, next, previous with wraparound)
//! - Handler resolution for a mixed list
//! - Blob store insertion under eviction pressure

use criterion::{criterion_group, criterion_main, Criterion};
use futures_util::FutureExt;
use std::hint::black_box;
use viewer_core::application::{MimeResolver, NavigationController, NavigationOptions};
use viewer_core::builtin::register_builtin;
use viewer_core::media::blob::{BlobStore, MIN_BLOB_CACHE_BYTES};
use viewer_core::{FileRecord, HandlerRegistry};

const LIST_LEN: u64 = 10_000;

fn mixed_list() -> Vec<FileRecord> {
    (0..LIST_LEN)
        .map(|i| match i % 4 {
            0 => FileRecord::new(i, format!("/Photos/{i:05}.jpg"), "image/jpeg"),
            1 => FileRecord::new(i, format!("/Photos/{i:05}.mkv"), "video/x-matroska"),
            2 => FileRecord::new(i, format!("/Photos/{i:05}.flac"), "audio/x-flac"),
            _ => FileRecord::new(i, format!("/Photos/{i:05}.pdf"), "application/pdf"),
        })
        .collect()
}

/// Benchmark opening a list with the active record near its end.
fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("media_navigation");
    let files = mixed_list();
    let active = files[files.len() - 2].clone();

    group.bench_function("open_large_list", |b| {
        b.iter(|| {
            let mut controller = NavigationController::new();
            controller
                .open(
                    files.clone().into(),
                    Some(active.clone()),
                    NavigationOptions::default(),
                )
                .unwrap();
            black_box(&controller);
        });
    });

    group.finish();
}

/// Benchmark navigation operations (next/previous).
///
/// Measures the pure navigation time without source resolution.
fn bench_navigate(c: &mut Criterion) {
    let mut group = c.benchmark_group("media_navigation");

    let mut controller = NavigationController::new();
    controller
        .open(mixed_list().into(), None, NavigationOptions::default())
        .unwrap();

    group.bench_function("peek_next", |b| {
        b.iter(|| black_box(controller.peek_next().is_some()));
    });

    group.bench_function("navigation_info", |b| {
        b.iter(|| black_box(controller.navigation_info()));
    });

    group.bench_function("prev_with_wraparound", |b| {
        b.iter(|| black_box(controller.prev().unwrap()));
    });

    group.bench_function("next_with_wraparound", |b| {
        b.iter(|| black_box(controller.next().now_or_never().unwrap().unwrap()));
    });

    group.finish();
}

/// Benchmark handler resolution across image, video, audio and generic files.
fn bench_resolve_handler(c: &mut Criterion) {
    let mut group = c.benchmark_group("media_navigation");

    let registry = HandlerRegistry::new();
    register_builtin(&registry).unwrap();
    let aliases = registry.alias_table();
    let handlers = registry.handlers();
    let mimes = ["image/jpeg", "video/x-matroska", "audio/x-flac", "application/pdf"];

    group.bench_function("resolve_handler", |b| {
        b.iter(|| {
            for mime in mimes {
                black_box(MimeResolver::resolve_or_fallback(mime, &aliases, &handlers).unwrap());
            }
        });
    });

    group.finish();
}

/// Benchmark blob insertion when every insert evicts.
fn bench_blob_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("media_navigation");
    let payload = vec![0x5a_u8; MIN_BLOB_CACHE_BYTES / 4];

    group.bench_function("blob_insert_with_eviction", |b| {
        let mut store = BlobStore::new(MIN_BLOB_CACHE_BYTES);
        let mut counter = 0u32;
        b.iter(|| {
            let mut bytes = payload.clone();
            bytes[..4].copy_from_slice(&counter.to_le_bytes());
            counter = counter.wrapping_add(1);
            black_box(store.insert(Some("video/mp4".to_string()), bytes));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_open,
    bench_navigate,
    bench_resolve_handler,
    bench_blob_store
);
criterion_main!(benches);
