//! # Moodplay Performance Benchmarks
//!
//! Benchmarks for the work done on every camera frame. At 30 fps the whole
//! loop has about 33ms per frame, almost all of which belongs to the
//! classifier, so these paths must stay negligible.
//!
//! ## Benchmark Categories
//!
//! - **History**: Recording and majority vote over the smoothing window
//! - **Selection**: Random track choice from library entries of various sizes
//! - **Frame**: Mirroring, box drawing and overlay composition
//! - **Detection parsing**: Decoding classifier JSON
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark group
//! cargo bench history
//! cargo bench selection
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use moodplay::detector::parse_faces;
use moodplay::emotion::{BoundingBox, EmotionLabel};
use moodplay::frame::Frame;
use moodplay::history::EmotionHistory;
use moodplay::library::TrackLibrary;
use moodplay::render::{compose_overlay, FaceView};
use moodplay::selector::TrackSelector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Library with `size` existing happy tracks.
fn create_benchmark_library(size: usize) -> (TempDir, Arc<TrackLibrary>, Vec<PathBuf>) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let tracks: Vec<PathBuf> = (0..size)
        .map(|i| {
            let path = temp_dir.path().join(format!("happy_{i:04}.mp3"));
            std::fs::write(&path, b"audio").expect("Failed to write track");
            path
        })
        .collect();
    let library = TrackLibrary::new(BTreeMap::from([(EmotionLabel::Happy, tracks.clone())]));
    (temp_dir, Arc::new(library), tracks)
}

fn benchmark_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    for length in [5, 30, 120] {
        let mut history = EmotionHistory::new(length);
        for i in 0..length {
            let emotion = EmotionLabel::ALL[i % EmotionLabel::ALL.len()];
            history.record(emotion, 0.5);
        }

        group.bench_with_input(BenchmarkId::new("dominant_emotion", length), &history, |b, history| {
            b.iter(|| black_box(history.dominant_emotion()))
        });

        group.bench_with_input(BenchmarkId::new("record_and_vote", length), &length, |b, _| {
            b.iter_batched(
                || history.clone(),
                |mut history| {
                    history.record(black_box(EmotionLabel::Sad), 0.9);
                    black_box(history.dominant_emotion())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn benchmark_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for size in [1, 10, 100] {
        let (_dir, library, tracks) = create_benchmark_library(size);
        let mut selector = TrackSelector::with_rng(library, StdRng::seed_from_u64(7));
        let current = tracks[0].clone();

        group.bench_with_input(BenchmarkId::new("pick_track", size), &current, |b, current| {
            b.iter(|| black_box(selector.pick_track(EmotionLabel::Happy, Some(current.as_path()))))
        });
    }

    group.finish();
}

fn benchmark_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let frame = Frame::new(vec![90u8; 640 * 480 * 3], 640, 480, 0);

    group.bench_function("mirror_640x480", |b| {
        b.iter_batched(
            || frame.clone(),
            |mut frame| {
                frame.mirror_horizontal();
                frame
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("draw_face_box", |b| {
        b.iter_batched(
            || frame.clone(),
            |mut frame| {
                frame.draw_rect(200, 120, 180, 220, 2, [255, 255, 0]);
                frame
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("compose_overlay", |b| {
        let face = FaceView {
            bbox: BoundingBox::new(200, 120, 180, 220),
            dominant: EmotionLabel::Happy,
            score: 0.93,
        };
        let track = Path::new("/music/happy_music.mp3");
        b.iter(|| black_box(compose_overlay(Some(face), Some(track), 0.7)))
    });

    group.finish();
}

fn benchmark_detection_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection_parsing");
    let face = r#"{"box": [210, 118, 176, 224], "emotions": {"angry": 0.02, "disgust": 0.0, "fear": 0.05, "happy": 0.81, "sad": 0.03, "surprise": 0.04, "neutral": 0.05}}"#;

    for faces in [1, 4] {
        let json = format!("[{}]", vec![face; faces].join(","));
        group.bench_with_input(BenchmarkId::new("parse_faces", faces), &json, |b, json| {
            b.iter(|| black_box(parse_faces(json).expect("valid json")))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_history,
    benchmark_selection,
    benchmark_frame,
    benchmark_detection_parsing
);
criterion_main!(benches);
