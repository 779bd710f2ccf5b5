//! Performance benchmarks for the message pipeline
//!
//! Targets:
//! - Classification: <100µs per message
//! - Full pipeline: <500µs per message with 100 retained interactions
//! - Response scoring: <100µs per candidate

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rapport_core::{ContextAssembler, Message, MessageClassifier, RapportConfig};

const BODIES: [&str; 5] = [
    "URGENT: respond immediately!!",
    "Can you review the project budget before the meeting tomorrow?",
    "Happy birthday! Hope you have a wonderful day with the family",
    "ok",
    "Thanks so much for dinner last night, it was great to catch up 😊",
];

fn message(i: usize) -> Message {
    let at = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap() + Duration::minutes(i as i64);
    let message = Message::new("bench", "bench", BODIES[i % BODIES.len()], at);
    if i % 3 == 0 {
        message.from_self()
    } else {
        message
    }
}

/// Benchmark 1: Classification
fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    group.throughput(Throughput::Elements(1));

    let classifier = MessageClassifier::default();
    for (i, body) in BODIES.iter().enumerate() {
        let msg = Message::new("chat", "sender", *body, Utc::now());
        group.bench_with_input(BenchmarkId::new("classify", i), &msg, |b, msg| {
            b.iter(|| classifier.classify(black_box(msg)));
        });
    }

    group.finish();
}

/// Benchmark 2: Full pipeline against a warm profile
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(1));

    for history in [0usize, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("process_message", history),
            &history,
            |b, &history| {
                let assembler = ContextAssembler::new(RapportConfig::default());
                for i in 0..history {
                    assembler.process_message(&message(i));
                }
                let mut i = history;
                b.iter(|| {
                    i += 1;
                    assembler.process_message(black_box(&message(i)))
                });
            },
        );
    }

    group.finish();
}

/// Benchmark 3: Response scoring
fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    group.throughput(Throughput::Elements(1));

    let assembler = ContextAssembler::new(RapportConfig::default());
    for i in 0..50 {
        assembler.process_message(&message(i));
    }
    let mut context = assembler.process_message(&message(50));

    group.bench_function("score_response", |b| {
        b.iter(|| {
            assembler.score_response(
                black_box(&mut context),
                black_box("Sounds great, I'll review the budget tonight!"),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_classification, bench_pipeline, bench_scoring);
criterion_main!(benches);
