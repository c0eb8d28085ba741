//! Benchmarks for turning raw generation output into riddles
//!
//! This benchmark measures:
//! - Repair step overhead on clean, fenced and truncated output
//! - Full extraction (repair, parse, validate, dedup) across candidates

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use riddlr::structured::{RepairPipeline, RiddleExtractor};

fn riddle_array(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"question":"Question number {i}?","correctAnswer":"Answer {i}","incorrectAnswers":["W{i}a","W{i}b","W{i}c","W{i}d"],"explanation":"Because {i}.","citationURL":"https://example.com/{i}"}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

fn bench_repair(c: &mut Criterion) {
    let pipeline = RepairPipeline::standard();
    let clean = riddle_array(10);
    let fenced = format!("```json\n{}\n```", clean);
    let truncated = clean[..clean.len() - 40].to_string();

    let mut group = c.benchmark_group("repair");
    for (name, raw) in [("clean", &clean), ("fenced", &fenced), ("truncated", &truncated)] {
        group.bench_with_input(BenchmarkId::new("standard", name), raw, |b, raw| {
            b.iter(|| pipeline.repair(black_box(raw)))
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let extractor = RiddleExtractor::new().with_max_incorrect_answers(4);
    let mut group = c.benchmark_group("extract");

    for candidates in [1usize, 4, 8] {
        let raw: Vec<String> = (0..candidates).map(|_| riddle_array(10)).collect();
        group.throughput(Throughput::Elements((candidates * 10) as u64));
        group.bench_with_input(BenchmarkId::new("flatten", candidates), &raw, |b, raw| {
            b.iter(|| extractor.extract(black_box(raw.as_slice())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_repair, bench_extract);
criterion_main!(benches);
