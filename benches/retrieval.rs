//! Retrieval ranking benchmarks.

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use interview_coach::embedding::DEFAULT_DIMENSIONS;
use interview_coach::{FallbackEmbedder, Snippet, SnippetIndex};
use std::hint::black_box;

const TOPICS: [&str; 6] = [
    "Spring Boot services with MySQL and InnoDB indexes",
    "Redis caching, eviction policies and TTL tuning",
    "Kafka consumers, partitions and offset commits",
    "Kubernetes deployments, probes and autoscaling",
    "Python asyncio event loops and task groups",
    "Rust ownership, borrowing and tokio runtimes",
];

fn build_index(embedder: &FallbackEmbedder, size: usize) -> SnippetIndex {
    let snippets = (0..size).map(|i| {
        let text = format!("{} (note {i})", TOPICS[i % TOPICS.len()]);
        Snippet {
            id: i64::try_from(i).unwrap_or(i64::MAX),
            document_id: i64::try_from(i / 16).unwrap_or(i64::MAX),
            source: format!("notes-{}.md", i / 16),
            position: i % 16,
            embedding: embedder.generate_embedding(&text),
            text,
        }
    });
    SnippetIndex::from_snippets(snippets.collect())
}

fn bench_rank(c: &mut Criterion) {
    let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
    let query = embedder.generate_embedding("How would you size a Redis cache?");

    let mut group = c.benchmark_group("rank");
    for size in [100, 1_000, 10_000] {
        let index = build_index(&embedder, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
            b.iter(|| index.rank(black_box(&query), 3));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
