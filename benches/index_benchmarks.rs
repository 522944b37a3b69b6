//! Benchmarks for index operations.
//!
//! Run with: cargo bench --bench index_benchmarks

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use notevault::domain::{Note, WikiLink, extract_links};
use notevault::index::{BacklinksIndex, SearchIndex};

// =============================================================================
// Test Data Generation
// =============================================================================

const FOLDERS: &[&str] = &[
    "software/architecture",
    "software/testing",
    "projects/alpha",
    "projects/beta",
    "reference",
    "personal/journal",
];

const TAGS: &[&str] = &["draft", "review", "rust", "cli", "database", "async"];

const WORDS: &[&str] = &[
    "architecture",
    "design",
    "pattern",
    "system",
    "component",
    "interface",
    "module",
    "implementation",
    "dependency",
    "testing",
    "performance",
    "optimization",
    "database",
    "query",
    "index",
    "cache",
];

fn note_path(index: usize) -> String {
    format!("{}/note-{index:05}", FOLDERS[index % FOLDERS.len()])
}

/// Builds deterministic content with prose and a few links to other notes.
fn generate_note(index: usize, total: usize) -> Note {
    let mut content = String::new();
    for line in 0..12 {
        let words: Vec<&str> = (0..10)
            .map(|w| WORDS[(index * 7 + line * 3 + w) % WORDS.len()])
            .collect();
        content.push_str(&words.join(" "));
        if line % 4 == 0 {
            content.push_str(&format!(" see [[{}]]", note_path((index + line + 1) % total)));
        }
        content.push('\n');
    }

    let tags = vec![
        TAGS[index % TAGS.len()].to_string(),
        TAGS[(index / 3) % TAGS.len()].to_string(),
    ];
    let now = Utc::now();
    Note::new(
        note_path(index),
        format!("Note {index} on {}", WORDS[index % WORDS.len()]),
        content,
        tags,
        now,
        now,
    )
}

fn generate_notes(count: usize) -> Vec<Note> {
    (0..count).map(|i| generate_note(i, count)).collect()
}

fn links_of(notes: &[Note]) -> Vec<(String, Vec<WikiLink>)> {
    notes
        .iter()
        .map(|n| (n.path().to_string(), extract_links(n.content())))
        .collect()
}

// =============================================================================
// Search Index
// =============================================================================

fn bench_search_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_rebuild");
    group.sample_size(10);

    for size in [100, 1000] {
        let notes = generate_notes(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("notes", size), &size, |b, _| {
            let mut index = SearchIndex::open_in_memory().unwrap();
            b.iter(|| index.rebuild(&notes).unwrap());
        });
    }
    group.finish();
}

fn bench_search_update(c: &mut Criterion) {
    let notes = generate_notes(1000);
    let mut index = SearchIndex::open_in_memory().unwrap();
    index.rebuild(&notes).unwrap();

    c.bench_function("search_update_single_note", |b| {
        let mut i = 0;
        b.iter(|| {
            index.update_note(&notes[i % notes.len()]).unwrap();
            i += 1;
        })
    });
}

fn bench_search_query(c: &mut Criterion) {
    let notes = generate_notes(1000);
    let mut index = SearchIndex::open_in_memory().unwrap();
    index.rebuild(&notes).unwrap();

    let mut group = c.benchmark_group("search_query");
    group.bench_function("single_term", |b| {
        b.iter(|| index.search("architecture").unwrap())
    });
    group.bench_function("substring", |b| b.iter(|| index.search("optim").unwrap()));
    group.bench_function("multi_term", |b| {
        b.iter(|| index.search("database query cache").unwrap())
    });
    group.bench_function("no_match", |b| b.iter(|| index.search("zebra").unwrap()));
    group.finish();
}

// =============================================================================
// Backlinks Index
// =============================================================================

fn bench_backlinks_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("backlinks_rebuild");
    group.sample_size(10);

    for size in [100, 1000] {
        let links = links_of(&generate_notes(size));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("notes", size), &size, |b, _| {
            let mut index = BacklinksIndex::open_in_memory().unwrap();
            b.iter(|| {
                index
                    .rebuild(links.iter().map(|(p, l)| (p.as_str(), l.as_slice())))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_backlinks_lookup(c: &mut Criterion) {
    let notes = generate_notes(1000);
    let links = links_of(&notes);
    let mut index = BacklinksIndex::open_in_memory().unwrap();
    index
        .rebuild(links.iter().map(|(p, l)| (p.as_str(), l.as_slice())))
        .unwrap();
    let target = note_path(1);

    let mut group = c.benchmark_group("backlinks_lookup");
    group.bench_function("get_backlinks", |b| {
        b.iter(|| index.get_backlinks(&target).unwrap())
    });
    group.bench_function("get_outgoing", |b| {
        b.iter(|| index.get_outgoing(notes[0].path()).unwrap())
    });
    group.finish();

    c.bench_function("backlinks_update_single_note", |b| {
        let mut i = 0;
        b.iter(|| {
            let (path, note_links) = &links[i % links.len()];
            index.update_note_links(path, note_links).unwrap();
            i += 1;
        })
    });
}

criterion_group!(
    benches,
    bench_search_rebuild,
    bench_search_update,
    bench_search_query,
    bench_backlinks_rebuild,
    bench_backlinks_lookup,
);
criterion_main!(benches);
