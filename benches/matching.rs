//! cargo bench --bench matching
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use linrex::Regex;

pub fn criterion_benchmark(c: &mut Criterion) {
    {
        let re = Regex::new(r"\w+@\w+\.\w+").unwrap();
        let haystack = "contact us at support@example.com or sales@example.org";
        assert!(re.is_match(haystack));
        c.bench_function("find_literal_ish_email", |b| {
            b.iter(|| re.find(black_box(haystack)))
        });
    }

    {
        let re = Regex::new(r"[a-zA-Z0-9_]+").unwrap();
        let haystack = "the quick brown fox jumps over the lazy dog ".repeat(50);
        c.bench_function("find_iter_words_50x", |b| {
            b.iter(|| re.find_iter(black_box(&haystack)).count())
        });
    }

    {
        // A backtracking engine is exponential on this pattern; this one is linear.
        let re = Regex::new(r"(a+)+b").unwrap();
        let haystack = format!("{}c", "a".repeat(10_000));
        assert!(!re.is_match(&haystack));
        c.bench_function("redos_pattern_10000_as", |b| {
            b.iter(|| re.is_match(black_box(&haystack)))
        });
    }

    {
        let re = Regex::builder(r"(a+)(a+)").longest(true).build().unwrap();
        let haystack = "a".repeat(1000);
        c.bench_function("leftmost_longest_1000_as", |b| {
            b.iter(|| re.find(black_box(&haystack)))
        });
    }

    {
        let re = Regex::new(r"\bword\b").unwrap();
        let haystack = "a word sat alone in a sentence with many words around it ".repeat(20);
        c.bench_function("word_boundary_scan", |b| {
            b.iter(|| re.find_iter(black_box(&haystack)).count())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
