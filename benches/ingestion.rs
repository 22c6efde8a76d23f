//! Parse throughput on generated input.
//!
//! Run with: cargo bench --bench ingestion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use typed_csv_store::ingestion::{coerce, parse, LoaderOptions, Tokenizer};
use typed_csv_store::types::Schema;

fn generate(rows: usize) -> String {
    let mut text = String::from("id,name,score,active,note\n");
    for i in 0..rows {
        text.push_str(&format!(
            "{i},user_{i},{}.{},{},\"said \"\"hi\"\" #{i}\"\n",
            i % 100,
            i % 10,
            i % 2 == 0
        ));
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let schema = Schema::from_names(["id", "name", "score", "active", "note"]);
    let opts = LoaderOptions::default();
    let mut group = c.benchmark_group("parse");

    for rows in [1_000usize, 10_000, 100_000] {
        let text = generate(rows);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &text, |b, text| {
            b.iter(|| parse(black_box(text), &schema, &opts).map(|s| s.row_count()))
        });
    }
    group.finish();
}

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = Tokenizer::default();
    let mut group = c.benchmark_group("tokenize_line");

    group.bench_function("unquoted", |b| {
        b.iter(|| tokenizer.tokenize(black_box("12345,alice,98.5,true,plain note")).map(|f| f.len()))
    });
    group.bench_function("escaped", |b| {
        b.iter(|| tokenizer.tokenize(black_box(r#"12345,"alice, a","say ""hi""",true,"x""#)).map(|f| f.len()))
    });
    group.finish();
}

fn bench_coerce(c: &mut Criterion) {
    let mut group = c.benchmark_group("coerce");
    for text in ["42", "42.5", "TRUE", "hello world", "123456789012345678901234567890"] {
        group.bench_with_input(BenchmarkId::from_parameter(text), text, |b, text| {
            b.iter(|| coerce(black_box(text)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_tokenize, bench_coerce);
criterion_main!(benches);
