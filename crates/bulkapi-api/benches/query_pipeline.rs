//! Bench filter parsing, compilation and materialization of a full page.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use serde_json::{json, Map, Value};

use bulkapi::{compile, materialize, FieldSpec, FilterNode, QueryOptions, MAX_PAGE_SIZE, Q};

const FILTER_TEXT: &str = r#"
or:
  - question__startswith: Who
  - question__startswith: What
    integer__gte: 1
not:
  author__username__in: [bot, importer]
"#;

fn make_rows(n: usize) -> Vec<Map<String, Value>> {
    (0..n)
        .map(|i| {
            let mut row = Map::new();
            row.insert("id".to_string(), json!(i));
            row.insert("question".to_string(), json!(format!("Who asked {i}?")));
            if i % 3 != 0 {
                row.insert("integer".to_string(), json!(i * 7));
            }
            row.insert("author__username".to_string(), json!("pat"));
            row
        })
        .collect()
}

fn bench_filter_forms(c: &mut Criterion) {
    c.bench_function("filter/from_text", |b| {
        b.iter(|| FilterNode::from_text(black_box(FILTER_TEXT)).unwrap())
    });

    c.bench_function("filter/builder", |b| {
        b.iter(|| {
            (Q::lookup("question__startswith", black_box("Who")).unwrap()
                | (Q::lookup("question__startswith", "What").unwrap()
                    & Q::lookup("integer__gte", 1).unwrap()))
                & !Q::lookup("author__username__in", vec!["bot", "importer"]).unwrap()
        })
    });
}

fn bench_compile(c: &mut Criterion) {
    let fields = FieldSpec::from_value(&json!(["id", "question", {"author__username": "author"}]))
        .unwrap();
    let options = QueryOptions::new()
        .with_filter(FilterNode::from_text(FILTER_TEXT).unwrap())
        .with_fields(fields)
        .with_order(["-id", "question"])
        .with_page_size(MAX_PAGE_SIZE);

    c.bench_function("compile/options", |b| {
        b.iter(|| compile(black_box(&options)).unwrap())
    });
}

fn bench_materialize(c: &mut Criterion) {
    let spec = FieldSpec::from_value(&json!(["id", "question", "integer", {"author__username": "author"}]))
        .unwrap();

    c.bench_function("materialize/page_with_spec", |b| {
        b.iter_batched(
            || make_rows(MAX_PAGE_SIZE),
            |rows| materialize(&rows, Some(&spec)),
            BatchSize::SmallInput,
        )
    });

    let rows = make_rows(MAX_PAGE_SIZE);
    c.bench_function("materialize/page_without_spec", |b| {
        b.iter(|| materialize(black_box(&rows), None))
    });
}

criterion_group!(benches, bench_filter_forms, bench_compile, bench_materialize);
criterion_main!(benches);
