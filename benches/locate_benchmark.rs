//! Benchmarks for placeholder location and batch building.
//!
//! Run with: cargo bench
//!
//! Documents are synthetic: paragraphs of filler text with tokens spread
//! through nested tables.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docfill::locate::{find_all_occurrences, find_occurrences, Placeholder};
use docfill::model::{Block, Document, Paragraph, Table, TableCell, TableRow};
use docfill::mutate::{build_replacement_batch, Replacement};

/// Creates a document with `sections` sections, each a paragraph plus a
/// two-level table.
fn create_document(sections: usize) -> Document {
    let mut blocks: Vec<Block> = Vec::with_capacity(sections * 2);
    for i in 0..sections {
        blocks.push(
            Paragraph::with_text(format!(
                "Section {} lorem ipsum dolor sit amet {{{{field_{}}}}} consectetur",
                i,
                i % 10
            ))
            .into(),
        );
        let inner = Table::with_rows(vec![TableRow::from_strings(["{{name}}", "value"])]);
        let outer = Table::with_rows(vec![
            TableRow::from_strings(["key", "{{name}} and more text"]),
            TableRow::new(vec![TableCell::text("nested"), TableCell::table(inner)]),
        ]);
        blocks.push(outer.into());
    }
    Document::from_blocks("bench", blocks)
}

fn bench_find_occurrences(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_occurrences");
    let name = Placeholder::new("name").unwrap();

    for sections in [10, 100, 1000] {
        let doc = create_document(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &doc, |b, doc| {
            b.iter(|| find_occurrences(black_box(doc), black_box(&name)));
        });
    }
    group.finish();
}

fn bench_find_all(c: &mut Criterion) {
    let doc = create_document(500);
    let placeholders: Vec<Placeholder> = (0..10)
        .map(|i| Placeholder::new(format!("field_{}", i)).unwrap())
        .chain(std::iter::once(Placeholder::new("name").unwrap()))
        .collect();

    c.bench_function("find_all_occurrences_500", |b| {
        b.iter(|| find_all_occurrences(black_box(&doc), black_box(&placeholders)));
    });
}

fn bench_build_batch(c: &mut Criterion) {
    let doc = create_document(1000);
    let occurrences = find_occurrences(&doc, &Placeholder::new("name").unwrap());
    let replacement = Replacement::text("A considerably longer replacement value");

    c.bench_function("build_replacement_batch_2000", |b| {
        b.iter(|| build_replacement_batch(black_box(&occurrences), black_box(&replacement)));
    });
}

criterion_group!(benches, bench_find_occurrences, bench_find_all, bench_build_batch);
criterion_main!(benches);
