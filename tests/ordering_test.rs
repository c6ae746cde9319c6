//! Regression tests for batch ordering and no-op behaviour.

use docfill::locate::{find_occurrences, Occurrence, Placeholder};
use docfill::model::{Document, Paragraph, Table, TableCell, TableRow};
use docfill::mutate::{build_replacement_batch, BatchBuilder, EditOperation, Replacement};
use docfill::service::{apply_batch, DocumentService, MemoryDocumentService, MemoryImageFetcher};
use docfill::{FieldValues, Filler};

fn ascending_batch(occurrences: &[Occurrence], text: &str) -> Vec<EditOperation> {
    let mut sorted = occurrences.to_vec();
    sorted.sort_by_key(|o| o.start);
    sorted
        .iter()
        .flat_map(|o| [EditOperation::delete(*o), EditOperation::insert_text(o.start, text)])
        .collect()
}

#[test]
fn test_ascending_order_corrupts_later_occurrences() {
    let doc = Document::from_blocks(
        "doc",
        vec![Paragraph::with_text("{{v}} and {{v}} end").into()],
    );
    let v = Placeholder::new("v").unwrap();
    let occurrences = find_occurrences(&doc, &v);
    assert_eq!(occurrences.len(), 2);

    let value = "a much longer value";
    let expected = format!("{} and {} end\n", value, value);

    let ascending = apply_batch(&doc, &ascending_batch(&occurrences, value)).unwrap();
    assert_ne!(ascending.plain_text(), expected);
    assert!(ascending.plain_text().contains("{{v}}"));

    let descending =
        apply_batch(&doc, &build_replacement_batch(&occurrences, &Replacement::text(value))).unwrap();
    assert_eq!(descending.plain_text(), expected);
}

#[test]
fn test_shorter_replacement_ascending_also_breaks() {
    let doc = Document::from_blocks(
        "doc",
        vec![Paragraph::with_text("{{long_name}}: {{long_name}}.").into()],
    );
    let p = Placeholder::new("long_name").unwrap();
    let occurrences = find_occurrences(&doc, &p);

    // The second delete now reaches past the paragraph and is rejected.
    assert!(apply_batch(&doc, &ascending_batch(&occurrences, "x")).is_err());

    let ok = apply_batch(&doc, &build_replacement_batch(&occurrences, &Replacement::text("x")))
        .unwrap();
    assert_eq!(ok.plain_text(), "x: x.\n");
}

#[test]
fn test_descending_across_nested_tables() {
    let inner = Table::with_rows(vec![TableRow::from_strings(["{{v}}", "keep"])]);
    let outer = Table::with_rows(vec![TableRow::new(vec![
        TableCell::text("{{v}} outer"),
        TableCell::table(inner),
    ])]);
    let doc = Document::from_blocks(
        "doc",
        vec![
            Paragraph::with_text("{{v}}").into(),
            outer.into(),
            Paragraph::with_text("tail {{v}}").into(),
        ],
    );
    let v = Placeholder::new("v").unwrap();
    let occurrences = find_occurrences(&doc, &v);
    assert_eq!(occurrences.len(), 4);

    let out = apply_batch(&doc, &build_replacement_batch(&occurrences, &Replacement::text("value")))
        .unwrap();
    let texts: Vec<_> = out.paragraphs().map(Paragraph::plain_text).collect();
    assert_eq!(
        texts,
        vec!["value\n", "value outer\n", "value\n", "keep\n", "tail value\n"]
    );
    assert!(out.validate().is_ok());
}

#[test]
fn test_zero_occurrences_is_a_no_op() {
    let doc = Document::from_blocks("doc", vec![Paragraph::with_text("no tokens here").into()]);
    let v = Placeholder::new("v").unwrap();

    let occurrences = find_occurrences(&doc, &v);
    assert!(occurrences.is_empty());
    assert!(build_replacement_batch(&occurrences, &Replacement::text("x")).is_empty());

    let mut builder = BatchBuilder::new();
    builder.replace(occurrences, &Replacement::text("x"));
    assert!(builder.build().batches.is_empty());
}

#[tokio::test]
async fn test_fill_without_placeholders_submits_nothing() {
    let doc = Document::from_blocks("doc", vec![Paragraph::with_text("static text").into()]);
    let service = MemoryDocumentService::new().with_document(doc.clone());
    let fetcher = MemoryImageFetcher::new();

    let values = FieldValues::new()
        .with_text("artist", "Someone")
        .with_image("main_image", "https://img.test/a.png");
    let report = Filler::new(&service, &fetcher)
        .fill("doc", &values, None)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.operation_count(), 0);
    assert_eq!(service.batch_count(), 0);
    assert_eq!(service.read("doc").await.unwrap().plain_text(), doc.plain_text());
    assert_eq!(report.warnings.len(), 2);
}
