//! End-to-end tests for the fill pipeline against the in-memory service.

use docfill::error::{Error, Result};
use docfill::fill::{FieldValues, FillOptions, Filler, Phase, PhaseOutcome};
use docfill::gate::GalleryState;
use docfill::model::{Document, InlineImage, Paragraph, Run, Table, TableCell, TableRow};
use docfill::service::{MemoryDocumentService, MemoryImageFetcher, SimilarityAnalyzer};
use docfill::sizing::SizingOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const MAIN: &str = "https://img.test/main.png";
const SIGNATURE: &str = "https://img.test/signature.png";

struct StubAnalyzer {
    urls: Vec<String>,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SimilarityAnalyzer for StubAnalyzer {
    async fn find_similar(&self) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.urls.clone())
    }
}

fn template() -> Document {
    let nested = Table::with_rows(vec![TableRow::from_strings(["{{main_image}}"])]);
    let details = Table::with_rows(vec![
        TableRow::from_strings(["Medium", "{{medium}}"]),
        TableRow::new(vec![TableCell::text("Photo"), TableCell::table(nested)]),
    ]);
    Document::from_blocks(
        "report",
        vec![
            Paragraph::with_text("Oil on Canvas").into(),
            Paragraph::with_text("Artist: {{artist}} ({{artist}})").into(),
            details.into(),
            Paragraph::with_text("{{gallery}}").into(),
            Paragraph::with_text("Signature: {{signature_image}}").into(),
        ],
    )
}

fn gallery_urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://img.test/similar-{}.png", i)).collect()
}

fn fetcher(gallery: &[String]) -> MemoryImageFetcher {
    let fetcher = MemoryImageFetcher::new().with_png(MAIN, 800, 400).unwrap();
    gallery.iter().fold(fetcher, |f, url| f.with_png(url.clone(), 300, 300).unwrap())
}

fn options() -> FillOptions {
    FillOptions::default().with_sizing(SizingOptions::default().with_retry_delay(Duration::ZERO))
}

fn values() -> FieldValues {
    FieldValues::new()
        .with_text("artist", "  Jane   Doe ")
        .with_text("medium", "Oil")
        .with_image("main_image", MAIN)
        .with_image("signature_image", SIGNATURE)
        .with_title("oil on canvas")
}

fn image<'a>(doc: &'a Document, uri: &str) -> Option<&'a InlineImage> {
    doc.runs().find_map(|run| match run {
        Run::InlineImage(img) if img.uri == uri => Some(img),
        _ => None,
    })
}

#[tokio::test]
async fn test_full_fill() {
    let urls = gallery_urls(4);
    let service = MemoryDocumentService::new().with_document(template());
    let fetcher = fetcher(&urls);
    let analyzer = StubAnalyzer::new(urls.clone());

    let report = Filler::new(&service, &fetcher)
        .with_analyzer(&analyzer)
        .with_options(options())
        .fill("report", &values(), None)
        .await
        .unwrap();

    assert!(report.is_complete(), "{:?}", report);
    assert_eq!(analyzer.calls(), 1);

    let doc = service.document("report").unwrap();
    let text = doc.plain_text();
    assert!(!text.contains("{{"), "{}", text);
    assert!(text.contains("Artist: Jane Doe (Jane Doe)"));
    assert!(text.contains("Oil\n"));
    assert_eq!(doc.image_count(), 2 + urls.len());
    assert!(doc.validate().is_ok());

    // 800x400 into the 400x300 main box.
    let main = image(&doc, MAIN).unwrap();
    assert_eq!((main.width, main.height), (400, 200));
    // Unreachable: falls back to the signature box.
    let signature = image(&doc, SIGNATURE).unwrap();
    assert_eq!((signature.width, signature.height), (200, 150));

    let title = doc.text_runs().next().unwrap();
    assert_eq!(title.style.font_size, Some(18.0));
}

#[tokio::test]
async fn test_populated_gallery_skips_analysis() {
    let service = MemoryDocumentService::new().with_document(template());
    let fetcher = fetcher(&[]);
    let analyzer = StubAnalyzer::new(gallery_urls(3));
    let state: GalleryState =
        serde_json::from_str(r#"{"_gallery_populated": "1", "googlevision": [101, 102]}"#).unwrap();

    let report = Filler::new(&service, &fetcher)
        .with_analyzer(&analyzer)
        .with_options(options())
        .fill("report", &values(), Some(&state))
        .await
        .unwrap();

    assert_eq!(analyzer.calls(), 0);
    assert!(matches!(
        report.phase(Phase::Analysis),
        Some(PhaseOutcome::Skipped { .. })
    ));

    // No gallery URLs: the anchor becomes the empty message.
    let doc = service.document("report").unwrap();
    assert!(doc
        .plain_text()
        .contains(&options().gallery.empty_message));
}

#[tokio::test]
async fn test_rejected_image_field_falls_back_to_text() {
    let service = MemoryDocumentService::new().with_document(template());
    service.reject_image_uri(MAIN);
    let fetcher = fetcher(&[]);

    let report = Filler::new(&service, &fetcher)
        .with_options(options())
        .fill("report", &values(), None)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert!(report.warnings.iter().any(|w| w.contains("{{main_image}}")));

    let doc = service.document("report").unwrap();
    assert!(image(&doc, MAIN).is_none());
    assert!(image(&doc, SIGNATURE).is_some());
    assert!(doc.plain_text().contains(&options().gallery.unavailable_text));
    assert!(!doc.plain_text().contains("{{main_image}}"));
}

#[tokio::test]
async fn test_failed_phase_does_not_stop_later_phases() {
    // Text replacement needs 6 operations in one batch; the service takes 3.
    let service = MemoryDocumentService::new()
        .with_document(template())
        .with_max_batch_operations(3);
    let urls = gallery_urls(2);
    let fetcher = fetcher(&urls);
    let values = values().with_gallery(urls);

    let report = Filler::new(&service, &fetcher)
        .with_options(options())
        .fill("report", &values, None)
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert!(report.phase(Phase::Placeholders).unwrap().is_failed());
    assert!(matches!(
        report.phase(Phase::Gallery),
        Some(PhaseOutcome::Applied { .. })
    ));

    let doc = service.document("report").unwrap();
    assert!(doc.plain_text().contains("{{artist}}"));
    assert!(!doc.plain_text().contains("{{gallery}}"));
    assert_eq!(image(&doc, MAIN).map(|i| i.width), Some(400));
}

#[tokio::test]
async fn test_invalid_field_name_is_fatal() {
    let service = MemoryDocumentService::new().with_document(template());
    let fetcher = MemoryImageFetcher::new();
    let analyzer = StubAnalyzer::new(gallery_urls(2));
    let values = FieldValues::new().with_text("not valid", "x");

    let err = Filler::new(&service, &fetcher)
        .with_analyzer(&analyzer)
        .fill("report", &values, None)
        .await
        .unwrap_err();

    match err {
        Error::InvalidInput { field, .. } => assert_eq!(field, "not valid"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(service.batch_count(), 0);
    // Analysis is not spent on a run that cannot proceed.
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test]
async fn test_replace_all_mode() {
    let service = MemoryDocumentService::new().with_document(template());
    let fetcher = fetcher(&[]);
    let values = FieldValues::new().with_text("artist", "Jane Doe");

    Filler::new(&service, &fetcher)
        .with_options(options().with_replace_all(true))
        .fill("report", &values, None)
        .await
        .unwrap();

    let history = service.history("report");
    assert_eq!(history[0].len(), 1);
    assert!(service
        .document("report")
        .unwrap()
        .plain_text()
        .contains("Artist: Jane Doe (Jane Doe)"));
}

#[tokio::test]
async fn test_gallery_batches_follow_operation_limit() {
    let service = MemoryDocumentService::new()
        .with_document(template())
        .with_max_batch_operations(5);
    let urls = gallery_urls(10);
    let fetcher = fetcher(&urls);
    let values = FieldValues::new().with_gallery(urls);

    let report = Filler::new(&service, &fetcher)
        .with_options(options().with_max_batch_operations(5))
        .fill("report", &values, None)
        .await
        .unwrap();

    assert!(report.is_complete(), "{:?}", report);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let history = service.history("report");
    assert!(history.iter().all(|b| b.len() <= 5));
    assert_eq!(service.document("report").unwrap().image_count(), 10);
}
