//! # docfill
//!
//! Template placeholder resolution for offset-addressed documents.
//!
//! A remote document is a tree of paragraphs and (nested) tables in which
//! every node is addressed by one global offset space. Any insertion or
//! deletion shifts everything after it, so this crate locates `{{name}}`
//! tokens anywhere in the tree and builds edit batches ordered from the
//! highest offset down, which keeps every pending occurrence valid.
//!
//! ## Quick Start
//!
//! ```
//! use docfill::{find_occurrences, build_replacement_batch, Placeholder, Replacement};
//! use docfill::model::{Document, Paragraph};
//! use docfill::service::apply_batch;
//!
//! fn main() -> docfill::Result<()> {
//!     let doc = Document::from_blocks(
//!         "report",
//!         vec![Paragraph::with_text("Artist: {{artist}}. Signed by {{artist}}.").into()],
//!     );
//!
//!     let artist = Placeholder::new("artist")?;
//!     let occurrences = find_occurrences(&doc, &artist);
//!     let ops = build_replacement_batch(&occurrences, &Replacement::text("J. Doe"));
//!
//!     let filled = apply_batch(&doc, &ops)?;
//!     assert_eq!(filled.plain_text(), "Artist: J. Doe. Signed by J. Doe.\n");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Nested tables**: tokens are found at any table depth
//! - **Offset-safe batches**: descending order, chunked without splitting pairs
//! - **Image sizing**: aspect ratio preserved inside per-category boxes
//! - **Gallery grid**: rows of thumbnails with per-image text fallback
//! - **Idempotency gate**: skips the expensive similarity analysis when done
//! - **Phased fill**: [`fill::Filler`] runs every pass against a [`service::DocumentService`]

pub mod error;
pub mod fill;
pub mod gallery;
pub mod gate;
pub mod locate;
pub mod model;
pub mod mutate;
pub mod service;
pub mod sizing;

// Re-export commonly used types
pub use error::{Error, Result};
pub use fill::{FieldValues, FillOptions, FillReport, Filler, Phase, PhaseOutcome};
pub use gallery::{layout_gallery, plan_gallery, GalleryItem, GalleryOptions, GalleryPlan};
pub use gate::{should_populate_gallery, GalleryState};
pub use locate::{find_all_occurrences, find_occurrences, Occurrence, Placeholder};
pub use model::{Block, Document, DocumentOffset, OffsetRange, Paragraph, Run, Table};
pub use mutate::{build_replacement_batch, Batch, BatchBuilder, EditOperation, Replacement};
pub use service::{DocumentService, FetchedImage, ImageFetcher, SimilarityAnalyzer};
pub use sizing::{compute_dimensions, fit_within, Dimensions, ImageCategory, SizingOptions};

use std::path::Path;

/// Load a document snapshot from a JSON file.
///
/// Offsets are recomputed from the content, so snapshots may omit them.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document> {
    let data = std::fs::read_to_string(path)?;
    parse_document(&data)
}

/// Parse a document snapshot from JSON.
///
/// Offsets are recomputed from the content, so snapshots may omit them.
/// Paragraphs missing their terminating newline get one.
pub fn parse_document(json: &str) -> Result<Document> {
    let mut doc: Document = serde_json::from_str(json)?;
    doc.normalize();
    Ok(doc)
}

/// Serialize a document snapshot to pretty JSON.
pub fn document_to_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_assigns_offsets() {
        let json = r#"{
            "id": "d",
            "body": [
                {"type": "paragraph", "runs": [{"type": "text", "content": "ab\n"}]},
                {"type": "table", "rows": [{"cells": [{"content": [
                    {"type": "paragraph", "runs": [{"type": "text", "content": "{{x}}\n"}]}
                ]}]}]}
            ]
        }"#;
        let doc = parse_document(json).unwrap();
        assert!(doc.validate().is_ok());

        let found = find_occurrences(&doc, &Placeholder::new("x").unwrap());
        // "ab\n" is 1..4; table, row and cell add one unit each.
        assert_eq!(found, vec![Occurrence::new(7, 12)]);
    }

    #[test]
    fn test_parse_document_terminates_paragraphs() {
        let json = r#"{
            "id": "d",
            "body": [
                {"type": "paragraph", "runs": [{"type": "text", "content": "Artist: {{artist}}"}]},
                {"type": "table", "rows": [{"cells": [{"content": [
                    {"type": "paragraph", "runs": [{"type": "text", "content": "{{artist}}"}]}
                ]}]}]}
            ]
        }"#;
        let doc = parse_document(json).unwrap();
        assert_eq!(doc.plain_text().matches('\n').count(), 2);

        let found = find_occurrences(&doc, &Placeholder::new("artist").unwrap());
        assert_eq!(found.len(), 2);
        let ops = build_replacement_batch(&found, &Replacement::text("Jane"));
        let filled = service::apply_batch(&doc, &ops).unwrap();
        assert!(filled.plain_text().starts_with("Artist: Jane\n"));
        assert!(!filled.plain_text().contains("{{"));
    }

    #[test]
    fn test_parse_document_rejects_garbage() {
        assert!(matches!(parse_document("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_document_json_roundtrip() {
        let doc = Document::from_blocks("d", vec![Paragraph::with_text("hello").into()]);
        let json = document_to_json(&doc).unwrap();
        assert_eq!(parse_document(&json).unwrap(), doc);
    }
}
