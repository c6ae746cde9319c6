//! Edit operations and the batch builder.
//!
//! A remote document applies a batch's operations in array order, each one
//! against the state left by the previous ones. The builder keeps this safe
//! by emitting replacements from the highest offset down.
//!
//! # Example
//!
//! ```
//! use docfill::locate::{find_occurrences, Placeholder};
//! use docfill::model::{Document, Paragraph};
//! use docfill::mutate::{build_replacement_batch, EditOperation, Replacement};
//!
//! let doc = Document::from_blocks(
//!     "doc",
//!     vec![Paragraph::with_text("{{v}} then {{v}}").into()],
//! );
//! let v = Placeholder::new("v").unwrap();
//! let ops = build_replacement_batch(&find_occurrences(&doc, &v), &Replacement::text("42"));
//!
//! // The later occurrence is handled first.
//! assert_eq!(ops[1], EditOperation::insert_text(12, "42"));
//! assert_eq!(ops[3], EditOperation::insert_text(1, "42"));
//! ```

mod builder;
mod operation;
mod sanitize;

pub use builder::{
    build_replacement_batch, chunk_groups, is_valid_image_uri, BatchBuilder, BatchPlan, Edit,
    Replacement, DEFAULT_MAX_BATCH_OPERATIONS,
};
pub use operation::{
    Batch, EditOperation, ParagraphStyleUpdate, StyleUpdate, TextStyleUpdate,
};
pub use sanitize::{sanitize_text, TextSanitizer, PARAGRAPH_BREAK};
