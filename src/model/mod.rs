//! Offset-indexed document model.
//!
//! This module defines the read view of a remote document: an ordered tree
//! of paragraphs and (arbitrarily nested) tables whose nodes all share one
//! global offset space. Snapshots are treated as immutable; any remote edit
//! invalidates the offsets of everything after it.

mod block;
mod document;
mod offset;
mod paragraph;
mod table;

pub use block::Block;
pub use document::{Document, Paragraphs, BODY_START};
pub use offset::{utf16_len, utf16_to_byte, DocumentOffset, OffsetRange};
pub use paragraph::{
    Alignment, InlineImage, Paragraph, ParagraphStyle, Run, TextRun, TextStyle, OBJECT_REPLACEMENT,
};
pub use table::{Table, TableCell, TableRow};
