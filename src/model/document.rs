//! Document-level types and traversal.

use super::offset::{utf16_len, DocumentOffset, OffsetRange};
use super::paragraph::OBJECT_REPLACEMENT;
use super::{Block, Paragraph, Run, TextRun};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::slice;

/// Offset of the first body element. Offset 0 belongs to the body itself.
pub const BODY_START: DocumentOffset = 1;

/// A read-only snapshot of a remote document.
///
/// Snapshots are never mutated to track remote edits; callers re-read the
/// document after every batch that later work depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Remote document identifier
    #[serde(default)]
    pub id: String,

    /// Document title, if the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Revision counter reported by the service
    #[serde(default)]
    pub revision: u64,

    /// Body blocks in document order
    pub body: Vec<Block>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            revision: 0,
            body: Vec::new(),
        }
    }

    /// Build a document from blocks, assigning offsets from [`BODY_START`].
    pub fn from_blocks(id: impl Into<String>, body: Vec<Block>) -> Self {
        let mut doc = Self::new(id);
        doc.body = body;
        doc.reindex();
        doc
    }

    /// Add a block and reassign offsets.
    pub fn push(&mut self, block: impl Into<Block>) {
        self.body.push(block.into());
        self.reindex();
    }

    /// Recompute every node's offsets from the content.
    pub fn reindex(&mut self) {
        reindex_blocks(&mut self.body, BODY_START);
    }

    /// Give every paragraph its terminating newline, then reindex.
    ///
    /// Hand-written snapshots often leave the newline out.
    pub fn normalize(&mut self) {
        terminate_blocks(&mut self.body);
        self.reindex();
    }

    /// Offset just past the last body element.
    pub fn end_offset(&self) -> DocumentOffset {
        self.body.last().map(|b| b.range().end).unwrap_or(BODY_START)
    }

    /// Check if the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// All paragraphs in document order, descending into table cells at any depth.
    pub fn paragraphs(&self) -> Paragraphs<'_> {
        Paragraphs {
            stack: vec![self.body.iter()],
        }
    }

    pub(crate) fn paragraphs_mut(&mut self) -> ParagraphsMut<'_> {
        ParagraphsMut {
            stack: vec![self.body.iter_mut()],
        }
    }

    /// All inline runs in document order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> + '_ {
        self.paragraphs().flat_map(|p| p.runs.iter())
    }

    /// All text runs in document order.
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> + '_ {
        self.runs().filter_map(Run::as_text)
    }

    /// Number of inline images in the document.
    pub fn image_count(&self) -> usize {
        self.paragraphs().map(Paragraph::image_count).sum()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.paragraphs().map(Paragraph::plain_text).collect()
    }

    /// Text covered by `range`; inline images appear as U+FFFC and
    /// structural units are skipped.
    pub fn text_in_range(&self, range: OffsetRange) -> String {
        let mut out = String::new();
        for run in self.runs() {
            let Some(overlap) = run.range().intersection(&range) else {
                continue;
            };
            match run {
                Run::Text(t) => {
                    if let Some(s) = t.slice(overlap) {
                        out.push_str(s);
                    }
                }
                Run::InlineImage(_) => out.push(OBJECT_REPLACEMENT),
            }
        }
        out
    }

    /// Check the offset invariants of a snapshot received from a service.
    ///
    /// Nodes must appear in ascending, non-overlapping order; text runs must
    /// span exactly their UTF-16 length and inline images exactly one unit.
    pub fn validate(&self) -> Result<()> {
        let mut last_end = 0;
        validate_blocks(&self.body, &mut last_end)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(String::new())
    }
}

pub(crate) fn reindex_blocks(blocks: &mut [Block], mut cursor: DocumentOffset) -> DocumentOffset {
    for block in blocks {
        cursor = block.reindex(cursor);
    }
    cursor
}

fn terminate_blocks(blocks: &mut [Block]) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => p.terminate(),
            Block::Table(t) => {
                for cell in t.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    terminate_blocks(&mut cell.content);
                }
            }
        }
    }
}

fn check_order(range: OffsetRange, last_end: &mut DocumentOffset, what: &str) -> Result<()> {
    if range.start < *last_end || range.end < range.start {
        return Err(Error::InvalidDocument(format!(
            "{} at {} overlaps preceding content ending at {}",
            what, range, last_end
        )));
    }
    Ok(())
}

fn validate_blocks(blocks: &[Block], last_end: &mut DocumentOffset) -> Result<()> {
    for block in blocks {
        match block {
            Block::Paragraph(p) => {
                check_order(p.range, last_end, "paragraph")?;
                *last_end = p.range.start;
                for run in &p.runs {
                    let range = run.range();
                    check_order(range, last_end, "run")?;
                    let expected = match run {
                        Run::Text(t) => utf16_len(&t.content),
                        Run::InlineImage(_) => 1,
                    };
                    if range.len() != expected {
                        return Err(Error::InvalidDocument(format!(
                            "run at {} spans {} units but holds {}",
                            range,
                            range.len(),
                            expected
                        )));
                    }
                    if !p.range.encloses(&range) {
                        return Err(Error::InvalidDocument(format!(
                            "run at {} lies outside its paragraph {}",
                            range, p.range
                        )));
                    }
                    *last_end = range.end;
                }
                *last_end = p.range.end;
            }
            Block::Table(t) => {
                check_order(t.range, last_end, "table")?;
                *last_end = t.range.start;
                for cell in t.rows.iter().flat_map(|r| &r.cells) {
                    check_order(cell.range, last_end, "table cell")?;
                    *last_end = cell.range.start;
                    validate_blocks(&cell.content, last_end)?;
                    if *last_end > cell.range.end {
                        return Err(Error::InvalidDocument(format!(
                            "table cell {} is shorter than its content",
                            cell.range
                        )));
                    }
                    *last_end = cell.range.end;
                }
                if *last_end > t.range.end {
                    return Err(Error::InvalidDocument(format!(
                        "table {} is shorter than its cells",
                        t.range
                    )));
                }
                *last_end = t.range.end;
            }
        }
    }
    Ok(())
}

/// Depth-first iterator over paragraphs, including those nested in tables.
///
/// Uses an explicit stack so table nesting depth is unbounded.
pub struct Paragraphs<'a> {
    stack: Vec<slice::Iter<'a, Block>>,
}

impl<'a> Iterator for Paragraphs<'a> {
    type Item = &'a Paragraph;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Block::Paragraph(p)) => return Some(p),
                Some(Block::Table(t)) => {
                    // Last cell pushed first so the first cell is visited first.
                    for cell in t.rows.iter().flat_map(|r| r.cells.iter()).rev() {
                        self.stack.push(cell.content.iter());
                    }
                }
            }
        }
    }
}

pub(crate) struct ParagraphsMut<'a> {
    stack: Vec<slice::IterMut<'a, Block>>,
}

impl<'a> Iterator for ParagraphsMut<'a> {
    type Item = &'a mut Paragraph;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Block::Paragraph(p)) => return Some(p),
                Some(Block::Table(t)) => {
                    for cell in t.rows.iter_mut().flat_map(|r| r.cells.iter_mut()).rev() {
                        self.stack.push(cell.content.iter_mut());
                    }
                }
            }
        }
    }
}
