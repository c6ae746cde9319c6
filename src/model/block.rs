//! Block-level content.

use super::offset::{DocumentOffset, OffsetRange};
use super::{Paragraph, Table};
use serde::{Deserialize, Serialize};

/// A structural block in the document body or a table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of inline runs
    Paragraph(Paragraph),

    /// A table, whose cells hold further blocks
    Table(Table),
}

impl Block {
    /// Offset range covered by the block.
    pub fn range(&self) -> OffsetRange {
        match self {
            Block::Paragraph(p) => p.range,
            Block::Table(t) => t.range,
        }
    }

    /// Plain text of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.plain_text(),
            Block::Table(t) => t.plain_text(),
        }
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    pub(crate) fn reindex(&mut self, cursor: DocumentOffset) -> DocumentOffset {
        match self {
            Block::Paragraph(p) => p.reindex(cursor),
            Block::Table(t) => t.reindex(cursor),
        }
    }
}

impl From<Paragraph> for Block {
    fn from(p: Paragraph) -> Self {
        Block::Paragraph(p)
    }
}

impl From<Table> for Block {
    fn from(t: Table) -> Self {
        Block::Table(t)
    }
}
