//! Table types.
//!
//! Tables nest: every cell owns its own block sequence, which may hold
//! further tables.

use super::offset::{DocumentOffset, OffsetRange};
use super::{Block, Paragraph};
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Offset range covered by the whole table
    #[serde(default)]
    pub range: OffsetRange,

    /// Rows in the table
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            range: OffsetRange::default(),
            rows: Vec::new(),
        }
    }

    /// Create a table from rows.
    pub fn with_rows(rows: Vec<TableRow>) -> Self {
        Self {
            range: OffsetRange::default(),
            rows,
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (based on first row).
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Deepest table nesting below and including this table.
    pub fn depth(&self) -> usize {
        1 + self
            .rows
            .iter()
            .flat_map(|r| &r.cells)
            .flat_map(|c| &c.content)
            .filter_map(|b| match b {
                Block::Table(t) => Some(t.depth()),
                Block::Paragraph(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Assign offsets starting at `cursor`.
    ///
    /// The table start, every row start and every cell start each occupy one
    /// structural unit ahead of their content.
    pub(crate) fn reindex(&mut self, cursor: DocumentOffset) -> DocumentOffset {
        let start = cursor;
        let mut cursor = cursor + 1;
        for row in &mut self.rows {
            cursor = row.reindex(cursor);
        }
        self.range = OffsetRange::new(start, cursor);
        cursor
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

/// A table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Offset range covered by the row
    #[serde(default)]
    pub range: OffsetRange,

    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            range: OffsetRange::default(),
            cells,
        }
    }

    /// Create a row from text values, one paragraph per cell.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }

    fn reindex(&mut self, cursor: DocumentOffset) -> DocumentOffset {
        let start = cursor;
        let mut cursor = cursor + 1;
        for cell in &mut self.cells {
            cursor = cell.reindex(cursor);
        }
        self.range = OffsetRange::new(start, cursor);
        cursor
    }
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Offset range covered by the cell
    #[serde(default)]
    pub range: OffsetRange,

    /// Cell content
    pub content: Vec<Block>,
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Block::Paragraph(Paragraph::with_text(text))])
    }

    /// Create a cell holding a nested table.
    pub fn table(table: Table) -> Self {
        Self::with_content(vec![Block::Table(table)])
    }

    /// Create a cell with arbitrary block content.
    pub fn with_content(content: Vec<Block>) -> Self {
        Self {
            range: OffsetRange::default(),
            content,
        }
    }

    /// Get plain text content.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|b| b.plain_text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() || self.plain_text().trim().is_empty()
    }

    fn reindex(&mut self, cursor: DocumentOffset) -> DocumentOffset {
        let start = cursor;
        let cursor = super::document::reindex_blocks(&mut self.content, cursor + 1);
        self.range = OffsetRange::new(start, cursor);
        cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_table_reindex() {
        let mut table = Table::with_rows(vec![TableRow::from_strings(["ab", "c"])]);
        let end = table.reindex(10);

        // table(1) + row(1) + cell(1) + "ab\n"(3) + cell(1) + "c\n"(2)
        assert_eq!(end, 19);
        let cells = &table.rows[0].cells;
        assert_eq!(cells[0].range, OffsetRange::new(12, 16));
        assert_eq!(cells[1].range, OffsetRange::new(16, 19));
        assert_eq!(cells[1].content[0].range(), OffsetRange::new(17, 19));
    }

    #[test]
    fn test_nested_depth() {
        let inner = Table::with_rows(vec![TableRow::from_strings(["x"])]);
        let outer = Table::with_rows(vec![TableRow::new(vec![
            TableCell::table(inner),
            TableCell::text("y"),
        ])]);
        assert_eq!(outer.depth(), 2);
        assert_eq!(outer.column_count(), 2);
    }

    #[test]
    fn test_cell_text() {
        let cell = TableCell::text("Hello");
        assert_eq!(cell.plain_text(), "Hello\n");
        assert!(!cell.is_empty());
    }
}
