//! Primitive edit operations and batches.

use crate::model::{
    utf16_len, Alignment, DocumentOffset, OffsetRange, ParagraphStyle, TextStyle,
};
use serde::{Deserialize, Serialize};

/// One primitive edit, interpreted against the document state produced by
/// the operations before it in the same batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditOperation {
    /// Remove the units in `range`
    DeleteRange {
        /// Range to remove
        range: OffsetRange,
    },

    /// Insert text before the unit at `at`
    InsertText {
        /// Insertion offset
        at: DocumentOffset,
        /// Text to insert
        text: String,
    },

    /// Insert an inline image before the unit at `at`
    InsertImage {
        /// Insertion offset
        at: DocumentOffset,
        /// Image source URI
        uri: String,
        /// Width in points
        width: u32,
        /// Height in points
        height: u32,
    },

    /// Apply a style to a range
    UpdateStyle {
        /// Range to restyle
        range: OffsetRange,
        /// Style fields to set
        style: StyleUpdate,
    },

    /// Replace every literal occurrence of `find` in the document
    ReplaceAllText {
        /// Literal text to find
        find: String,
        /// Replacement text
        replace: String,
        /// Case-sensitive matching
        match_case: bool,
    },
}

impl EditOperation {
    /// Delete `range`.
    pub fn delete(range: impl Into<OffsetRange>) -> Self {
        EditOperation::DeleteRange {
            range: range.into(),
        }
    }

    /// Insert `text` at `at`.
    pub fn insert_text(at: DocumentOffset, text: impl Into<String>) -> Self {
        EditOperation::InsertText {
            at,
            text: text.into(),
        }
    }

    /// Insert an image at `at`.
    pub fn insert_image(at: DocumentOffset, uri: impl Into<String>, width: u32, height: u32) -> Self {
        EditOperation::InsertImage {
            at,
            uri: uri.into(),
            width,
            height,
        }
    }

    /// Apply a text style to `range`.
    pub fn text_style(range: OffsetRange, style: TextStyleUpdate) -> Self {
        EditOperation::UpdateStyle {
            range,
            style: StyleUpdate::Text(style),
        }
    }

    /// Apply a paragraph style to the paragraphs overlapping `range`.
    pub fn paragraph_style(range: OffsetRange, style: ParagraphStyleUpdate) -> Self {
        EditOperation::UpdateStyle {
            range,
            style: StyleUpdate::Paragraph(style),
        }
    }

    /// Replace every case-sensitive occurrence of `find` with `replace`.
    pub fn replace_all(find: impl Into<String>, replace: impl Into<String>) -> Self {
        EditOperation::ReplaceAllText {
            find: find.into(),
            replace: replace.into(),
            match_case: true,
        }
    }

    /// Net change in document length for positional operations.
    ///
    /// `ReplaceAllText` depends on document content and reports 0.
    pub fn unit_delta(&self) -> isize {
        match self {
            EditOperation::DeleteRange { range } => -(range.len() as isize),
            EditOperation::InsertText { text, .. } => utf16_len(text) as isize,
            EditOperation::InsertImage { .. } => 1,
            EditOperation::UpdateStyle { .. } | EditOperation::ReplaceAllText { .. } => 0,
        }
    }

    /// Lowest offset the operation touches, if it is positional.
    pub fn position(&self) -> Option<DocumentOffset> {
        match self {
            EditOperation::DeleteRange { range } | EditOperation::UpdateStyle { range, .. } => {
                Some(range.start)
            }
            EditOperation::InsertText { at, .. } | EditOperation::InsertImage { at, .. } => {
                Some(*at)
            }
            EditOperation::ReplaceAllText { .. } => None,
        }
    }

    /// Check if this operation inserts an image.
    pub fn is_image(&self) -> bool {
        matches!(self, EditOperation::InsertImage { .. })
    }

    /// Short operation name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EditOperation::DeleteRange { .. } => "delete_range",
            EditOperation::InsertText { .. } => "insert_text",
            EditOperation::InsertImage { .. } => "insert_image",
            EditOperation::UpdateStyle { .. } => "update_style",
            EditOperation::ReplaceAllText { .. } => "replace_all_text",
        }
    }
}

/// Style fields to set; `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleUpdate {
    /// Character-level style
    Text(TextStyleUpdate),

    /// Paragraph-level style
    Paragraph(ParagraphStyleUpdate),
}

/// Character style fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyleUpdate {
    /// Bold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,

    /// Italic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    /// Font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl TextStyleUpdate {
    /// Merge the set fields into `style`.
    pub fn apply_to(&self, style: &mut TextStyle) {
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(italic) = self.italic {
            style.italic = italic;
        }
        if let Some(size) = self.font_size {
            style.font_size = Some(size);
        }
    }

    /// Only set the font size.
    pub fn font_size(size: f32) -> Self {
        Self {
            font_size: Some(size),
            ..Default::default()
        }
    }
}

/// Paragraph style fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyleUpdate {
    /// Heading level (1-6)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,

    /// Alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    /// Line spacing percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f32>,

    /// Space above in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_above: Option<f32>,

    /// Space below in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_below: Option<f32>,
}

impl ParagraphStyleUpdate {
    /// Merge the set fields into `style`.
    pub fn apply_to(&self, style: &mut ParagraphStyle) {
        if let Some(level) = self.heading_level {
            style.heading_level = Some(level.clamp(1, 6));
        }
        if let Some(alignment) = self.alignment {
            style.alignment = alignment;
        }
        if let Some(spacing) = self.line_spacing {
            style.line_spacing = Some(spacing);
        }
        if let Some(above) = self.space_above {
            style.space_above = Some(above);
        }
        if let Some(below) = self.space_below {
            style.space_below = Some(below);
        }
    }

    /// Centered paragraph.
    pub fn centered() -> Self {
        Self {
            alignment: Some(Alignment::Center),
            ..Default::default()
        }
    }
}

/// An ordered list of operations submitted atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    operations: Vec<EditOperation>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn push(&mut self, op: EditOperation) {
        self.operations.push(op);
    }

    /// Append several operations.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = EditOperation>) {
        self.operations.extend(ops);
    }

    /// Operations in submission order.
    pub fn operations(&self) -> &[EditOperation] {
        &self.operations
    }

    /// Consume the batch into its operations.
    pub fn into_operations(self) -> Vec<EditOperation> {
        self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the batch has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of inline images the batch inserts.
    pub fn image_count(&self) -> usize {
        self.operations.iter().filter(|op| op.is_image()).count()
    }
}

impl From<Vec<EditOperation>> for Batch {
    fn from(operations: Vec<EditOperation>) -> Self {
        Self { operations }
    }
}

impl IntoIterator for Batch {
    type Item = EditOperation;
    type IntoIter = std::vec::IntoIter<EditOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_delta() {
        assert_eq!(EditOperation::delete(OffsetRange::new(3, 8)).unit_delta(), -5);
        assert_eq!(EditOperation::insert_text(3, "a😀").unit_delta(), 3);
        assert_eq!(EditOperation::insert_image(3, "u", 1, 1).unit_delta(), 1);
        assert_eq!(EditOperation::replace_all("a", "bb").unit_delta(), 0);
    }

    #[test]
    fn test_serde_shape() {
        let op = EditOperation::insert_text(4, "hi");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "insert_text");
        assert_eq!(json["at"], 4);

        let op = EditOperation::text_style(OffsetRange::new(1, 2), TextStyleUpdate::font_size(16.0));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["style"]["kind"], "text");
        assert_eq!(json["style"]["font_size"], 16.0);
        assert!(json["style"].get("bold").is_none());
    }

    #[test]
    fn test_batch() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        batch.push(EditOperation::insert_image(1, "u", 2, 2));
        batch.push(EditOperation::insert_text(2, " "));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.image_count(), 1);
        assert_eq!(batch.operations()[1].kind(), "insert_text");
    }
}
