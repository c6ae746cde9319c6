//! Paragraph and run-level types.

use super::offset::{utf16_len, utf16_to_byte, DocumentOffset, OffsetRange};
use serde::{Deserialize, Serialize};

/// Character used in plain-text views for an inline image.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// A paragraph: an ordered sequence of inline runs.
///
/// Paragraphs own their terminating newline, which lives at the end of the
/// last text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Offset range covered by the paragraph
    #[serde(default)]
    pub range: OffsetRange,

    /// Inline runs in document order
    pub runs: Vec<Run>,

    /// Paragraph style
    #[serde(default)]
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self {
            range: OffsetRange::default(),
            runs: Vec::new(),
            style: ParagraphStyle::default(),
        }
    }

    /// Create a paragraph holding a single text run.
    ///
    /// A trailing newline is appended when `text` does not already end with one.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create a paragraph from several text runs.
    ///
    /// Useful for templates where formatting splits the text into runs.
    pub fn with_runs<S: Into<String>>(runs: impl IntoIterator<Item = S>) -> Self {
        let mut p = Self::new();
        for run in runs {
            p.add_text(run);
        }
        p
    }

    /// Add a text run.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.runs.push(Run::Text(TextRun::new(text)));
    }

    /// Append the terminating newline when the last run lacks one.
    pub fn terminate(&mut self) {
        match self.runs.last_mut() {
            Some(Run::Text(t)) if t.content.ends_with('\n') => {}
            Some(Run::Text(t)) => t.content.push('\n'),
            _ => self.add_text("\n"),
        }
    }

    /// Add an inline image run.
    pub fn add_image(&mut self, image: InlineImage) {
        self.runs.push(Run::InlineImage(image));
    }

    /// Plain text of the paragraph; inline images appear as U+FFFC.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(Run::plain_text).collect()
    }

    /// Number of offset units the paragraph's runs occupy.
    pub fn unit_len(&self) -> usize {
        self.runs.iter().map(Run::unit_len).sum()
    }

    /// Check if the paragraph has no visible content.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty() || self.plain_text().trim().is_empty()
    }

    /// Number of inline images in the paragraph.
    pub fn image_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r, Run::InlineImage(_)))
            .count()
    }

    /// Assign offsets to the paragraph and its runs starting at `cursor`.
    ///
    /// Returns the offset just past the paragraph.
    pub(crate) fn reindex(&mut self, cursor: DocumentOffset) -> DocumentOffset {
        let start = cursor;
        let mut cursor = cursor;
        for run in &mut self.runs {
            let len = run.unit_len();
            run.set_range(OffsetRange::with_len(cursor, len));
            cursor += len;
        }
        self.range = OffsetRange::new(start, cursor);
        cursor
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Run {
    /// A run of text with consistent styling
    Text(TextRun),

    /// An inline image, occupying exactly one offset unit
    InlineImage(InlineImage),
}

impl Run {
    /// Offset range of the run.
    pub fn range(&self) -> OffsetRange {
        match self {
            Run::Text(t) => t.range,
            Run::InlineImage(i) => i.range,
        }
    }

    pub(crate) fn set_range(&mut self, range: OffsetRange) {
        match self {
            Run::Text(t) => t.range = range,
            Run::InlineImage(i) => i.range = range,
        }
    }

    /// Number of offset units the run occupies.
    pub fn unit_len(&self) -> usize {
        match self {
            Run::Text(t) => utf16_len(&t.content),
            Run::InlineImage(_) => 1,
        }
    }

    /// Plain text view of the run.
    pub fn plain_text(&self) -> String {
        match self {
            Run::Text(t) => t.content.clone(),
            Run::InlineImage(_) => OBJECT_REPLACEMENT.to_string(),
        }
    }

    /// The text run, if this is one.
    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Run::Text(t) => Some(t),
            Run::InlineImage(_) => None,
        }
    }
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Offset range covered by the run
    #[serde(default)]
    pub range: OffsetRange,

    /// The text content
    pub content: String,

    /// Text styling
    #[serde(default)]
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            range: OffsetRange::default(),
            content: content.into(),
            style: TextStyle::default(),
        }
    }

    /// Slice of the content covered by `range` (absolute offsets).
    ///
    /// Returns `None` if the range is outside the run or splits a surrogate pair.
    pub fn slice(&self, range: OffsetRange) -> Option<&str> {
        if range.start < self.range.start || range.end > self.range.end {
            return None;
        }
        let from = utf16_to_byte(&self.content, range.start - self.range.start)?;
        let to = utf16_to_byte(&self.content, range.end - self.range.start)?;
        self.content.get(from..to)
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// An image placed inline with text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    /// Offset range covered by the image (always one unit)
    #[serde(default)]
    pub range: OffsetRange,

    /// Source URI of the image
    pub uri: String,

    /// Rendered width in points
    pub width: u32,

    /// Rendered height in points
    pub height: u32,
}

impl InlineImage {
    /// Create an inline image.
    pub fn new(uri: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            range: OffsetRange::default(),
            uri: uri.into(),
            width,
            height,
        }
    }
}

/// Text styling properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    #[serde(default)]
    pub bold: bool,

    /// Italic text
    #[serde(default)]
    pub italic: bool,

    /// Font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

/// Paragraph styling properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Heading level (1-6) or None for normal paragraph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,

    /// Text alignment
    #[serde(default)]
    pub alignment: Alignment,

    /// Line spacing as a percentage (100 = single)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f32>,

    /// Space before paragraph in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_above: Option<f32>,

    /// Space after paragraph in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_below: Option<f32>,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Start alignment (default)
    #[default]
    Start,
    /// Center alignment
    Center,
    /// End alignment
    End,
    /// Justified alignment
    Justify,
}
