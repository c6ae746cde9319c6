//! Normalization of field values before they are inserted as text.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Separator placed between paragraphs of a sanitized value.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Text sanitizer for scalar field values.
///
/// Stages: Unicode NFC, line-ending normalization, whitespace collapsing per
/// line, then every remaining line becomes its own paragraph.
pub struct TextSanitizer {
    whitespace_regex: Regex,
    paragraph_break: String,
}

impl TextSanitizer {
    /// Create a sanitizer using [`PARAGRAPH_BREAK`] between paragraphs.
    pub fn new() -> Self {
        Self::with_paragraph_break(PARAGRAPH_BREAK)
    }

    /// Create a sanitizer with a custom paragraph separator.
    pub fn with_paragraph_break(separator: impl Into<String>) -> Self {
        Self {
            whitespace_regex: Regex::new(r"\s+").unwrap(),
            paragraph_break: separator.into(),
        }
    }

    /// Sanitize a value.
    pub fn process(&self, text: &str) -> String {
        let normalized: String = text.nfc().collect();
        let normalized = normalized.replace("\r\n", "\n").replace('\r', "\n");

        normalized
            .split('\n')
            .map(|line| self.whitespace_regex.replace_all(line, " "))
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(&self.paragraph_break)
    }
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize a value with the default sanitizer.
pub fn sanitize_text(text: &str) -> String {
    static SANITIZER: OnceLock<TextSanitizer> = OnceLock::new();
    SANITIZER.get_or_init(TextSanitizer::new).process(text)
}
