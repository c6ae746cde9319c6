//! Locating the rendered report title.

use crate::model::{Document, OffsetRange};
use regex::RegexBuilder;

/// Find the range of the first text run that contains `title`, ignoring case.
pub fn find_title(doc: &Document, title: &str) -> Option<OffsetRange> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    let re = RegexBuilder::new(&regex::escape(title))
        .case_insensitive(true)
        .build()
        .ok()?;
    doc.text_runs()
        .find(|run| re.is_match(run.content.trim()))
        .map(|run| run.range)
}

/// Font size in points for a title of the given length.
///
/// Longer titles get smaller type so they stay on one or two lines.
pub fn title_font_size(title: &str) -> f32 {
    match title.trim().chars().count() {
        0..=20 => 18.0,
        21..=40 => 16.0,
        _ => 14.0,
    }
}
