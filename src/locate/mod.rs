//! Placeholder location.
//!
//! The locator walks the document in order, descending into table cells at
//! any depth, and reports every non-overlapping match of a token inside a
//! single text run as an absolute [`Occurrence`].
//!
//! Matching is exact and case-sensitive. A token split across two runs (for
//! example because part of it carries different formatting) is not found.
//!
//! # Example
//!
//! ```
//! use docfill::locate::{find_occurrences, Placeholder};
//! use docfill::model::{Document, Paragraph};
//!
//! let doc = Document::from_blocks(
//!     "doc",
//!     vec![Paragraph::with_text("Dear {{name}}, hello {{name}}").into()],
//! );
//! let name = Placeholder::new("name").unwrap();
//! let found = find_occurrences(&doc, &name);
//! assert_eq!(found.len(), 2);
//! assert_eq!(doc.text_in_range(found[0].range()), "{{name}}");
//! ```

mod placeholder;
mod title;

pub use placeholder::{Occurrence, Placeholder, TOKEN_CLOSE, TOKEN_OPEN};
pub use title::{find_title, title_font_size};

use crate::model::{utf16_len, Document, TextRun};
use std::collections::BTreeMap;

/// Find every occurrence of a placeholder, in ascending offset order.
pub fn find_occurrences(doc: &Document, placeholder: &Placeholder) -> Vec<Occurrence> {
    find_token(doc, placeholder.token())
}

/// Find every occurrence of a literal token, in ascending offset order.
///
/// An empty token matches nothing.
pub fn find_token(doc: &Document, token: &str) -> Vec<Occurrence> {
    let mut found = Vec::new();
    if token.is_empty() {
        return found;
    }
    for run in doc.text_runs() {
        scan_run(run, token, &mut found);
    }
    found
}

/// Find the first occurrence of a placeholder.
pub fn find_first(doc: &Document, placeholder: &Placeholder) -> Option<Occurrence> {
    doc.text_runs().find_map(|run| {
        let mut found = Vec::with_capacity(1);
        scan_run(run, placeholder.token(), &mut found);
        found.into_iter().next()
    })
}

/// Find the occurrences of many placeholders in one traversal.
///
/// Every requested name gets an entry, empty when the token is absent.
pub fn find_all_occurrences<'p>(
    doc: &Document,
    placeholders: impl IntoIterator<Item = &'p Placeholder>,
) -> BTreeMap<String, Vec<Occurrence>> {
    // Keyed by name so a repeated placeholder is scanned once.
    let placeholders: BTreeMap<&str, &Placeholder> =
        placeholders.into_iter().map(|p| (p.name(), p)).collect();
    let mut found: BTreeMap<String, Vec<Occurrence>> = placeholders
        .keys()
        .map(|name| (name.to_string(), Vec::new()))
        .collect();

    for run in doc.text_runs() {
        // Cheap pre-check: every token starts with the opening delimiter.
        if !run.content.contains(TOKEN_OPEN) {
            continue;
        }
        for p in placeholders.values() {
            if let Some(list) = found.get_mut(p.name()) {
                scan_run(run, p.token(), list);
            }
        }
    }
    found
}

/// Count every well-formed `{{name}}` token in the document, by name.
///
/// Useful for checking a template before filling it.
pub fn list_placeholders(doc: &Document) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for run in doc.text_runs() {
        let mut rest = run.content.as_str();
        while let Some(open) = rest.find(TOKEN_OPEN) {
            let after = &rest[open + TOKEN_OPEN.len()..];
            match after.find(TOKEN_CLOSE) {
                None => break,
                Some(close) if Placeholder::new(&after[..close]).is_ok() => {
                    *counts.entry(after[..close].to_string()).or_insert(0) += 1;
                    rest = &after[close + TOKEN_CLOSE.len()..];
                }
                // `{{{name}}` still holds a token one brace further on
                Some(_) => rest = &rest[open + 1..],
            }
        }
    }
    counts
}

/// Append the matches of `token` inside `run` as absolute occurrences.
fn scan_run(run: &TextRun, token: &str, out: &mut Vec<Occurrence>) {
    let token_units = utf16_len(token);
    let mut units_before = 0;
    let mut scanned_bytes = 0;
    for (byte, _) in run.content.match_indices(token) {
        units_before += utf16_len(&run.content[scanned_bytes..byte]);
        let start = run.range.start + units_before;
        out.push(Occurrence::new(start, start + token_units));
        units_before += token_units;
        scanned_bytes = byte + token.len();
    }
}
