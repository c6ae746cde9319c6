//! Building offset-safe replacement batches.

use super::operation::{Batch, EditOperation};
use super::sanitize::sanitize_text;
use crate::locate::{Occurrence, Placeholder};
use crate::sizing::Dimensions;
use log::{debug, warn};
use std::cmp::Reverse;

/// Default upper bound on operations per submitted batch.
pub const DEFAULT_MAX_BATCH_OPERATIONS: usize = 50;

/// What a placeholder occurrence is replaced with.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// Literal text, inserted as given
    Text(String),

    /// An inline image
    Image {
        /// Image source URI
        uri: String,
        /// Rendered size
        size: Dimensions,
    },
}

impl Replacement {
    /// Text replacement, sanitized with [`sanitize_text`].
    pub fn text(value: &str) -> Self {
        Replacement::Text(sanitize_text(value))
    }

    /// Text replacement inserted verbatim.
    pub fn raw_text(value: impl Into<String>) -> Self {
        Replacement::Text(value.into())
    }

    /// Image replacement.
    pub fn image(uri: impl Into<String>, size: Dimensions) -> Self {
        Replacement::Image {
            uri: uri.into(),
            size,
        }
    }

    /// Operations replacing one occurrence, or `None` when the replacement
    /// cannot be applied.
    fn operations(&self, occurrence: Occurrence) -> Option<Vec<EditOperation>> {
        let mut ops = vec![EditOperation::delete(occurrence)];
        match self {
            Replacement::Text(text) if text.is_empty() => {}
            Replacement::Text(text) => {
                ops.push(EditOperation::insert_text(occurrence.start, text.clone()));
            }
            Replacement::Image { uri, size } => {
                if !is_valid_image_uri(uri) {
                    return None;
                }
                ops.push(EditOperation::insert_image(
                    occurrence.start,
                    uri.clone(),
                    size.width,
                    size.height,
                ));
            }
        }
        Some(ops)
    }
}

/// Check that a URI is something the document service can fetch.
pub fn is_valid_image_uri(uri: &str) -> bool {
    let uri = uri.trim();
    (uri.starts_with("https://") || uri.starts_with("http://")) && uri.len() > "https://".len()
}

/// A single occurrence paired with its replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    /// Where to replace
    pub occurrence: Occurrence,
    /// What to replace with
    pub replacement: Replacement,
}

/// Operations ready for sequential submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPlan {
    /// Batches in submission order
    pub batches: Vec<Batch>,

    /// Edits that were skipped, with the reason
    pub warnings: Vec<String>,
}

impl BatchPlan {
    /// Total operations across all batches.
    pub fn operation_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    /// Check if there is nothing to submit.
    pub fn is_empty(&self) -> bool {
        self.batches.iter().all(Batch::is_empty)
    }

    /// All operations in submission order.
    pub fn operations(&self) -> impl Iterator<Item = &EditOperation> + '_ {
        self.batches.iter().flat_map(|b| b.operations())
    }
}

/// Collects replacements and emits them highest offset first.
///
/// Every replacement shifts the offsets of everything after it, so edits are
/// ordered by descending start offset: an edit never moves a position that a
/// later edit in the plan still has to address.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    edits: Vec<Edit>,
    global: Vec<EditOperation>,
    max_operations: usize,
}

impl BatchBuilder {
    /// Create a builder with [`DEFAULT_MAX_BATCH_OPERATIONS`].
    pub fn new() -> Self {
        Self {
            edits: Vec::new(),
            global: Vec::new(),
            max_operations: DEFAULT_MAX_BATCH_OPERATIONS,
        }
    }

    /// Set the maximum number of operations per batch.
    pub fn with_max_operations(mut self, max: usize) -> Self {
        self.max_operations = max.max(1);
        self
    }

    /// Replace each occurrence with `replacement`.
    pub fn replace(
        &mut self,
        occurrences: impl IntoIterator<Item = Occurrence>,
        replacement: &Replacement,
    ) -> &mut Self {
        self.edits
            .extend(occurrences.into_iter().map(|occurrence| Edit {
                occurrence,
                replacement: replacement.clone(),
            }));
        self
    }

    /// Add a single edit.
    pub fn push(&mut self, edit: Edit) -> &mut Self {
        self.edits.push(edit);
        self
    }

    /// Replace every occurrence of a placeholder with one content-matched
    /// operation instead of explicit delete/insert pairs.
    ///
    /// Only text can be replaced this way. Such operations run after all
    /// positional edits, since they shift offsets unpredictably.
    pub fn replace_all(&mut self, placeholder: &Placeholder, text: &str) -> &mut Self {
        self.global
            .push(EditOperation::replace_all(placeholder.token(), sanitize_text(text)));
        self
    }

    /// Number of edits collected so far.
    pub fn len(&self) -> usize {
        self.edits.len() + self.global.len()
    }

    /// Check if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Order, expand and chunk the collected edits.
    pub fn build(self) -> BatchPlan {
        let mut edits = self.edits;
        edits.sort_by_key(|e| Reverse(e.occurrence.start));

        let mut warnings = Vec::new();
        let mut groups: Vec<Vec<EditOperation>> = Vec::with_capacity(edits.len());
        let mut lowest_start = None;

        for edit in edits {
            let occ = edit.occurrence;
            if let Some(lowest) = lowest_start {
                if occ.end > lowest {
                    let msg = format!(
                        "skipping edit at {}: overlaps an edit already planned",
                        occ.range()
                    );
                    warn!("{}", msg);
                    warnings.push(msg);
                    continue;
                }
            }
            match edit.replacement.operations(occ) {
                Some(ops) => {
                    lowest_start = Some(occ.start);
                    groups.push(ops);
                }
                None => {
                    let msg = format!(
                        "no valid image URI for placeholder at {}; left unreplaced",
                        occ.range()
                    );
                    warn!("{}", msg);
                    warnings.push(msg);
                }
            }
        }
        groups.extend(self.global.into_iter().map(|op| vec![op]));

        let batches = chunk_groups(groups, self.max_operations);
        debug!(
            "planned {} batch(es), {} operation(s)",
            batches.len(),
            batches.iter().map(Batch::len).sum::<usize>()
        );
        BatchPlan { batches, warnings }
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack operation groups into batches of at most `max` operations.
///
/// A group (the delete/insert pair of one occurrence) is never split, so a
/// single group larger than `max` gets a batch of its own.
pub fn chunk_groups(groups: Vec<Vec<EditOperation>>, max: usize) -> Vec<Batch> {
    let max = max.max(1);
    let mut batches = Vec::new();
    let mut current = Batch::new();
    for group in groups {
        if !current.is_empty() && current.len() + group.len() > max {
            batches.push(std::mem::take(&mut current));
        }
        current.extend(group);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Build the ordered operation list replacing every occurrence with
/// `replacement`.
///
/// Occurrences may be given in any order. The result is sorted by descending
/// start offset; an empty input yields an empty list.
pub fn build_replacement_batch(
    occurrences: &[Occurrence],
    replacement: &Replacement,
) -> Vec<EditOperation> {
    let mut builder = BatchBuilder::new().with_max_operations(usize::MAX);
    builder.replace(occurrences.iter().copied(), replacement);
    builder
        .build()
        .batches
        .into_iter()
        .flat_map(Batch::into_operations)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OffsetRange;

    fn occ(start: usize, len: usize) -> Occurrence {
        Occurrence::new(start, start + len)
    }

    #[test]
    fn test_empty_input_yields_empty_batch() {
        assert!(build_replacement_batch(&[], &Replacement::raw_text("x")).is_empty());
        assert!(BatchBuilder::new().build().is_empty());
    }

    #[test]
    fn test_descending_order() {
        let ops = build_replacement_batch(
            &[occ(5, 3), occ(40, 3), occ(20, 3)],
            &Replacement::raw_text("value"),
        );
        let starts: Vec<_> = ops.iter().filter_map(EditOperation::position).collect();
        assert_eq!(starts, vec![40, 40, 20, 20, 5, 5]);
        assert_eq!(ops[0], EditOperation::delete(OffsetRange::new(40, 43)));
        assert_eq!(ops[1], EditOperation::insert_text(40, "value"));
    }

    #[test]
    fn test_text_is_sanitized() {
        let ops = build_replacement_batch(&[occ(1, 5)], &Replacement::text(" a\n b  c "));
        assert_eq!(ops[1], EditOperation::insert_text(1, "a\n\nb c"));
    }

    #[test]
    fn test_empty_text_only_deletes() {
        let ops = build_replacement_batch(&[occ(1, 5)], &Replacement::raw_text(""));
        assert_eq!(ops, vec![EditOperation::delete(OffsetRange::new(1, 6))]);
    }

    #[test]
    fn test_image_replacement() {
        let size = Dimensions::new(200, 100);
        let ops = build_replacement_batch(
            &[occ(3, 4), occ(30, 4)],
            &Replacement::image("https://img.test/a.png", size),
        );
        assert_eq!(ops.len(), 4);
        assert_eq!(
            ops[1],
            EditOperation::insert_image(30, "https://img.test/a.png", 200, 100)
        );
    }

    #[test]
    fn test_invalid_image_uri_is_skipped_with_warning() {
        let mut builder = BatchBuilder::new();
        builder.replace([occ(3, 4)], &Replacement::image("", Dimensions::new(1, 1)));
        builder.replace([occ(10, 4)], &Replacement::raw_text("ok"));
        let plan = builder.build();

        assert_eq!(plan.operation_count(), 2);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("no valid image URI"));
    }

    #[test]
    fn test_overlapping_edits_are_dropped() {
        let mut builder = BatchBuilder::new();
        builder.replace([occ(10, 5), occ(12, 5)], &Replacement::raw_text("x"));
        let plan = builder.build();
        assert_eq!(plan.operation_count(), 2);
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_chunking_keeps_pairs_together() {
        let mut builder = BatchBuilder::new().with_max_operations(5);
        let occurrences: Vec<_> = (0..5).map(|i| occ(i * 10 + 1, 3)).collect();
        builder.replace(occurrences, &Replacement::raw_text("v"));
        let plan = builder.build();

        assert_eq!(plan.batches.len(), 3);
        assert!(plan.batches.iter().all(|b| b.len() % 2 == 0 && b.len() <= 5));
        assert_eq!(plan.operation_count(), 10);
    }

    #[test]
    fn test_replace_all_runs_last() {
        let mut builder = BatchBuilder::new();
        let p = Placeholder::new("title").unwrap();
        builder.replace_all(&p, "Vase");
        builder.replace([occ(8, 3)], &Replacement::raw_text("x"));
        let ops: Vec<_> = builder.build().operations().cloned().collect();

        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2], EditOperation::replace_all("{{title}}", "Vase"));
    }

    #[test]
    fn test_image_uri_validation() {
        assert!(is_valid_image_uri("https://x.test/a.jpg"));
        assert!(is_valid_image_uri("http://x.test/a.jpg"));
        assert!(!is_valid_image_uri("ftp://x.test/a.jpg"));
        assert!(!is_valid_image_uri("https://"));
        assert!(!is_valid_image_uri(""));
    }
}
