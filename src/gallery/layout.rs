//! Grid layout with an explicit insertion cursor.

use super::GalleryOptions;
use crate::locate::Occurrence;
use crate::model::{utf16_len, Alignment, DocumentOffset, OffsetRange};
use crate::mutate::{chunk_groups, Batch, EditOperation, ParagraphStyleUpdate};
use crate::sizing::Dimensions;

/// One cell of the gallery grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryItem {
    /// An image with its thumbnail size
    Image {
        /// Image source URI
        uri: String,
        /// Rendered size
        size: Dimensions,
    },

    /// An image that could not be fetched or inserted
    Unavailable {
        /// Image source URI
        uri: String,
    },
}

impl GalleryItem {
    /// Source URI of the item.
    pub fn uri(&self) -> &str {
        match self {
            GalleryItem::Image { uri, .. } | GalleryItem::Unavailable { uri } => uri,
        }
    }

    /// Check if the item inserts an image.
    pub fn is_image(&self) -> bool {
        matches!(self, GalleryItem::Image { .. })
    }

    /// The text fallback for this item.
    pub fn to_unavailable(&self) -> Self {
        GalleryItem::Unavailable {
            uri: self.uri().to_string(),
        }
    }
}

/// Tracks where the next grid item goes.
///
/// Every insertion advances the cursor by exactly the units it inserted, so
/// the cursor stays valid however spacer and fallback lengths differ.
#[derive(Debug, Clone)]
pub(crate) struct GalleryWriter {
    cursor: DocumentOffset,
    row_start: DocumentOffset,
    index: usize,
    total: usize,
    images_per_row: usize,
    spacer: String,
    unavailable_text: String,
}

impl GalleryWriter {
    fn new(cursor: DocumentOffset, total: usize, options: &GalleryOptions) -> Self {
        Self {
            cursor,
            row_start: cursor,
            index: 0,
            total,
            images_per_row: options.images_per_row.max(1),
            spacer: options.spacer.clone(),
            unavailable_text: options.unavailable_text.clone(),
        }
    }

    /// Operations placing the next item, its separator and, at the end of a
    /// row, the row's paragraph style.
    pub(crate) fn item_operations(&mut self, item: &GalleryItem) -> Vec<EditOperation> {
        let mut ops = Vec::with_capacity(3);
        match item {
            GalleryItem::Image { uri, size } => {
                ops.push(EditOperation::insert_image(
                    self.cursor,
                    uri.clone(),
                    size.width,
                    size.height,
                ));
                self.cursor += 1;
            }
            GalleryItem::Unavailable { .. } => {
                let text = self.unavailable_text.clone();
                self.insert_text(&mut ops, &text);
            }
        }

        self.index += 1;
        let end_of_row = self.index % self.images_per_row == 0 || self.index == self.total;
        if end_of_row {
            self.insert_text(&mut ops, "\n");
            ops.push(EditOperation::paragraph_style(
                OffsetRange::new(self.row_start, self.cursor),
                row_style(),
            ));
            self.row_start = self.cursor;
        } else {
            let spacer = self.spacer.clone();
            self.insert_text(&mut ops, &spacer);
        }
        ops
    }

    fn insert_text(&mut self, ops: &mut Vec<EditOperation>, text: &str) {
        if text.is_empty() {
            return;
        }
        ops.push(EditOperation::insert_text(self.cursor, text));
        self.cursor += utf16_len(text);
    }
}

fn title_style() -> ParagraphStyleUpdate {
    ParagraphStyleUpdate {
        heading_level: Some(3),
        alignment: Some(Alignment::Center),
        space_above: Some(20.0),
        space_below: Some(20.0),
        ..Default::default()
    }
}

fn row_style() -> ParagraphStyleUpdate {
    ParagraphStyleUpdate {
        alignment: Some(Alignment::Center),
        line_spacing: Some(150.0),
        space_above: Some(20.0),
        space_below: Some(20.0),
        ..Default::default()
    }
}

/// A laid-out gallery, ready for sequential submission.
#[derive(Debug, Clone)]
pub struct GalleryPlan {
    header: Batch,
    writer: GalleryWriter,
    items: Vec<GalleryItem>,
    items_per_batch: usize,
    max_operations: usize,
}

impl GalleryPlan {
    /// Batch replacing the anchor with the title, or with the empty message.
    pub fn header(&self) -> &Batch {
        &self.header
    }

    /// Grid items in insertion order.
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    /// Number of images the plan inserts.
    pub fn image_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_image()).count()
    }

    /// Number of text fallbacks the plan inserts.
    pub fn fallback_count(&self) -> usize {
        self.items.len() - self.image_count()
    }

    /// All batches, assuming every one of them is accepted.
    pub fn batches(&self) -> Vec<Batch> {
        let mut writer = self.writer.clone();
        let mut batches = vec![self.header.clone()];
        for chunk in self.chunks() {
            let groups = chunk.iter().map(|item| writer.item_operations(item)).collect();
            batches.extend(chunk_groups(groups, self.max_operations));
        }
        batches
    }

    /// All operations in submission order.
    pub fn operations(&self) -> Vec<EditOperation> {
        self.batches()
            .into_iter()
            .flat_map(Batch::into_operations)
            .collect()
    }

    /// Item slices submitted together, each within both the image limit and
    /// the operation limit.
    pub(crate) fn chunks(&self) -> Vec<&[GalleryItem]> {
        let mut writer = self.writer.clone();
        let mut chunks = Vec::new();
        for chunk in self.items.chunks(self.items_per_batch) {
            let mut start = 0;
            let mut operations = 0;
            for (i, item) in chunk.iter().enumerate() {
                let n = writer.item_operations(item).len();
                if i > start && operations + n > self.max_operations {
                    chunks.push(&chunk[start..i]);
                    start = i;
                    operations = 0;
                }
                operations += n;
            }
            chunks.push(&chunk[start..]);
        }
        chunks
    }

    pub(crate) fn writer(&self) -> GalleryWriter {
        self.writer.clone()
    }
}

/// Lay out `items` in place of the anchor occurrence.
///
/// With no items the anchor is replaced by the empty message. Otherwise the
/// anchor becomes a centered title followed by rows of `images_per_row`
/// items, separated by the spacer inside a row and a paragraph break after
/// each row.
pub fn plan_gallery(
    anchor: Occurrence,
    items: Vec<GalleryItem>,
    options: &GalleryOptions,
) -> GalleryPlan {
    let start = anchor.start;
    let mut header = Batch::new();
    header.push(EditOperation::delete(anchor));

    let mut cursor = start;
    if items.is_empty() {
        if !options.empty_message.is_empty() {
            header.push(EditOperation::insert_text(start, options.empty_message.clone()));
        }
    } else if !options.title.is_empty() {
        let title_len = utf16_len(&options.title);
        header.push(EditOperation::insert_text(start, format!("{}\n", options.title)));
        header.push(EditOperation::paragraph_style(
            OffsetRange::with_len(start, title_len),
            title_style(),
        ));
        cursor += title_len + 1;
    }

    GalleryPlan {
        header,
        writer: GalleryWriter::new(cursor, items.len(), options),
        items,
        items_per_batch: options.max_images_per_batch.max(1),
        max_operations: options.max_operations_per_batch.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(n: usize) -> GalleryItem {
        GalleryItem::Image {
            uri: format!("https://img.test/{}.png", n),
            size: Dimensions::new(200, 100),
        }
    }

    fn inserts(ops: &[EditOperation]) -> Vec<(usize, String)> {
        ops.iter()
            .filter_map(|op| match op {
                EditOperation::InsertText { at, text } => Some((*at, text.clone())),
                EditOperation::InsertImage { at, .. } => Some((*at, "<img>".to_string())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_gallery() {
        let options = GalleryOptions::default();
        let plan = plan_gallery(Occurrence::new(5, 16), Vec::new(), &options);
        let ops = plan.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], EditOperation::delete(OffsetRange::new(5, 16)));
        assert_eq!(ops[1], EditOperation::insert_text(5, options.empty_message.clone()));
        assert_eq!(plan.image_count(), 0);
    }

    #[test]
    fn test_cursor_advances_by_inserted_units() {
        let options = GalleryOptions::default()
            .with_title("Gallery")
            .with_spacer("  ")
            .with_images_per_row(2);
        let items = vec![image(1), image(2), image(3)];
        let plan = plan_gallery(Occurrence::new(10, 21), items, &options);

        // Title "Gallery\n" occupies 10..18.
        assert_eq!(
            inserts(&plan.operations()),
            vec![
                (10, "Gallery\n".to_string()),
                (18, "<img>".to_string()),
                (19, "  ".to_string()),
                (21, "<img>".to_string()),
                (22, "\n".to_string()),
                (23, "<img>".to_string()),
                (24, "\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_fallback_text_shifts_cursor() {
        let options = GalleryOptions::default()
            .with_title("")
            .with_unavailable_text("[n/a]");
        let items = vec![
            GalleryItem::Unavailable {
                uri: "https://img.test/x.png".into(),
            },
            image(2),
        ];
        let plan = plan_gallery(Occurrence::new(1, 12), items, &options);
        let found = inserts(&plan.operations());
        assert_eq!(found[0], (1, "[n/a]".to_string()));
        assert_eq!(found[1], (6, " ".repeat(6)));
        assert_eq!(found[2], (12, "<img>".to_string()));
        assert_eq!(plan.fallback_count(), 1);
    }

    #[test]
    fn test_row_styles_cover_each_row() {
        let options = GalleryOptions::default().with_title("").with_spacer(" ");
        let plan = plan_gallery(Occurrence::new(1, 12), (0..4).map(image).collect(), &options);
        let styled: Vec<_> = plan
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                EditOperation::UpdateStyle { range, .. } => Some(range),
                _ => None,
            })
            .collect();
        // Row one: img " " img " " img "\n" = 6 units; row two: img "\n".
        assert_eq!(styled, vec![OffsetRange::new(1, 7), OffsetRange::new(7, 9)]);
    }

    #[test]
    fn test_batches_respect_image_limit() {
        let options = GalleryOptions::default().with_max_images_per_batch(10);
        let plan = plan_gallery(Occurrence::new(1, 12), (0..23).map(image).collect(), &options);
        let batches = plan.batches();

        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0].image_count(), 0);
        let counts: Vec<_> = batches[1..].iter().map(Batch::image_count).collect();
        assert_eq!(counts, vec![10, 10, 3]);
    }

    #[test]
    fn test_batches_respect_operation_limit() {
        let options = GalleryOptions::default().with_max_operations_per_batch(5);
        let plan = plan_gallery(Occurrence::new(1, 12), (0..10).map(image).collect(), &options);
        let batches = plan.batches();

        assert!(batches[1..].iter().all(|b| b.len() <= 5));
        let images: usize = batches.iter().map(Batch::image_count).sum();
        assert_eq!(images, 10);
        assert_eq!(plan.chunks().iter().map(|c| c.len()).sum::<usize>(), 10);
    }
}
