//! Gallery layout options.

use crate::mutate::DEFAULT_MAX_BATCH_OPERATIONS;

/// Options for the gallery grid.
#[derive(Debug, Clone)]
pub struct GalleryOptions {
    /// Images per row (at least 1)
    pub images_per_row: usize,

    /// Most images inserted by one batch (at least 1)
    pub max_images_per_batch: usize,

    /// Most operations in one batch; one item's operations are never split
    pub max_operations_per_batch: usize,

    /// Text between images in the same row
    pub spacer: String,

    /// Centered heading above the grid; empty for none
    pub title: String,

    /// Sentence replacing the anchor when there are no images
    pub empty_message: String,

    /// Text inserted in place of an image that could not be used
    pub unavailable_text: String,
}

impl GalleryOptions {
    /// Create gallery options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set images per row.
    pub fn with_images_per_row(mut self, count: usize) -> Self {
        self.images_per_row = count.max(1);
        self
    }

    /// Set the image limit per batch.
    pub fn with_max_images_per_batch(mut self, count: usize) -> Self {
        self.max_images_per_batch = count.max(1);
        self
    }

    /// Set the operation limit per batch.
    pub fn with_max_operations_per_batch(mut self, count: usize) -> Self {
        self.max_operations_per_batch = count.max(1);
        self
    }

    /// Set the horizontal spacer.
    pub fn with_spacer(mut self, spacer: impl Into<String>) -> Self {
        self.spacer = spacer.into();
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the empty-gallery message.
    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Set the fallback text for unusable images.
    pub fn with_unavailable_text(mut self, text: impl Into<String>) -> Self {
        self.unavailable_text = text.into();
        self
    }
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            images_per_row: 3,
            max_images_per_batch: 10,
            max_operations_per_batch: DEFAULT_MAX_BATCH_OPERATIONS,
            spacer: " ".repeat(6),
            title: "Visual Comparisons: Similar Items".to_string(),
            empty_message: "No similar images were found during the analysis of this item."
                .to_string(),
            unavailable_text: "[Image not available]".to_string(),
        }
    }
}
