//! Fill options.

use crate::gallery::GalleryOptions;
use crate::mutate::DEFAULT_MAX_BATCH_OPERATIONS;
use crate::sizing::SizingOptions;

/// Default gallery anchor name.
pub const DEFAULT_ANCHOR: &str = "gallery";

/// Options for a fill run.
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Maximum operations per submitted batch
    pub max_batch_operations: usize,

    /// Replace text fields with content-matched operations instead of
    /// delete/insert pairs
    pub use_replace_all: bool,

    /// Name of the gallery anchor placeholder
    pub anchor: String,

    /// Gallery layout
    pub gallery: GalleryOptions,

    /// Image sizing
    pub sizing: SizingOptions,
}

impl FillOptions {
    /// Create fill options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size limit.
    pub fn with_max_batch_operations(mut self, max: usize) -> Self {
        self.max_batch_operations = max.max(1);
        self
    }

    /// Enable or disable replace-all text operations.
    pub fn with_replace_all(mut self, enabled: bool) -> Self {
        self.use_replace_all = enabled;
        self
    }

    /// Set the gallery anchor name.
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = anchor.into();
        self
    }

    /// Set gallery options.
    pub fn with_gallery(mut self, gallery: GalleryOptions) -> Self {
        self.gallery = gallery;
        self
    }

    /// Set sizing options.
    pub fn with_sizing(mut self, sizing: SizingOptions) -> Self {
        self.sizing = sizing;
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            max_batch_operations: DEFAULT_MAX_BATCH_OPERATIONS,
            use_replace_all: false,
            anchor: DEFAULT_ANCHOR.to_string(),
            gallery: GalleryOptions::default(),
            sizing: SizingOptions::default(),
        }
    }
}
