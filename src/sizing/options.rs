//! Sizing presets and fetch settings.

use super::Dimensions;
use std::time::Duration;

/// Logical image slot, inferred from the placeholder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCategory {
    /// Primary subject photo
    Main,
    /// Signature detail
    Signature,
    /// Age-evidence detail
    Age,
    /// Gallery thumbnail
    Gallery,
    /// Anything else
    Other,
}

impl ImageCategory {
    /// Infer the category from a placeholder name by substring match.
    ///
    /// The word "image" is ignored so that e.g. `main_image` is not mistaken
    /// for an age slot.
    pub fn from_placeholder(name: &str) -> Self {
        let name = name.to_ascii_lowercase().replace("image", "");
        if name.contains("main") {
            ImageCategory::Main
        } else if name.contains("signature") {
            ImageCategory::Signature
        } else if name.contains("gallery") {
            ImageCategory::Gallery
        } else if name.contains("age") {
            ImageCategory::Age
        } else {
            ImageCategory::Other
        }
    }
}

/// Options for image sizing.
#[derive(Debug, Clone)]
pub struct SizingOptions {
    /// Bounding box for the main photo (points)
    pub main: Dimensions,

    /// Bounding box for signature details
    pub signature: Dimensions,

    /// Bounding box for age-evidence details
    pub age: Dimensions,

    /// Bounding box for gallery thumbnails
    pub gallery: Dimensions,

    /// Bounding box when no category matches
    pub default: Dimensions,

    /// Attempts per image fetch for transient failures (at least 1)
    pub fetch_attempts: u32,

    /// Delay between fetch attempts
    pub retry_delay: Duration,
}

impl SizingOptions {
    /// Create sizing options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounding box for a category.
    pub fn preset(&self, category: ImageCategory) -> Dimensions {
        match category {
            ImageCategory::Main => self.main,
            ImageCategory::Signature => self.signature,
            ImageCategory::Age => self.age,
            ImageCategory::Gallery => self.gallery,
            ImageCategory::Other => self.default,
        }
    }

    /// Set the bounding box for a category.
    pub fn with_preset(mut self, category: ImageCategory, max_box: Dimensions) -> Self {
        match category {
            ImageCategory::Main => self.main = max_box,
            ImageCategory::Signature => self.signature = max_box,
            ImageCategory::Age => self.age = max_box,
            ImageCategory::Gallery => self.gallery = max_box,
            ImageCategory::Other => self.default = max_box,
        }
        self
    }

    /// Set the number of fetch attempts.
    pub fn with_fetch_attempts(mut self, attempts: u32) -> Self {
        self.fetch_attempts = attempts.max(1);
        self
    }

    /// Set the delay between fetch attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

impl Default for SizingOptions {
    fn default() -> Self {
        Self {
            main: Dimensions::new(400, 300),
            signature: Dimensions::new(200, 150),
            age: Dimensions::new(300, 200),
            gallery: Dimensions::new(200, 150),
            default: Dimensions::new(200, 150),
            fetch_attempts: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_placeholder() {
        assert_eq!(ImageCategory::from_placeholder("main_image"), ImageCategory::Main);
        assert_eq!(
            ImageCategory::from_placeholder("signature_image"),
            ImageCategory::Signature
        );
        assert_eq!(ImageCategory::from_placeholder("age_image"), ImageCategory::Age);
        assert_eq!(ImageCategory::from_placeholder("Gallery"), ImageCategory::Gallery);
        assert_eq!(ImageCategory::from_placeholder("detail_image"), ImageCategory::Other);
    }

    #[test]
    fn test_presets() {
        let options = SizingOptions::default();
        assert_eq!(options.preset(ImageCategory::Main), Dimensions::new(400, 300));
        assert_eq!(options.preset(ImageCategory::Age), Dimensions::new(300, 200));
        assert_eq!(options.preset(ImageCategory::Other), Dimensions::new(200, 150));

        let options = options.with_preset(ImageCategory::Other, Dimensions::new(10, 10));
        assert_eq!(options.preset(ImageCategory::Other), Dimensions::new(10, 10));
    }

    #[test]
    fn test_fetch_attempts_floor() {
        assert_eq!(SizingOptions::new().with_fetch_attempts(0).fetch_attempts, 1);
    }
}
