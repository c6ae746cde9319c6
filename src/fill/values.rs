//! Field values supplied by the caller.

use crate::error::{Error, Result};
use crate::locate::Placeholder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Values for one template.
///
/// ```
/// use docfill::fill::FieldValues;
///
/// let values: FieldValues = serde_json::from_str(
///     r#"{"text": {"artist": "Unknown"}, "gallery": ["https://img.test/1.jpg"]}"#,
/// ).unwrap();
/// assert_eq!(values.text["artist"], "Unknown");
/// assert!(values.images.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    /// Scalar replacements by placeholder name
    #[serde(default)]
    pub text: BTreeMap<String, String>,

    /// Image URLs by placeholder name
    #[serde(default)]
    pub images: BTreeMap<String, String>,

    /// Gallery image URLs, in display order
    #[serde(default)]
    pub gallery: Vec<String>,

    /// Report title to restyle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl FieldValues {
    /// Create empty values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text value.
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.insert(name.into(), value.into());
        self
    }

    /// Add an image URL.
    pub fn with_image(mut self, name: impl Into<String>, uri: impl Into<String>) -> Self {
        self.images.insert(name.into(), uri.into());
        self
    }

    /// Set the gallery URLs.
    pub fn with_gallery<S: Into<String>>(mut self, urls: impl IntoIterator<Item = S>) -> Self {
        self.gallery = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Check if nothing would be filled.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.images.is_empty()
            && self.gallery.is_empty()
            && self.title.is_none()
    }

    /// Check that every field name is a usable placeholder.
    ///
    /// Names must be valid, may not be both text and image fields, and may
    /// not collide with the gallery anchor.
    pub fn validate(&self, anchor: &str) -> Result<()> {
        for name in self.text.keys().chain(self.images.keys()) {
            Placeholder::new(name.as_str())?;
            if name == anchor {
                return Err(Error::invalid_field(
                    name.as_str(),
                    "name is reserved for the gallery anchor",
                ));
            }
        }
        if let Some(name) = self.text.keys().find(|k| self.images.contains_key(*k)) {
            return Err(Error::invalid_field(
                name.as_str(),
                "name is used for both text and an image",
            ));
        }
        Ok(())
    }
}
