//! Collaborator interfaces.
//!
//! The engine only talks to the outside world through these traits: reading
//! a document snapshot, submitting a batch, fetching image bytes and running
//! the (expensive) similarity analysis. Every call is an `.await` point; the
//! engine never issues two batch submissions for one document concurrently.

#[cfg(feature = "http")]
mod http;
mod memory;

#[cfg(feature = "http")]
pub use http::{HttpImageFetcher, DEFAULT_TIMEOUT};
pub use memory::{apply_batch, encode_png, MemoryDocumentService, MemoryImageFetcher};

use crate::error::{Error, Result};
use crate::model::Document;
use crate::mutate::EditOperation;

/// Remote document service.
#[allow(async_fn_in_trait)]
pub trait DocumentService {
    /// Read the current snapshot of a document.
    async fn read(&self, document_id: &str) -> Result<Document>;

    /// Apply operations atomically and in order.
    ///
    /// On [`Error::MutationRejected`] the document is left unchanged.
    async fn batch_update(&self, document_id: &str, operations: &[EditOperation]) -> Result<()>;
}

/// Source of image bytes.
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    /// Fetch the image behind `uri`.
    async fn fetch(&self, uri: &str) -> Result<FetchedImage>;
}

/// Finds images similar to the document's subject.
#[allow(async_fn_in_trait)]
pub trait SimilarityAnalyzer {
    /// Run the analysis and return gallery image URLs.
    async fn find_similar(&self) -> Result<Vec<String>>;
}

impl<T: DocumentService> DocumentService for &T {
    async fn read(&self, document_id: &str) -> Result<Document> {
        (**self).read(document_id).await
    }

    async fn batch_update(&self, document_id: &str, operations: &[EditOperation]) -> Result<()> {
        (**self).batch_update(document_id, operations).await
    }
}

impl<T: ImageFetcher> ImageFetcher for &T {
    async fn fetch(&self, uri: &str) -> Result<FetchedImage> {
        (**self).fetch(uri).await
    }
}

impl<T: SimilarityAnalyzer> SimilarityAnalyzer for &T {
    async fn find_similar(&self) -> Result<Vec<String>> {
        (**self).find_similar().await
    }
}

/// Analyzer used when none is configured; never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalyzer;

impl SimilarityAnalyzer for NoAnalyzer {
    async fn find_similar(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Raw image bytes plus the reported content type.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    /// Encoded image data
    pub bytes: Vec<u8>,

    /// Content type reported by the source, if any
    pub content_type: Option<String>,
}

impl FetchedImage {
    /// Create a fetched image.
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    /// MIME type: the reported content type, else one sniffed from the bytes.
    pub fn mime_type(&self) -> Option<&str> {
        match self.content_type.as_deref() {
            Some(ct) => Some(ct.split(';').next().unwrap_or(ct).trim()),
            None => detect_mime_type(&self.bytes),
        }
    }

    /// Fail unless the data is an image.
    pub fn ensure_image(&self) -> Result<()> {
        match self.mime_type() {
            Some(mime) if mime.starts_with("image/") => Ok(()),
            Some(mime) => Err(Error::ImageDecode(format!("content type {} is not an image", mime))),
            None => Err(Error::ImageDecode("unrecognized image data".to_string())),
        }
    }
}

/// Detect an image MIME type from magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // WEBP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}
