//! Aspect-ratio preserving image sizing.
//!
//! Native pixel dimensions are probed from the image header; the result is
//! scaled to fit a bounding box in points. Whenever the native size cannot be
//! determined the bounding box itself is used, so sizing never fails.

mod options;

pub use options::{ImageCategory, SizingOptions};

use crate::error::{Error, Result};
use crate::service::ImageFetcher;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// Width and height, in pixels for native sizes and points for rendered sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or `None` when either side is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.width > 0 && self.height > 0).then(|| self.width as f64 / self.height as f64)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Scale `native` to fit entirely inside `max_box`, keeping its aspect ratio.
///
/// `max_box` is returned unchanged when the native ratio is unknown.
pub fn fit_within(native: Dimensions, max_box: Dimensions) -> Dimensions {
    if native.aspect_ratio().is_none() || max_box.aspect_ratio().is_none() {
        return max_box;
    }
    let scale = f64::min(
        max_box.width as f64 / native.width as f64,
        max_box.height as f64 / native.height as f64,
    );
    let width = (native.width as f64 * scale).round().max(1.0) as u32;
    let height = (native.height as f64 * scale).round().max(1.0) as u32;
    Dimensions::new(width.min(max_box.width), height.min(max_box.height))
}

/// Read pixel dimensions from an encoded image header.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::ImageDecode(e.to_string()))?;
    if reader.format().is_none() {
        return Err(Error::ImageDecode("unrecognized image format".to_string()));
    }
    let (width, height) = reader.into_dimensions()?;
    Ok(Dimensions::new(width, height))
}

/// Computes rendered sizes for images fetched through an [`ImageFetcher`].
pub struct ImageSizer<'a, F> {
    fetcher: &'a F,
    options: &'a SizingOptions,
}

impl<'a, F: ImageFetcher> ImageSizer<'a, F> {
    /// Create a sizer.
    pub fn new(fetcher: &'a F, options: &'a SizingOptions) -> Self {
        Self { fetcher, options }
    }

    /// Fetch the image and read its native size.
    ///
    /// Transient failures are retried up to `fetch_attempts` times.
    pub async fn native_dimensions(&self, uri: &str) -> Result<Dimensions> {
        let attempts = self.options.fetch_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = match self.fetcher.fetch(uri).await {
                Ok(image) => image.ensure_image().and_then(|_| probe_dimensions(&image.bytes)),
                Err(e) => Err(e),
            };
            match result {
                Err(e) if e.is_transient() && attempt < attempts => {
                    debug!("fetch attempt {} for {} failed: {}", attempt, uri, e);
                    attempt += 1;
                    if !self.options.retry_delay.is_zero() {
                        tokio::time::sleep(self.options.retry_delay).await;
                    }
                }
                other => return other,
            }
        }
    }

    /// Size an image to fit `max_box`, falling back to `max_box` on any failure.
    pub async fn compute_dimensions(&self, uri: &str, max_box: Dimensions) -> Dimensions {
        match self.native_dimensions(uri).await {
            Ok(native) => {
                let size = fit_within(native, max_box);
                debug!("sized {} from {} to {}", uri, native, size);
                size
            }
            Err(e) => {
                warn!("could not read dimensions of {}: {}; using {}", uri, e, max_box);
                max_box
            }
        }
    }

    /// Size an image for a placeholder, choosing the box from its name.
    pub async fn size_for(&self, placeholder_name: &str, uri: &str) -> Dimensions {
        let category = ImageCategory::from_placeholder(placeholder_name);
        self.compute_dimensions(uri, self.options.preset(category))
            .await
    }
}

/// Size an image to fit `max_box` with default sizing options.
pub async fn compute_dimensions<F: ImageFetcher>(
    fetcher: &F,
    uri: &str,
    max_box: Dimensions,
) -> Dimensions {
    let options = SizingOptions::default();
    ImageSizer::new(fetcher, &options)
        .compute_dimensions(uri, max_box)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within_landscape() {
        let size = fit_within(Dimensions::new(800, 400), Dimensions::new(200, 200));
        assert_eq!(size, Dimensions::new(200, 100));
    }

    #[test]
    fn test_fit_within_square() {
        let size = fit_within(Dimensions::new(300, 300), Dimensions::new(200, 200));
        assert_eq!(size, Dimensions::new(200, 200));
    }

    #[test]
    fn test_fit_within_portrait_and_upscale() {
        let size = fit_within(Dimensions::new(100, 400), Dimensions::new(400, 300));
        assert_eq!(size, Dimensions::new(75, 300));

        let size = fit_within(Dimensions::new(20, 10), Dimensions::new(200, 150));
        assert_eq!(size, Dimensions::new(200, 100));
    }

    #[test]
    fn test_fit_within_rounds_to_nearest() {
        // 1000x333 into 200x150: scale 0.2 -> 200 x 66.6
        let size = fit_within(Dimensions::new(1000, 333), Dimensions::new(200, 150));
        assert_eq!(size, Dimensions::new(200, 67));
    }

    #[test]
    fn test_fit_within_unknown_ratio() {
        let max_box = Dimensions::new(200, 150);
        assert_eq!(fit_within(Dimensions::new(0, 10), max_box), max_box);
    }

    #[test]
    fn test_probe_png() {
        let img = image::RgbImage::new(32, 16);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(probe_dimensions(&bytes).unwrap(), Dimensions::new(32, 16));
    }

    #[test]
    fn test_probe_truncated_png() {
        let img = image::RgbImage::new(32, 16);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let err = probe_dimensions(&bytes[..12]).unwrap_err();
        assert!(matches!(err, Error::ImageDecode(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_probe_garbage() {
        assert!(matches!(
            probe_dimensions(b"definitely not an image"),
            Err(Error::ImageDecode(_))
        ));
    }
}
