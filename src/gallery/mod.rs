//! Gallery layout engine.
//!
//! Inserts a variable number of images at a single anchor placeholder as a
//! grid of fixed-width rows. Image sizes are probed concurrently; batches are
//! submitted strictly one after another. A bad image never aborts the
//! gallery: it is replaced by a short text marker.

mod layout;
mod options;

pub use layout::{plan_gallery, GalleryItem, GalleryPlan};
pub use options::GalleryOptions;

use crate::error::{Error, Result};
use crate::locate::{find_occurrences, Placeholder};
use crate::model::Document;
use crate::mutate::{is_valid_image_uri, EditOperation};
use crate::service::{DocumentService, ImageFetcher};
use crate::sizing::{fit_within, ImageCategory, ImageSizer, SizingOptions};
use futures_util::future::join_all;
use log::{debug, info, warn};

/// What a gallery submission did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryOutcome {
    /// Images inserted
    pub images: usize,

    /// Text markers inserted instead of images
    pub fallbacks: usize,

    /// Batches accepted by the service
    pub batches: usize,

    /// Operations accepted by the service
    pub operations: usize,

    /// Per-image problems
    pub warnings: Vec<String>,
}

/// Probe every URL concurrently and turn it into a grid item.
///
/// Invalid or unreachable URLs become [`GalleryItem::Unavailable`]; the
/// others are fitted into the gallery thumbnail box.
pub async fn resolve_items<F: ImageFetcher>(
    urls: &[String],
    fetcher: &F,
    sizing: &SizingOptions,
) -> Vec<GalleryItem> {
    let sizer = ImageSizer::new(fetcher, sizing);
    let thumbnail = sizing.preset(ImageCategory::Gallery);
    let sizer = &sizer;

    join_all(urls.iter().map(|url| async move {
        if !is_valid_image_uri(url) {
            warn!("gallery URL {:?} is not a valid image URI", url);
            return GalleryItem::Unavailable { uri: url.clone() };
        }
        match sizer.native_dimensions(url).await {
            Ok(native) => GalleryItem::Image {
                uri: url.clone(),
                size: fit_within(native, thumbnail),
            },
            Err(e) => {
                warn!("gallery image {} unavailable: {}", url, e);
                GalleryItem::Unavailable { uri: url.clone() }
            }
        }
    }))
    .await
}

/// Lay out a gallery of `urls` at the anchor placeholder.
///
/// Fails with [`Error::NotFound`] when the anchor is absent. When the anchor
/// occurs more than once only the first occurrence is used.
pub async fn layout_gallery<F: ImageFetcher>(
    doc: &Document,
    anchor: &Placeholder,
    urls: &[String],
    fetcher: &F,
    options: &GalleryOptions,
    sizing: &SizingOptions,
) -> Result<GalleryPlan> {
    let occurrences = find_occurrences(doc, anchor);
    let Some(&first) = occurrences.first() else {
        return Err(Error::NotFound(anchor.token().to_string()));
    };
    if occurrences.len() > 1 {
        warn!(
            "{} occurs {} times; using the first at {}",
            anchor,
            occurrences.len(),
            first.range()
        );
    }

    let items = resolve_items(urls, fetcher, sizing).await;
    debug!(
        "gallery: {} of {} image(s) usable",
        items.iter().filter(|i| i.is_image()).count(),
        items.len()
    );
    Ok(plan_gallery(first, items, options))
}

/// Submit a gallery plan batch by batch.
///
/// A rejected chunk is retried one item at a time, and an item that is still
/// rejected is inserted as its text marker. Later batches are laid out from
/// what was actually inserted. Errors other than a rejection, and a rejected
/// header, are returned.
pub async fn submit_gallery<D: DocumentService>(
    service: &D,
    document_id: &str,
    plan: &GalleryPlan,
) -> Result<GalleryOutcome> {
    let mut outcome = GalleryOutcome::default();
    submit(service, document_id, plan.header().operations(), &mut outcome).await?;

    let mut writer = plan.writer();
    for chunk in plan.chunks() {
        let mut attempt = writer.clone();
        let ops: Vec<EditOperation> = chunk
            .iter()
            .flat_map(|item| attempt.item_operations(item))
            .collect();

        match submit(service, document_id, &ops, &mut outcome).await {
            Ok(()) => {
                writer = attempt;
                outcome.images += chunk.iter().filter(|i| i.is_image()).count();
                outcome.fallbacks += chunk.iter().filter(|i| !i.is_image()).count();
            }
            Err(Error::MutationRejected(reason)) => {
                warn!("gallery batch rejected ({}); retrying item by item", reason);
                for item in chunk {
                    submit_item(service, document_id, item, &mut writer, &mut outcome).await?;
                }
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "gallery: {} image(s), {} fallback(s) in {} batch(es)",
        outcome.images, outcome.fallbacks, outcome.batches
    );
    Ok(outcome)
}

async fn submit_item<D: DocumentService>(
    service: &D,
    document_id: &str,
    item: &GalleryItem,
    writer: &mut layout::GalleryWriter,
    outcome: &mut GalleryOutcome,
) -> Result<()> {
    let mut attempt = writer.clone();
    let ops = attempt.item_operations(item);
    match submit(service, document_id, &ops, outcome).await {
        Ok(()) => {
            *writer = attempt;
            if item.is_image() {
                outcome.images += 1;
            } else {
                outcome.fallbacks += 1;
            }
            return Ok(());
        }
        Err(Error::MutationRejected(reason)) if item.is_image() => {
            let msg = format!("image {} rejected: {}", item.uri(), reason);
            warn!("{}", msg);
            outcome.warnings.push(msg);
        }
        Err(e) => return Err(e),
    }

    let mut attempt = writer.clone();
    let ops = attempt.item_operations(&item.to_unavailable());
    submit(service, document_id, &ops, outcome).await?;
    *writer = attempt;
    outcome.fallbacks += 1;
    Ok(())
}

async fn submit<D: DocumentService>(
    service: &D,
    document_id: &str,
    ops: &[EditOperation],
    outcome: &mut GalleryOutcome,
) -> Result<()> {
    if ops.is_empty() {
        return Ok(());
    }
    service.batch_update(document_id, ops).await?;
    outcome.batches += 1;
    outcome.operations += ops.len();
    Ok(())
}

/// Read the document, lay out the gallery and submit it.
pub async fn populate_gallery<D: DocumentService, F: ImageFetcher>(
    service: &D,
    fetcher: &F,
    document_id: &str,
    anchor: &Placeholder,
    urls: &[String],
    options: &GalleryOptions,
    sizing: &SizingOptions,
) -> Result<GalleryOutcome> {
    let doc = service.read(document_id).await?;
    let plan = layout_gallery(&doc, anchor, urls, fetcher, options, sizing).await?;
    let mut outcome = submit_gallery(service, document_id, &plan).await?;
    outcome.warnings.extend(
        plan.items()
            .iter()
            .filter(|i| !i.is_image())
            .map(|i| format!("gallery image {} unavailable", i.uri())),
    );
    Ok(outcome)
}
