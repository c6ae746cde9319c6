//! Fill orchestration.
//!
//! A fill run resolves one template in fixed phases: analysis, placeholders,
//! title, gallery, images. Every phase reads a fresh snapshot, because each
//! earlier batch may have moved offsets, and submits its batches one after
//! another. A failing phase is recorded and the next phase still runs; only
//! malformed field values stop the run.

mod options;
mod report;
mod values;

pub use options::{FillOptions, DEFAULT_ANCHOR};
pub use report::{FillReport, Phase, PhaseOutcome, PhaseReport};
pub use values::FieldValues;

use crate::error::{Error, Result};
use crate::gallery::populate_gallery;
use crate::gate::{should_populate_gallery, GalleryState};
use crate::locate::{find_all_occurrences, find_occurrences, find_title, title_font_size, Placeholder};
use crate::model::Document;
use crate::mutate::{
    is_valid_image_uri, BatchBuilder, BatchPlan, EditOperation, Replacement, TextStyleUpdate,
};
use crate::service::{DocumentService, ImageFetcher, NoAnalyzer, SimilarityAnalyzer};
use crate::sizing::{ImageCategory, ImageSizer};
use futures_util::future::join_all;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Runs fill phases against a document service.
pub struct Filler<D, F, A = NoAnalyzer> {
    service: D,
    fetcher: F,
    analyzer: A,
    options: FillOptions,
}

impl<D: DocumentService, F: ImageFetcher> Filler<D, F> {
    /// Create a filler without a similarity analyzer.
    pub fn new(service: D, fetcher: F) -> Self {
        Self {
            service,
            fetcher,
            analyzer: NoAnalyzer,
            options: FillOptions::default(),
        }
    }
}

impl<D, F, A> Filler<D, F, A>
where
    D: DocumentService,
    F: ImageFetcher,
    A: SimilarityAnalyzer,
{
    /// Use an analyzer to refresh the gallery.
    pub fn with_analyzer<B: SimilarityAnalyzer>(self, analyzer: B) -> Filler<D, F, B> {
        Filler {
            service: self.service,
            fetcher: self.fetcher,
            analyzer,
            options: self.options,
        }
    }

    /// Set fill options.
    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// Fill a document.
    ///
    /// `state` is the gallery state read from the external system; `None`
    /// counts as "not populated".
    pub async fn fill(
        &self,
        document_id: &str,
        values: &FieldValues,
        state: Option<&GalleryState>,
    ) -> Result<FillReport> {
        values.validate(&self.options.anchor)?;

        let mut values = values.clone();
        let mut report = FillReport::new(document_id);

        let outcome = PhaseOutcome::from_result(self.analysis_phase(&mut values, state).await);
        self.finish(&mut report, Phase::Analysis, outcome);

        let result = self
            .placeholder_phase(document_id, &values, &mut report.warnings)
            .await;
        self.finish(&mut report, Phase::Placeholders, PhaseOutcome::from_result(result));

        let result = self.title_phase(document_id, &values).await;
        self.finish(&mut report, Phase::Title, PhaseOutcome::from_result(result));

        let result = self
            .gallery_phase(document_id, &values, &mut report.warnings)
            .await;
        self.finish(&mut report, Phase::Gallery, PhaseOutcome::from_result(result));

        let result = self
            .image_phase(document_id, &values, &mut report.warnings)
            .await;
        self.finish(&mut report, Phase::Images, PhaseOutcome::from_result(result));

        info!(
            "filled {}: {} operation(s), {} warning(s)",
            document_id,
            report.operation_count(),
            report.warnings.len()
        );
        Ok(report)
    }

    fn finish(&self, report: &mut FillReport, phase: Phase, outcome: PhaseOutcome) {
        match &outcome {
            PhaseOutcome::Applied {
                operations,
                batches,
            } => info!(
                "{} phase: {} operation(s) in {} batch(es)",
                phase, operations, batches
            ),
            PhaseOutcome::Skipped { reason } => info!("{} phase skipped: {}", phase, reason),
            PhaseOutcome::Failed { error } => warn!("{} phase failed: {}", phase, error),
        }
        report.record(phase, outcome);
    }

    async fn analysis_phase(
        &self,
        values: &mut FieldValues,
        state: Option<&GalleryState>,
    ) -> Result<PhaseOutcome> {
        let state = state.cloned().unwrap_or_default();
        if !should_populate_gallery(&state) {
            return Ok(PhaseOutcome::skipped(format!(
                "gallery already populated with {} item(s)",
                state.existing_ids.len()
            )));
        }
        let found = self.analyzer.find_similar().await?;
        if found.is_empty() {
            return Ok(PhaseOutcome::skipped("no similar images found"));
        }
        debug!("analysis found {} similar image(s)", found.len());
        values.gallery = found;
        Ok(PhaseOutcome::Applied {
            operations: 0,
            batches: 0,
        })
    }

    async fn placeholder_phase(
        &self,
        document_id: &str,
        values: &FieldValues,
        warnings: &mut Vec<String>,
    ) -> Result<PhaseOutcome> {
        if values.text.is_empty() {
            return Ok(PhaseOutcome::skipped("no text fields"));
        }
        let doc = self.service.read(document_id).await?;
        let plan = plan_text_replacements(&doc, &values.text, &self.options)?;
        warnings.extend(plan.warnings.iter().cloned());
        if plan.is_empty() {
            return Ok(PhaseOutcome::skipped("no text placeholders found"));
        }
        submit_plan(&self.service, document_id, &plan).await
    }

    async fn title_phase(&self, document_id: &str, values: &FieldValues) -> Result<PhaseOutcome> {
        let Some(title) = values.title.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Ok(PhaseOutcome::skipped("no title"));
        };
        let doc = self.service.read(document_id).await?;
        let range = find_title(&doc, title)
            .ok_or_else(|| Error::NotFound(format!("title {:?}", title)))?;
        let op = EditOperation::text_style(range, TextStyleUpdate::font_size(title_font_size(title)));
        self.service.batch_update(document_id, &[op]).await?;
        Ok(PhaseOutcome::Applied {
            operations: 1,
            batches: 1,
        })
    }

    async fn gallery_phase(
        &self,
        document_id: &str,
        values: &FieldValues,
        warnings: &mut Vec<String>,
    ) -> Result<PhaseOutcome> {
        let anchor = Placeholder::new(self.options.anchor.as_str())?;
        let gallery = self
            .options
            .gallery
            .clone()
            .with_max_operations_per_batch(self.options.max_batch_operations);
        let outcome = populate_gallery(
            &self.service,
            &self.fetcher,
            document_id,
            &anchor,
            &values.gallery,
            &gallery,
            &self.options.sizing,
        )
        .await?;
        warnings.extend(outcome.warnings);
        Ok(PhaseOutcome::Applied {
            operations: outcome.operations,
            batches: outcome.batches,
        })
    }

    async fn image_phase(
        &self,
        document_id: &str,
        values: &FieldValues,
        warnings: &mut Vec<String>,
    ) -> Result<PhaseOutcome> {
        if values.images.is_empty() {
            return Ok(PhaseOutcome::skipped("no image fields"));
        }
        let doc = self.service.read(document_id).await?;
        let fields = self.size_images(&doc, &values.images, warnings).await?;
        if fields.is_empty() {
            return Ok(PhaseOutcome::skipped("no image placeholders found"));
        }

        let mut builder = self.builder();
        for (placeholder, replacement) in &fields {
            builder.replace(find_occurrences(&doc, placeholder), replacement);
        }
        let plan = builder.build();
        warnings.extend(plan.warnings.iter().cloned());

        match submit_plan(&self.service, document_id, &plan).await {
            Err(Error::MutationRejected(reason)) => {
                warn!("image batch rejected ({}); retrying field by field", reason);
                self.images_one_by_one(document_id, &fields, warnings).await
            }
            other => other,
        }
    }

    /// Size every present image field concurrently.
    async fn size_images(
        &self,
        doc: &Document,
        images: &BTreeMap<String, String>,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<(Placeholder, Replacement)>> {
        let placeholders = images
            .keys()
            .map(|name| Placeholder::new(name.as_str()))
            .collect::<Result<Vec<_>>>()?;
        let found = find_all_occurrences(doc, &placeholders);

        let mut present = Vec::new();
        for placeholder in placeholders {
            if found[placeholder.name()].is_empty() {
                let msg = format!("placeholder {} not found", placeholder);
                warn!("{}", msg);
                warnings.push(msg);
            } else {
                present.push(placeholder);
            }
        }

        let sizer = ImageSizer::new(&self.fetcher, &self.options.sizing);
        let sizer = &sizer;
        let sizes = join_all(present.iter().map(|placeholder| async move {
            let uri = &images[placeholder.name()];
            if is_valid_image_uri(uri) {
                sizer.size_for(placeholder.name(), uri).await
            } else {
                let category = ImageCategory::from_placeholder(placeholder.name());
                self.options.sizing.preset(category)
            }
        }))
        .await;

        Ok(present
            .into_iter()
            .zip(sizes)
            .map(|(placeholder, size)| {
                let uri = images[placeholder.name()].clone();
                (placeholder, Replacement::image(uri, size))
            })
            .collect())
    }

    /// Submit each image field on its own; a field that is still rejected
    /// gets the unavailable text instead.
    async fn images_one_by_one(
        &self,
        document_id: &str,
        fields: &[(Placeholder, Replacement)],
        warnings: &mut Vec<String>,
    ) -> Result<PhaseOutcome> {
        let mut operations = 0;
        let mut batches = 0;
        for (placeholder, replacement) in fields {
            let doc = self.service.read(document_id).await?;
            let occurrences = find_occurrences(&doc, placeholder);
            if occurrences.is_empty() {
                continue;
            }

            let mut builder = self.builder();
            builder.replace(occurrences.iter().copied(), replacement);
            let result = submit_plan(&self.service, document_id, &builder.build()).await;
            let outcome = match result {
                Err(Error::MutationRejected(reason)) => {
                    let msg = format!("image for {} rejected: {}", placeholder, reason);
                    warn!("{}", msg);
                    warnings.push(msg);

                    let doc = self.service.read(document_id).await?;
                    let fallback = Replacement::raw_text(self.options.gallery.unavailable_text.clone());
                    let mut builder = self.builder();
                    builder.replace(find_occurrences(&doc, placeholder), &fallback);
                    submit_plan(&self.service, document_id, &builder.build()).await?
                }
                other => other?,
            };
            if let PhaseOutcome::Applied {
                operations: ops,
                batches: count,
            } = outcome
            {
                operations += ops;
                batches += count;
            }
        }
        Ok(PhaseOutcome::Applied {
            operations,
            batches,
        })
    }

    fn builder(&self) -> BatchBuilder {
        BatchBuilder::new().with_max_operations(self.options.max_batch_operations)
    }
}

/// Plan the replacement of every text field in one combined batch plan.
///
/// Fields whose placeholder is absent produce a warning, not an error.
pub fn plan_text_replacements(
    doc: &Document,
    text: &BTreeMap<String, String>,
    options: &FillOptions,
) -> Result<BatchPlan> {
    let placeholders = text
        .keys()
        .map(|name| Placeholder::new(name.as_str()))
        .collect::<Result<Vec<_>>>()?;
    let found = find_all_occurrences(doc, &placeholders);

    let mut builder = BatchBuilder::new().with_max_operations(options.max_batch_operations);
    let mut missing = Vec::new();
    for placeholder in &placeholders {
        let occurrences = &found[placeholder.name()];
        if occurrences.is_empty() {
            let msg = format!("placeholder {} not found", placeholder);
            warn!("{}", msg);
            missing.push(msg);
            continue;
        }
        let value = &text[placeholder.name()];
        if options.use_replace_all {
            builder.replace_all(placeholder, value);
        } else {
            builder.replace(occurrences.iter().copied(), &Replacement::text(value));
        }
    }

    let mut plan = builder.build();
    plan.warnings.extend(missing);
    Ok(plan)
}

/// Submit a plan's batches strictly in order.
///
/// Stops at the first error; batches already accepted stay applied.
pub async fn submit_plan<D: DocumentService>(
    service: &D,
    document_id: &str,
    plan: &BatchPlan,
) -> Result<PhaseOutcome> {
    let mut operations = 0;
    let mut batches = 0;
    for batch in plan.batches.iter().filter(|b| !b.is_empty()) {
        service.batch_update(document_id, batch.operations()).await?;
        debug!("batch {} accepted: {} operation(s)", batches + 1, batch.len());
        operations += batch.len();
        batches += 1;
    }
    Ok(PhaseOutcome::Applied {
        operations,
        batches,
    })
}
