//! In-memory collaborators.
//!
//! [`MemoryDocumentService`] applies batches to local documents with the same
//! offset semantics as the remote service: every operation is interpreted
//! against the state left by the operations before it, and a batch either
//! applies completely or not at all.

use super::{DocumentService, FetchedImage, ImageFetcher};
use crate::error::{Error, Result};
use crate::model::{
    utf16_to_byte, Block, Document, DocumentOffset, InlineImage, OffsetRange, Paragraph, Run,
    TextRun,
};
use crate::mutate::{Batch, EditOperation, StyleUpdate};
use log::{debug, trace};
use regex::RegexBuilder;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

type ApplyResult = std::result::Result<(), String>;

#[derive(Debug, Default)]
struct State {
    documents: HashMap<String, Document>,
    history: Vec<(String, Batch)>,
    rejected_uris: HashSet<String>,
    max_batch_operations: Option<usize>,
}

/// Document service backed by local documents.
#[derive(Debug, Default)]
pub struct MemoryDocumentService {
    state: Mutex<State>,
}

impl MemoryDocumentService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document and return the service.
    pub fn with_document(self, doc: Document) -> Self {
        self.insert(doc);
        self
    }

    /// Reject batches larger than `max` operations.
    pub fn with_max_batch_operations(self, max: usize) -> Self {
        self.lock().max_batch_operations = Some(max);
        self
    }

    /// Add or replace a document; offsets are recomputed.
    pub fn insert(&self, mut doc: Document) {
        doc.reindex();
        self.lock().documents.insert(doc.id.clone(), doc);
    }

    /// Current state of a document.
    pub fn document(&self, document_id: &str) -> Option<Document> {
        self.lock().documents.get(document_id).cloned()
    }

    /// Make every batch inserting an image from `uri` fail.
    pub fn reject_image_uri(&self, uri: impl Into<String>) {
        self.lock().rejected_uris.insert(uri.into());
    }

    /// Batches committed for a document, oldest first.
    pub fn history(&self, document_id: &str) -> Vec<Batch> {
        self.lock()
            .history
            .iter()
            .filter(|(id, _)| id == document_id)
            .map(|(_, batch)| batch.clone())
            .collect()
    }

    /// Total number of batches committed.
    pub fn batch_count(&self) -> usize {
        self.lock().history.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentService for MemoryDocumentService {
    async fn read(&self, document_id: &str) -> Result<Document> {
        self.document(document_id)
            .ok_or_else(|| Error::Other(format!("unknown document '{}'", document_id)))
    }

    async fn batch_update(&self, document_id: &str, operations: &[EditOperation]) -> Result<()> {
        let mut state = self.lock();
        if let Some(max) = state.max_batch_operations {
            if operations.len() > max {
                return Err(Error::MutationRejected(format!(
                    "batch of {} operations exceeds the limit of {}",
                    operations.len(),
                    max
                )));
            }
        }
        if let Some(uri) = operations.iter().find_map(|op| match op {
            EditOperation::InsertImage { uri, .. } if state.rejected_uris.contains(uri) => {
                Some(uri)
            }
            _ => None,
        }) {
            return Err(Error::MutationRejected(format!(
                "image at {} could not be retrieved",
                uri
            )));
        }

        let doc = state
            .documents
            .get(document_id)
            .ok_or_else(|| Error::Other(format!("unknown document '{}'", document_id)))?;
        let updated = apply_batch(doc, operations)?;
        debug!(
            "applied {} operation(s) to {}, revision {}",
            operations.len(),
            document_id,
            updated.revision
        );
        state.documents.insert(document_id.to_string(), updated);
        state
            .history
            .push((document_id.to_string(), Batch::from(operations.to_vec())));
        Ok(())
    }
}

/// Apply operations in order to a copy of `doc`.
///
/// Returns the updated document with its revision bumped, or
/// [`Error::MutationRejected`] naming the first operation that could not be
/// applied. `doc` itself is never modified.
pub fn apply_batch(doc: &Document, operations: &[EditOperation]) -> Result<Document> {
    let mut updated = doc.clone();
    for (i, op) in operations.iter().enumerate() {
        trace!("applying {:?}", op);
        apply_operation(&mut updated, op).map_err(|reason| {
            Error::MutationRejected(format!("operation {} ({}): {}", i, op.kind(), reason))
        })?;
        split_paragraphs(&mut updated.body);
        updated.reindex();
    }
    updated.revision += 1;
    Ok(updated)
}

fn apply_operation(doc: &mut Document, op: &EditOperation) -> ApplyResult {
    match op {
        EditOperation::DeleteRange { range } => delete_range(doc, *range),
        EditOperation::InsertText { at, text } => {
            if text.is_empty() {
                return Err("cannot insert empty text".to_string());
            }
            let paragraph = paragraph_at(doc, *at)?;
            insert_text(paragraph, *at, text)
        }
        EditOperation::InsertImage {
            at,
            uri,
            width,
            height,
        } => {
            if *width == 0 || *height == 0 {
                return Err(format!("image size {}x{} is empty", width, height));
            }
            let paragraph = paragraph_at(doc, *at)?;
            insert_image(paragraph, *at, InlineImage::new(uri.clone(), *width, *height))
        }
        EditOperation::UpdateStyle { range, style } => update_style(doc, *range, style),
        EditOperation::ReplaceAllText {
            find,
            replace,
            match_case,
        } => replace_all(doc, find, replace, *match_case),
    }
}

fn paragraph_at(doc: &mut Document, at: DocumentOffset) -> std::result::Result<&mut Paragraph, String> {
    doc.paragraphs_mut()
        .find(|p| p.range.contains(at))
        .ok_or_else(|| format!("offset {} is not inside a paragraph", at))
}

fn run_index(paragraph: &Paragraph, at: DocumentOffset) -> std::result::Result<usize, String> {
    paragraph
        .runs
        .iter()
        .position(|r| r.range().contains(at))
        .ok_or_else(|| format!("offset {} is not inside a run", at))
}

fn byte_index(run: &TextRun, at: DocumentOffset) -> std::result::Result<usize, String> {
    utf16_to_byte(&run.content, at - run.range.start)
        .ok_or_else(|| format!("offset {} splits a character", at))
}

fn insert_text(paragraph: &mut Paragraph, at: DocumentOffset, text: &str) -> ApplyResult {
    let i = run_index(paragraph, at)?;
    match &mut paragraph.runs[i] {
        Run::Text(run) => {
            let byte = byte_index(run, at)?;
            run.content.insert_str(byte, text);
            return Ok(());
        }
        Run::InlineImage(_) => {}
    }
    paragraph.runs.insert(i, Run::Text(TextRun::new(text)));
    Ok(())
}

fn insert_image(paragraph: &mut Paragraph, at: DocumentOffset, image: InlineImage) -> ApplyResult {
    let i = run_index(paragraph, at)?;
    if paragraph.runs[i].range().start == at {
        paragraph.runs.insert(i, Run::InlineImage(image));
        return Ok(());
    }
    // An image run only contains its own start, so this is a text run.
    let tail = match &mut paragraph.runs[i] {
        Run::Text(run) => {
            let byte = byte_index(run, at)?;
            TextRun {
                range: OffsetRange::default(),
                content: run.content.split_off(byte),
                style: run.style.clone(),
            }
        }
        Run::InlineImage(_) => return Err(format!("offset {} is inside an image", at)),
    };
    paragraph.runs.insert(i + 1, Run::InlineImage(image));
    paragraph.runs.insert(i + 2, Run::Text(tail));
    Ok(())
}

fn delete_range(doc: &mut Document, range: OffsetRange) -> ApplyResult {
    if range.is_empty() {
        return Err(format!("range {} is empty", range));
    }
    let mut removed = 0;
    for paragraph in doc.paragraphs_mut() {
        if !paragraph.range.overlaps(&range) {
            continue;
        }
        if range.contains(paragraph.range.end - 1) {
            return Err(format!("range {} removes a paragraph break", range));
        }
        for run in paragraph.runs.iter_mut() {
            let Some(overlap) = run.range().intersection(&range) else {
                continue;
            };
            match run {
                Run::Text(t) => {
                    let from = byte_index(t, overlap.start)?;
                    let to = byte_index(t, overlap.end)?;
                    t.content.replace_range(from..to, "");
                }
                Run::InlineImage(_) => {}
            }
            removed += overlap.len();
        }
        paragraph.runs.retain(|run| match run {
            Run::Text(t) => !t.content.is_empty(),
            Run::InlineImage(img) => !range.contains(img.range.start),
        });
    }
    if removed != range.len() {
        return Err(format!(
            "range {} crosses a structural boundary ({} of {} units removable)",
            range,
            removed,
            range.len()
        ));
    }
    Ok(())
}

fn update_style(doc: &mut Document, range: OffsetRange, style: &StyleUpdate) -> ApplyResult {
    if range.is_empty() || range.end > doc.end_offset() {
        return Err(format!("range {} is outside the document", range));
    }
    for paragraph in doc.paragraphs_mut() {
        if !paragraph.range.overlaps(&range) {
            continue;
        }
        match style {
            StyleUpdate::Paragraph(update) => update.apply_to(&mut paragraph.style),
            StyleUpdate::Text(update) => {
                for run in paragraph.runs.iter_mut() {
                    if let Run::Text(t) = run {
                        if t.range.overlaps(&range) {
                            update.apply_to(&mut t.style);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn replace_all(doc: &mut Document, find: &str, replace: &str, match_case: bool) -> ApplyResult {
    if find.is_empty() {
        return Err("search text is empty".to_string());
    }
    if find.contains('\n') {
        return Err("search text spans a paragraph break".to_string());
    }
    let pattern = if match_case {
        None
    } else {
        let re = RegexBuilder::new(&regex::escape(find))
            .case_insensitive(true)
            .build()
            .map_err(|e| e.to_string())?;
        Some(re)
    };
    for paragraph in doc.paragraphs_mut() {
        for run in paragraph.runs.iter_mut() {
            let Run::Text(t) = run else { continue };
            let replaced = match &pattern {
                None if t.content.contains(find) => t.content.replace(find, replace),
                Some(re) if re.is_match(&t.content) => {
                    re.replace_all(&t.content, regex::NoExpand(replace)).into_owned()
                }
                _ => continue,
            };
            t.content = replaced;
        }
        paragraph.runs.retain(|run| match run {
            Run::Text(t) => !t.content.is_empty(),
            Run::InlineImage(_) => true,
        });
    }
    Ok(())
}

/// Split paragraphs at embedded newlines, recursing into table cells.
fn split_paragraphs(blocks: &mut Vec<Block>) {
    for block in mem::take(blocks) {
        match block {
            Block::Paragraph(p) => blocks.extend(split_paragraph(p).into_iter().map(Block::Paragraph)),
            Block::Table(mut table) => {
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    split_paragraphs(&mut cell.content);
                }
                blocks.push(Block::Table(table));
            }
        }
    }
}

fn split_paragraph(paragraph: Paragraph) -> Vec<Paragraph> {
    let mut out = Vec::new();
    let mut runs = Vec::new();
    let new_paragraph = |runs| Paragraph {
        range: OffsetRange::default(),
        runs,
        style: paragraph.style.clone(),
    };
    for run in paragraph.runs.iter().cloned() {
        match run {
            Run::Text(t) => {
                for piece in t.content.split_inclusive('\n') {
                    runs.push(Run::Text(TextRun {
                        range: OffsetRange::default(),
                        content: piece.to_string(),
                        style: t.style.clone(),
                    }));
                    if piece.ends_with('\n') {
                        out.push(new_paragraph(mem::take(&mut runs)));
                    }
                }
            }
            image => runs.push(image),
        }
    }
    if !runs.is_empty() {
        out.push(new_paragraph(runs));
    }
    out
}

/// Image fetcher serving bytes from memory.
#[derive(Debug, Default)]
pub struct MemoryImageFetcher {
    images: HashMap<String, FetchedImage>,
    failures: Mutex<HashMap<String, u32>>,
    fetches: Mutex<Vec<String>>,
}

impl MemoryImageFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `uri`; the content type is sniffed.
    pub fn with_image(mut self, uri: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.images.insert(uri.into(), FetchedImage::new(bytes, None));
        self
    }

    /// Serve a fetched image with an explicit content type.
    pub fn with_response(mut self, uri: impl Into<String>, image: FetchedImage) -> Self {
        self.images.insert(uri.into(), image);
        self
    }

    /// Serve a blank PNG of the given pixel size.
    pub fn with_png(self, uri: impl Into<String>, width: u32, height: u32) -> Result<Self> {
        let bytes = encode_png(width, height)?;
        Ok(self.with_image(uri, bytes))
    }

    /// Fail the next `count` fetches of `uri` with a transient error.
    pub fn with_transient_failures(self, uri: impl Into<String>, count: u32) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.into(), count);
        self
    }

    /// Number of fetches made for `uri`.
    pub fn fetch_count(&self, uri: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|u| *u == uri)
            .count()
    }
}

impl ImageFetcher for MemoryImageFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchedImage> {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(uri.to_string());

        {
            let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(remaining) = failures.get_mut(uri) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(Error::TransientIo(format!("connection reset: {}", uri)));
                }
            }
        }

        self.images
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::Other(format!("404 Not Found: {}", uri)))
    }
}

/// Encode a blank PNG of the given pixel size.
pub fn encode_png(width: u32, height: u32) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}
