//! Extraction invocation: drive the engine with resolved paths and collect
//! its report into an [`ExtractionResult`].
//!
//! The engine is CPU-bound and may take minutes on large or scanned
//! documents, so it runs on a `spawn_blocking` worker thread rather than a
//! Tokio executor thread. The requested image directory is passed through
//! even to engines that relocate assets beside the source document: the
//! relocation cannot be prevented from this side, only repaired afterwards
//! by [`crate::pipeline::images`].

use crate::config::ConversionConfig;
use crate::engine::{ExtractionEngine, ExtractionRequest};
use crate::error::{ConversionWarning, MarkPdfError};
use crate::output::DocumentMetadata;
use crate::pipeline::resolve::ConversionRequest;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// What extraction produced, consumed exactly once by the image corrector.
#[derive(Debug)]
pub struct ExtractionResult {
    /// Raw Markdown from the engine, not yet normalized or corrected.
    pub markdown: String,
    /// Image files the engine actually wrote, wherever they landed.
    pub emitted_images: Vec<PathBuf>,
    /// Document info dictionary.
    pub metadata: DocumentMetadata,
    /// Number of pages whose text came from OCR.
    pub ocr_pages: usize,
    /// Non-fatal conditions raised during extraction.
    pub warnings: Vec<ConversionWarning>,
}

/// Run the engine for one resolved request.
pub async fn extract(
    engine: Arc<dyn ExtractionEngine>,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ExtractionResult, MarkPdfError> {
    let engine_request = ExtractionRequest {
        pdf: request.pdf.clone(),
        image_mode: request.image_mode,
        image_dir: request.image_dir.clone(),
        ocr_languages: config.ocr_languages.clone(),
        max_rendered_pixels: config.max_rendered_pixels,
    };

    let output = tokio::task::spawn_blocking(move || engine.extract(&engine_request))
        .await
        .map_err(|e| MarkPdfError::Internal(format!("extraction task panicked: {e}")))??;

    let mut warnings = Vec::new();
    if !output.ocr_missing.is_empty() {
        warn!(
            "{} page(s) had no text layer and no OCR was available: {:?}",
            output.ocr_missing.len(),
            output.ocr_missing
        );
        warnings.push(ConversionWarning::OcrUnavailable {
            pages: output.ocr_missing,
        });
    }

    Ok(ExtractionResult {
        markdown: output.markdown,
        emitted_images: output.emitted_images,
        metadata: output.metadata,
        ocr_pages: output.ocr_pages.len(),
        warnings,
    })
}
