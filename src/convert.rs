//! Conversion entry points: orchestrate the pipeline stages end to end.
//!
//! One conversion runs its stages strictly in order (resolve, extract,
//! normalize, correct images, write) and returns a [`ConversionOutput`]
//! carrying the document, its final location, and every non-fatal condition
//! met along the way. Fatal errors abort before the output file exists;
//! warnings never do. Batch work goes through [`convert_many`], which runs
//! whole conversions concurrently while each one stays sequential inside.

use crate::config::ConversionConfig;
use crate::engine::{ExtractionEngine, LayoutExtractor};
use crate::error::MarkPdfError;
use crate::ocr::TesseractProbe;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata};
use crate::pipeline::{extract, images, normalize, resolve, write};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file or URL to Markdown and write it to the configured
/// target.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even when the output is degraded
/// (check `output.warnings`).
///
/// # Errors
/// Returns `Err(MarkPdfError)` only for fatal errors (bad input path, not a
/// PDF, engine failure, unwritable output), and always before the output
/// file has been created.
pub async fn convert(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MarkPdfError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("starting conversion: {}", input);

    // ── Step 1: Resolve and validate paths ───────────────────────────────
    let request = resolve::resolve(input, config).await?;

    // ── Step 2: Extract via the engine ───────────────────────────────────
    let engine = resolve_engine(config);
    let capabilities = engine.capabilities();
    let extract_start = Instant::now();
    let extraction = extract::extract(engine, &request, config).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    debug!(
        "extraction finished in {}ms ({} images emitted)",
        extract_duration_ms,
        extraction.emitted_images.len()
    );

    let mut warnings = extraction.warnings;

    // ── Step 3: Normalize the Markdown text ──────────────────────────────
    let markdown = normalize::normalize_markdown(&extraction.markdown);

    // ── Step 4: Correct image references ─────────────────────────────────
    let corrected = images::correct_image_references(
        &markdown,
        &request,
        &extraction.emitted_images,
        &capabilities,
    );
    warnings.extend(corrected.warnings);

    // ── Step 5: Assemble the final document ──────────────────────────────
    let markdown = if config.include_metadata {
        format!(
            "{}{}",
            format_yaml_front_matter(&extraction.metadata),
            corrected.markdown
        )
    } else {
        corrected.markdown
    };

    // ── Step 6: Write the output ─────────────────────────────────────────
    let output_path = write::write_output(request.output.as_deref(), &markdown).await?;

    let stats = ConversionStats {
        page_count: extraction.metadata.page_count,
        ocr_pages: extraction.ocr_pages,
        images_emitted: extraction.emitted_images.len(),
        images_relocated: corrected.relocated,
        images_embedded: corrected.embedded,
        extract_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "conversion complete: {} pages, {} warning(s), {}ms total",
        stats.page_count,
        warnings.len(),
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        output_path,
        images: corrected.images,
        warnings,
        metadata: extraction.metadata,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MarkPdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MarkPdfError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert(input, config))
}

/// Convert several inputs with bounded concurrency.
///
/// Results come back in input order. Conversions are independent: a fatal
/// error in one does not stop the others, and the image corrector's
/// move-if-exists semantics keep conversions sharing a source directory from
/// interfering with each other.
pub async fn convert_many(
    inputs: &[String],
    config: &ConversionConfig,
    concurrency: usize,
) -> Vec<Result<ConversionOutput, MarkPdfError>> {
    stream::iter(inputs.iter().map(|input| convert(input, config)))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Extract document metadata without converting content.
pub async fn inspect(input: impl AsRef<str>) -> Result<DocumentMetadata, MarkPdfError> {
    let config = ConversionConfig::default();
    let request = resolve::resolve(input.as_ref(), &config).await?;
    let engine = resolve_engine(&config);

    let engine_request = crate::engine::ExtractionRequest {
        pdf: request.pdf.clone(),
        image_mode: crate::config::ImageMode::None,
        image_dir: None,
        ocr_languages: Vec::new(),
        max_rendered_pixels: config.max_rendered_pixels,
    };
    tokio::task::spawn_blocking(move || engine.inspect(&engine_request))
        .await
        .map_err(|e| MarkPdfError::Internal(format!("inspect task panicked: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The caller's engine, or the pdfium-backed default wired to the caller's
/// OCR probe (or the real Tesseract probe).
fn resolve_engine(config: &ConversionConfig) -> Arc<dyn ExtractionEngine> {
    if let Some(ref engine) = config.engine {
        return Arc::clone(engine);
    }
    let probe = config
        .ocr
        .clone()
        .unwrap_or_else(|| Arc::new(TesseractProbe));
    Arc::new(LayoutExtractor::new(probe))
}

/// Format document metadata as YAML front matter.
fn format_yaml_front_matter(meta: &DocumentMetadata) -> String {
    let mut yaml = String::from("---\n");

    if let Some(ref t) = meta.title {
        yaml.push_str(&format!("title: \"{}\"\n", t));
    }
    if let Some(ref a) = meta.author {
        yaml.push_str(&format!("author: \"{}\"\n", a));
    }
    if let Some(ref s) = meta.subject {
        yaml.push_str(&format!("subject: \"{}\"\n", s));
    }
    if let Some(ref c) = meta.creator {
        yaml.push_str(&format!("creator: \"{}\"\n", c));
    }
    if let Some(ref p) = meta.producer {
        yaml.push_str(&format!("producer: \"{}\"\n", p));
    }
    yaml.push_str(&format!("pages: {}\n", meta.page_count));

    yaml.push_str("---\n\n");
    yaml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_matter_includes_known_fields_only() {
        let meta = DocumentMetadata {
            title: Some("Attention Is All You Need".into()),
            author: None,
            page_count: 15,
            ..Default::default()
        };
        let yaml = format_yaml_front_matter(&meta);
        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("title: \"Attention Is All You Need\"\n"));
        assert!(yaml.contains("pages: 15\n"));
        assert!(!yaml.contains("author"));
        assert!(yaml.ends_with("---\n\n"));
    }

    #[test]
    fn default_engine_is_layout_extractor() {
        let engine = resolve_engine(&ConversionConfig::default());
        assert!(engine.capabilities().relocates_images);
    }
}
