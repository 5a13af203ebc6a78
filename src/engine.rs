//! The extraction engine seam: trait, request/response types, and the
//! pdfium-backed default implementation.
//!
//! ## Why a trait?
//!
//! Layout analysis and OCR are owned by external engines with their own
//! release cadence and quirks. Putting them behind [`ExtractionEngine`] keeps
//! the rest of the pipeline independent of any one backend: tests inject a
//! scripted engine, and engine quirks are reported as data
//! ([`EngineCapabilities`]) instead of leaking into pipeline logic.
//!
//! ## The asset-location quirk
//!
//! The layout core writes page assets (extracted images) next to the document
//! it is reading, not into the caller's requested directory. The requested
//! directory is still passed through (the relocation is not preventable from
//! the caller side), and `capabilities().relocates_images` reports the
//! behaviour so the pipeline's correction pass can repair references and move
//! the files afterwards. When an engine honours the requested directory, the
//! flag is false and the correction pass stands down.

use crate::config::ImageMode;
use crate::error::MarkPdfError;
use crate::ocr::{OcrAvailability, OcrProbe, TesseractProbe};
use crate::output::DocumentMetadata;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, warn};

/// Static facts about an engine implementation that the pipeline needs to
/// plan around.
#[derive(Debug, Clone, Copy)]
pub struct EngineCapabilities {
    /// The engine writes emitted image files next to the source document
    /// instead of the requested image directory; the pipeline must relocate
    /// them after extraction.
    pub relocates_images: bool,
    /// The engine can OCR pages with no extractable text layer right now.
    pub ocr: bool,
}

/// Everything an engine needs for one extraction, with all paths absolute.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Absolute path to the PDF.
    pub pdf: PathBuf,
    /// Whether to capture images, and how they will be delivered.
    pub image_mode: ImageMode,
    /// Requested directory for emitted image files. Passed through even to
    /// engines that relocate assets (see [`EngineCapabilities`]).
    pub image_dir: Option<PathBuf>,
    /// OCR language codes (`-l eng+jpn`); empty means the engine default.
    pub ocr_languages: Vec<String>,
    /// Cap on either dimension when rasterising a page for OCR.
    pub max_rendered_pixels: u32,
}

/// What an engine hands back: the raw Markdown plus an account of every file
/// it touched and every page it could not fully convert.
#[derive(Debug, Default)]
pub struct EngineOutput {
    /// Raw Markdown text; image references may use absolute wrong-directory
    /// paths when the engine relocates assets.
    pub markdown: String,
    /// Paths of image files actually written, wherever they landed.
    pub emitted_images: Vec<PathBuf>,
    /// Document info dictionary (includes the page count).
    pub metadata: DocumentMetadata,
    /// Pages (1-indexed) whose text came from OCR.
    pub ocr_pages: Vec<usize>,
    /// Pages (1-indexed) that needed OCR while none was available or it
    /// failed; converted without text.
    pub ocr_missing: Vec<usize>,
}

/// A layout-aware PDF-to-Markdown extraction engine.
pub trait ExtractionEngine: Send + Sync {
    fn capabilities(&self) -> EngineCapabilities;

    /// Convert one document. Blocking; the pipeline calls this on a worker
    /// thread.
    fn extract(&self, request: &ExtractionRequest) -> Result<EngineOutput, MarkPdfError>;

    /// Read the document's metadata without converting content.
    ///
    /// The default implementation runs a full extraction and keeps only the
    /// metadata; engines with a cheaper path should override it.
    fn inspect(&self, request: &ExtractionRequest) -> Result<DocumentMetadata, MarkPdfError> {
        self.extract(request).map(|output| output.metadata)
    }
}

/// The default engine: pdfium text extraction with Tesseract OCR fallback
/// for pages that have no text layer.
pub struct LayoutExtractor {
    ocr: Arc<dyn OcrProbe>,
}

impl LayoutExtractor {
    pub fn new(ocr: Arc<dyn OcrProbe>) -> Self {
        Self { ocr }
    }

    /// Bind to a pdfium shared library: `PDFIUM_LIB_PATH`, then the
    /// executable's directory, then the system library path.
    fn bind_pdfium() -> Result<Pdfium, MarkPdfError> {
        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)),
            Err(_) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| MarkPdfError::PdfiumBindingFailed(format!("{e:?}")))?;
        Ok(Pdfium::new(bindings))
    }

    /// Rasterise one page and run Tesseract over it.
    ///
    /// Returns `None` when rendering or recognition fails; the page is then
    /// reported in [`EngineOutput::ocr_missing`] rather than aborting the
    /// document.
    fn ocr_page(
        &self,
        page: &PdfPage<'_>,
        page_num: usize,
        request: &ExtractionRequest,
        availability: &OcrAvailability,
        scratch: &Path,
    ) -> Option<String> {
        let render_config = PdfRenderConfig::new()
            .set_target_width(request.max_rendered_pixels as i32)
            .set_maximum_height(request.max_rendered_pixels as i32);

        let bitmap = match page.render_with_config(&render_config) {
            Ok(b) => b,
            Err(e) => {
                warn!("page {}: rasterisation for OCR failed: {:?}", page_num, e);
                return None;
            }
        };
        let png = scratch.join(format!("page-{page_num}.png"));
        if let Err(e) = bitmap.as_image().save_with_format(&png, ImageFormat::Png) {
            warn!("page {}: could not write OCR scratch image: {}", page_num, e);
            return None;
        }

        let executable = availability.executable.as_ref()?;
        let mut cmd = Command::new(executable);
        cmd.arg(&png).arg("stdout");
        if !request.ocr_languages.is_empty() {
            cmd.arg("-l").arg(request.ocr_languages.join("+"));
        }
        if let Some(tessdata) = &availability.tessdata {
            if std::env::var_os("TESSDATA_PREFIX").is_none() {
                cmd.env("TESSDATA_PREFIX", tessdata);
            }
        }

        let output = match cmd.output() {
            Ok(o) => o,
            Err(e) => {
                warn!("page {}: failed to spawn tesseract: {}", page_num, e);
                return None;
            }
        };
        if !output.status.success() {
            warn!(
                "page {}: tesseract exited with {}: {}",
                page_num,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        debug!("page {}: OCR produced {} bytes", page_num, output.stdout.len());
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for LayoutExtractor {
    fn default() -> Self {
        Self::new(Arc::new(TesseractProbe))
    }
}

impl ExtractionEngine for LayoutExtractor {
    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            relocates_images: true,
            ocr: self.ocr.probe().is_available(),
        }
    }

    fn extract(&self, request: &ExtractionRequest) -> Result<EngineOutput, MarkPdfError> {
        let pdfium = Self::bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(&request.pdf, None)
            .map_err(|e| MarkPdfError::CorruptPdf {
                path: request.pdf.clone(),
                detail: format!("{e:?}"),
            })?;

        let availability = self.ocr.probe();
        let scratch = if availability.is_available() {
            Some(tempfile::tempdir().map_err(|e| MarkPdfError::Internal(e.to_string()))?)
        } else {
            None
        };

        let stem = request
            .pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        let source_dir = request
            .pdf
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let capture_images = request.image_mode != ImageMode::None;

        let mut out = EngineOutput {
            metadata: read_metadata(&document),
            ..Default::default()
        };
        let mut sections: Vec<String> = Vec::new();

        for (index, page) in document.pages().iter().enumerate() {
            let page_num = index + 1;
            let mut text = page.text().map(|t| t.all()).unwrap_or_default();

            let mut image_refs: Vec<String> = Vec::new();
            if capture_images {
                let mut image_index = 0usize;
                for object in page.objects().iter() {
                    let Some(image_object) = object.as_image_object() else {
                        continue;
                    };
                    let raw = match image_object.get_raw_image() {
                        Ok(img) => img,
                        Err(e) => {
                            debug!("page {}: unreadable image object: {:?}", page_num, e);
                            continue;
                        }
                    };
                    image_index += 1;
                    // Names are namespaced by the document stem so batch
                    // conversions sharing a directory never contend.
                    let name = format!("{stem}-p{page_num}-i{image_index}.png");
                    let dest = source_dir.join(&name);
                    if let Err(e) = raw.save_with_format(&dest, ImageFormat::Png) {
                        warn!("page {}: could not save image {}: {}", page_num, name, e);
                        continue;
                    }
                    image_refs.push(format!("![]({})", dest.display()));
                    out.emitted_images.push(dest);
                }
            }

            if text.trim().is_empty() {
                // No text layer: a scanned page.
                let recognised = scratch.as_ref().and_then(|dir| {
                    self.ocr_page(&page, page_num, request, &availability, dir.path())
                });
                match recognised {
                    Some(t) => {
                        text = t;
                        out.ocr_pages.push(page_num);
                    }
                    None => out.ocr_missing.push(page_num),
                }
            }

            let mut section = text.trim_end().to_string();
            if !image_refs.is_empty() {
                if !section.trim().is_empty() {
                    section.push_str("\n\n");
                } else {
                    section.clear();
                }
                section.push_str(&image_refs.join("\n\n"));
            }
            if !section.trim().is_empty() {
                sections.push(section);
            }
        }

        out.markdown = sections.join("\n\n");
        debug!(
            "extracted {} pages ({} via OCR, {} images) from {}",
            out.metadata.page_count,
            out.ocr_pages.len(),
            out.emitted_images.len(),
            request.pdf.display()
        );
        Ok(out)
    }

    fn inspect(&self, request: &ExtractionRequest) -> Result<DocumentMetadata, MarkPdfError> {
        let pdfium = Self::bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(&request.pdf, None)
            .map_err(|e| MarkPdfError::CorruptPdf {
                path: request.pdf.clone(),
                detail: format!("{e:?}"),
            })?;
        Ok(read_metadata(&document))
    }
}

/// Read the document's info dictionary.
fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get(PdfDocumentMetadataTagType::Title),
        author: get(PdfDocumentMetadataTagType::Author),
        subject: get(PdfDocumentMetadataTagType::Subject),
        creator: get(PdfDocumentMetadataTagType::Creator),
        producer: get(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
    }
}
