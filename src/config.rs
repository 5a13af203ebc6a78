//! Configuration types for PDF-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across conversions, log them, and diff two runs
//! to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A many-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::engine::ExtractionEngine;
use crate::error::MarkPdfError;
use crate::ocr::OcrProbe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// How extracted images are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageMode {
    /// Text only; no image capture. (default)
    #[default]
    None,
    /// Write image files to the image directory and reference them with
    /// relative paths.
    WriteFiles,
    /// Inline each image as a `data:<mime>;base64,…` URI; no files remain
    /// on disk after conversion.
    EmbedBase64,
}

/// Where the final Markdown goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Derive the path from the input: `{input stem}.md` in the input's
    /// directory (current directory for URL inputs). (default)
    #[default]
    Auto,
    /// Write to this file (created/overwritten atomically).
    File(PathBuf),
    /// Write the UTF-8 bytes to standard output; no file is created.
    Stdout,
}

/// Configuration for a PDF-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use markpdf::{ConversionConfig, ImageMode};
///
/// let config = ConversionConfig::builder()
///     .image_mode(ImageMode::WriteFiles)
///     .ocr_languages(["eng", "deu"])
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Where the final Markdown goes. Default: [`OutputTarget::Auto`].
    pub output: OutputTarget,

    /// How extracted images are handled. Default: [`ImageMode::None`].
    pub image_mode: ImageMode,

    /// Directory for extracted image files (created on demand). Only
    /// meaningful with [`ImageMode::WriteFiles`]; when `None`, a sibling
    /// `images/` directory next to the output Markdown file is used.
    pub image_dir: Option<PathBuf>,

    /// Prepend YAML front-matter with the document's info dictionary
    /// (title, author, page count, …). Default: false.
    pub include_metadata: bool,

    /// Tesseract language codes for OCR fallback, e.g. `["eng", "jpn"]`.
    /// Empty means the engine's default language. Default: empty.
    pub ocr_languages: Vec<String>,

    /// Maximum rendered page dimension (width or height) in pixels when a
    /// scanned page is rasterised for OCR. Default: 2480 (A4 at 300 DPI).
    ///
    /// OCR accuracy improves with resolution up to roughly 300 DPI and then
    /// plateaus, while render time and memory keep growing. The cap bounds
    /// both regardless of physical page size.
    pub max_rendered_pixels: u32,

    /// Pre-constructed extraction engine. When `None`, the pdfium-backed
    /// [`crate::engine::LayoutExtractor`] is used. Inject a custom engine for
    /// testing or to swap the extraction backend.
    pub engine: Option<Arc<dyn ExtractionEngine>>,

    /// OCR capability probe consulted by the default engine. When `None`,
    /// [`crate::ocr::TesseractProbe`] is used. Inject a static probe in tests
    /// to simulate present/absent OCR without touching the host system.
    pub ocr: Option<Arc<dyn OcrProbe>>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output: OutputTarget::Auto,
            image_mode: ImageMode::None,
            image_dir: None,
            include_metadata: false,
            ocr_languages: Vec::new(),
            max_rendered_pixels: 2480,
            engine: None,
            ocr: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("output", &self.output)
            .field("image_mode", &self.image_mode)
            .field("image_dir", &self.image_dir)
            .field("include_metadata", &self.include_metadata)
            .field("ocr_languages", &self.ocr_languages)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn ExtractionEngine>"))
            .field("ocr", &self.ocr.as_ref().map(|_| "<dyn OcrProbe>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn output(mut self, target: OutputTarget) -> Self {
        self.config.output = target;
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = OutputTarget::File(path.into());
        self
    }

    pub fn image_mode(mut self, mode: ImageMode) -> Self {
        self.config.image_mode = mode;
        self
    }

    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_dir = Some(dir.into());
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn ocr_languages<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ocr_languages = langs.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn ExtractionEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn ocr_probe(mut self, probe: Arc<dyn OcrProbe>) -> Self {
        self.config.ocr = Some(probe);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, MarkPdfError> {
        let c = &self.config;
        if c.image_dir.is_some() && c.image_mode != ImageMode::WriteFiles {
            return Err(MarkPdfError::InvalidConfig(
                "image_dir only applies when image_mode is WriteFiles".into(),
            ));
        }
        if c.max_rendered_pixels < 100 {
            return Err(MarkPdfError::InvalidConfig(format!(
                "max_rendered_pixels must be ≥ 100, got {}",
                c.max_rendered_pixels
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_text_only_auto_output() {
        let c = ConversionConfig::default();
        assert_eq!(c.image_mode, ImageMode::None);
        assert_eq!(c.output, OutputTarget::Auto);
        assert!(c.image_dir.is_none());
        assert!(c.ocr_languages.is_empty());
    }

    #[test]
    fn builder_rejects_image_dir_without_write_mode() {
        let err = ConversionConfig::builder()
            .image_mode(ImageMode::EmbedBase64)
            .image_dir("/tmp/images")
            .build()
            .unwrap_err();
        assert!(matches!(err, MarkPdfError::InvalidConfig(_)));
    }

    #[test]
    fn builder_accepts_image_dir_with_write_mode() {
        let c = ConversionConfig::builder()
            .image_mode(ImageMode::WriteFiles)
            .image_dir("/tmp/images")
            .build()
            .unwrap();
        assert_eq!(c.image_dir.as_deref(), Some(std::path::Path::new("/tmp/images")));
    }

    #[test]
    fn ocr_languages_collects_any_string_iter() {
        let c = ConversionConfig::builder()
            .ocr_languages(vec!["eng".to_string(), "fra".to_string()])
            .build()
            .unwrap();
        assert_eq!(c.ocr_languages, vec!["eng", "fra"]);
    }
}
