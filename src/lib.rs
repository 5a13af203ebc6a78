//! # markpdf
//!
//! Convert PDF documents to Markdown suitable for LLM consumption.
//!
//! ## Why this crate?
//!
//! Raw text-stream PDF dumps are unusable downstream: reading order breaks on
//! multi-column layouts, scanned pages come out empty, and extracted images
//! end up referenced by absolute paths into the wrong directory. This crate
//! drives a layout-aware extraction engine, falls back to Tesseract OCR for
//! pages with no text layer, and repairs the engine's asset handling so the
//! output is a self-contained Markdown tree you can move around as a unit.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Resolve    validate input, absolutise output/image paths
//!  ├─ 2. Extract    layout-aware engine + automatic OCR fallback
//!  ├─ 3. Normalize  deterministic text cleanup (line endings, whitespace)
//!  ├─ 4. Correct    rewrite image references, relocate or embed the files
//!  └─ 5. Write      atomic file write, or raw UTF-8 to stdout
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markpdf::{convert, ConversionConfig, ImageMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .image_mode(ImageMode::WriteFiles)
//!         .build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     eprintln!("wrote {:?} ({} pages)", output.output_path, output.stats.page_count);
//!     for warning in &output.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! markpdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## OCR
//!
//! Scanned pages are recognised automatically when a Tesseract installation
//! is discoverable (`markpdf check` shows what the probe finds). Without one,
//! conversion still succeeds and the affected pages are reported as a
//! warning.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ImageMode, OutputTarget};
pub use convert::{convert, convert_many, convert_sync, inspect};
pub use engine::{EngineCapabilities, EngineOutput, ExtractionEngine, ExtractionRequest, LayoutExtractor};
pub use error::{ConversionWarning, MarkPdfError};
pub use ocr::{OcrAvailability, OcrProbe, StaticOcrProbe, TesseractProbe};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata};
