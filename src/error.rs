//! Error types for the markpdf library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`MarkPdfError`] — **Fatal**: the conversion cannot proceed at all
//!   (missing input, not a PDF, engine failure, unwritable output). Returned
//!   as `Err(MarkPdfError)` from the top-level `convert*` functions, and
//!   always before the output file has been created.
//!
//! * [`ConversionWarning`] — **Non-fatal**: the conversion completed but in a
//!   degraded form (a scanned page converted without OCR, an image reference
//!   that could not be resolved on disk). Collected in
//!   [`crate::output::ConversionOutput::warnings`] so callers can report them
//!   after the fact rather than losing an otherwise-useful document.
//!
//! The separation lets callers decide their own tolerance: treat any warning
//! as an error, log and continue, or ignore degraded output entirely.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the markpdf library.
///
/// Degraded-but-successful outcomes use [`ConversionWarning`] and are stored
/// in [`crate::output::ConversionOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum MarkPdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease the download timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The extraction engine failed on the document itself.
    #[error("Extraction failed for '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the requested image output directory.
    #[error("Failed to create image directory '{path}': {source}")]
    ImageDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
The extraction engine needs the pdfium shared library at runtime.\n\
  • Place libpdfium next to the executable, or\n\
  • Install it system-wide, or\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir containing libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal condition collected during an otherwise-successful conversion.
///
/// Reported in [`crate::output::ConversionOutput::warnings`] after completion;
/// the exit status stays zero.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ConversionWarning {
    /// Pages had no extractable text layer and no OCR engine was available.
    #[error(
        "No OCR engine found; {} scanned page(s) converted without text: {pages:?}\n\
Install Tesseract and run `markpdf check` to verify.",
        pages.len()
    )]
    OcrUnavailable { pages: Vec<usize> },

    /// An image reference could not be located on disk in either the
    /// requested image directory or the source PDF's directory.
    #[error("Image file for reference '{reference}' was not found; reference left unchanged")]
    ImageNotRecovered { reference: String },
}
