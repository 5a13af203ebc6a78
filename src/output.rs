//! Output types: the conversion result, document metadata, and run statistics.

use crate::error::ConversionWarning;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The result of a successful conversion.
///
/// A conversion that produced warnings is still a success; inspect
/// [`warnings`](Self::warnings) to decide whether degraded output is
/// acceptable.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The final Markdown document, exactly as written to the output target.
    pub markdown: String,
    /// Path of the written Markdown file; `None` for stdout targets.
    pub output_path: Option<PathBuf>,
    /// Final locations of extracted image files (empty unless
    /// [`crate::ImageMode::WriteFiles`] was used).
    pub images: Vec<PathBuf>,
    /// Non-fatal conditions collected along the way, in occurrence order.
    pub warnings: Vec<ConversionWarning>,
    /// Document metadata read from the PDF's info dictionary.
    pub metadata: DocumentMetadata,
    /// Page/image/timing statistics for the run.
    pub stats: ConversionStats,
}

/// Metadata extracted from the PDF document's info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
}

/// Statistics about a conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Total pages in the document.
    pub page_count: usize,
    /// Pages whose text came from OCR rather than the text layer.
    pub ocr_pages: usize,
    /// Image files emitted by the extraction engine.
    pub images_emitted: usize,
    /// Image files moved out of the source directory by the corrector.
    pub images_relocated: usize,
    /// Images inlined as base64 data URIs.
    pub images_embedded: usize,
    /// Wall-clock time spent inside the extraction engine.
    pub extract_duration_ms: u64,
    /// Wall-clock time for the whole conversion.
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize_to_json() {
        let stats = ConversionStats {
            page_count: 12,
            ocr_pages: 2,
            images_emitted: 3,
            images_relocated: 3,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"page_count\":12"));
        assert!(json.contains("\"images_relocated\":3"));
    }
}
