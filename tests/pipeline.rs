//! End-to-end pipeline tests driven by a scripted extraction engine.
//!
//! The real engine needs the pdfium shared library at runtime, so these
//! tests inject an [`ExtractionEngine`] that behaves like a relocating
//! layout engine (fixed Markdown, image files written beside the source
//! document, absolute references) and assert on what the pipeline makes of
//! it. Tests against the real engine live in `e2e.rs`.

use markpdf::{
    convert, convert_many, ConversionConfig, ConversionWarning, EngineCapabilities, EngineOutput,
    ExtractionEngine, ExtractionRequest, ImageMode, MarkPdfError, OutputTarget,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PNG_STUB: &[u8] = b"\x89PNG\r\n\x1a\n-not-a-real-image-";

/// An engine with scripted behaviour: N pages, M images per page, optionally
/// all pages scanned (no text layer), optionally honouring the requested
/// image directory instead of relocating.
#[derive(Clone, Copy)]
struct ScriptedEngine {
    pages: usize,
    images_per_page: usize,
    scanned: bool,
    relocates: bool,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self {
            pages: 2,
            images_per_page: 0,
            scanned: false,
            relocates: true,
        }
    }
}

impl ExtractionEngine for ScriptedEngine {
    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            relocates_images: self.relocates,
            ocr: false,
        }
    }

    fn extract(&self, request: &ExtractionRequest) -> Result<EngineOutput, MarkPdfError> {
        let source_dir = request.pdf.parent().unwrap().to_path_buf();
        let stem = request
            .pdf
            .file_stem()
            .unwrap()
            .to_string_lossy()
            .into_owned();

        let mut out = EngineOutput::default();
        out.metadata.page_count = self.pages;
        out.metadata.title = Some(format!("Scripted {stem}"));

        let mut sections = Vec::new();
        for page in 1..=self.pages {
            if self.scanned {
                out.ocr_missing.push(page);
                continue;
            }
            let mut section = format!("# Page {page}\n\nBody text for page {page}.");
            if request.image_mode != ImageMode::None {
                for i in 1..=self.images_per_page {
                    let name = format!("{stem}-p{page}-i{i}.png");
                    let dest = if self.relocates {
                        source_dir.join(&name)
                    } else {
                        request
                            .image_dir
                            .clone()
                            .unwrap_or_else(|| source_dir.clone())
                            .join(&name)
                    };
                    std::fs::write(&dest, PNG_STUB).unwrap();
                    section.push_str(&format!("\n\n![]({})", dest.display()));
                    out.emitted_images.push(dest);
                }
            }
            sections.push(section);
        }
        out.markdown = sections.join("\n\n");
        Ok(out)
    }
}

/// An engine that always fails on the document.
struct FailingEngine;

impl ExtractionEngine for FailingEngine {
    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            relocates_images: true,
            ocr: false,
        }
    }

    fn extract(&self, request: &ExtractionRequest) -> Result<EngineOutput, MarkPdfError> {
        Err(MarkPdfError::ExtractionFailed {
            path: request.pdf.clone(),
            detail: "scripted failure".into(),
        })
    }
}

fn stub_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.7\n%stub document\n").unwrap();
    path
}

fn config(engine: ScriptedEngine) -> markpdf::ConversionConfigBuilder {
    ConversionConfig::builder().engine(Arc::new(engine))
}

fn count_pngs(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
        .count()
}

// ── Basic conversion ─────────────────────────────────────────────────────────

#[tokio::test]
async fn default_output_lands_beside_input() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "doc.pdf");

    let cfg = config(ScriptedEngine::default()).build().unwrap();
    let output = convert(pdf.to_str().unwrap(), &cfg).await.unwrap();

    let expected = dir.path().join("doc.md");
    assert_eq!(output.output_path, Some(expected.clone()));
    let written = std::fs::read_to_string(&expected).unwrap();
    assert_eq!(written, output.markdown);
    assert!(written.contains("# Page 1"));
    assert!(written.ends_with('\n'));
    assert_eq!(output.stats.page_count, 2);
}

#[tokio::test]
async fn no_image_documents_convert_identically_in_both_modes() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "doc.pdf");

    let plain = config(ScriptedEngine::default())
        .output_file(out.path().join("plain.md"))
        .build()
        .unwrap();
    let with_images = config(ScriptedEngine::default())
        .output_file(out.path().join("with-images.md"))
        .image_mode(ImageMode::WriteFiles)
        .build()
        .unwrap();

    let a = convert(pdf.to_str().unwrap(), &plain).await.unwrap();
    let b = convert(pdf.to_str().unwrap(), &with_images).await.unwrap();

    assert_eq!(a.markdown, b.markdown, "no spurious image references");
    assert!(b.images.is_empty());
}

// ── Image relocation repair ──────────────────────────────────────────────────

#[tokio::test]
async fn relocated_images_are_recovered_into_the_requested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "paper.pdf");

    let engine = ScriptedEngine {
        images_per_page: 1,
        ..Default::default()
    };
    let cfg = config(engine)
        .output_file(out.path().join("paper.md"))
        .image_mode(ImageMode::WriteFiles)
        .build()
        .unwrap();

    let output = convert(pdf.to_str().unwrap(), &cfg).await.unwrap();

    assert!(
        output.markdown.contains("![](images/paper-p1-i1.png)"),
        "got: {}",
        output.markdown
    );
    assert!(out.path().join("images/paper-p1-i1.png").exists());
    assert!(out.path().join("images/paper-p2-i1.png").exists());
    assert_eq!(count_pngs(dir.path()), 0, "no strays beside the source PDF");
    assert_eq!(output.stats.images_relocated, 2);
    assert_eq!(output.images.len(), 2);
    assert!(output.warnings.is_empty());

    // Every reference must resolve relative to the Markdown file.
    for line in output.markdown.lines().filter(|l| l.starts_with("![](")) {
        let target = line.trim_start_matches("![](").trim_end_matches(')');
        assert!(
            out.path().join(target).exists(),
            "unresolvable reference: {target}"
        );
    }
}

#[tokio::test]
async fn honest_engine_needs_no_relocation() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "paper.pdf");

    let engine = ScriptedEngine {
        images_per_page: 1,
        relocates: false,
        ..Default::default()
    };
    let cfg = config(engine)
        .output_file(out.path().join("paper.md"))
        .image_mode(ImageMode::WriteFiles)
        .build()
        .unwrap();

    let output = convert(pdf.to_str().unwrap(), &cfg).await.unwrap();

    assert_eq!(output.stats.images_relocated, 0);
    assert!(output.markdown.contains("![](images/paper-p1-i1.png)"));
    assert!(out.path().join("images/paper-p1-i1.png").exists());
    assert!(output.warnings.is_empty());
}

// ── Embed mode ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn embed_mode_leaves_no_file_references_or_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "deck.pdf");

    let engine = ScriptedEngine {
        pages: 1,
        images_per_page: 2,
        ..Default::default()
    };
    let cfg = config(engine)
        .output_file(out.path().join("deck.md"))
        .image_mode(ImageMode::EmbedBase64)
        .build()
        .unwrap();

    let output = convert(pdf.to_str().unwrap(), &cfg).await.unwrap();

    assert_eq!(output.stats.images_embedded, 2);
    assert!(output.markdown.contains("data:image/png;base64,"));
    assert!(
        !output.markdown.contains(".png)"),
        "no filesystem references may remain: {}",
        output.markdown
    );
    assert_eq!(count_pngs(dir.path()), 0, "transient files must be deleted");
    assert!(output.images.is_empty());
}

// ── OCR degradation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn scanned_document_without_ocr_succeeds_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "scan.pdf");

    let engine = ScriptedEngine {
        scanned: true,
        ..Default::default()
    };
    let cfg = config(engine).build().unwrap();

    let output = convert(pdf.to_str().unwrap(), &cfg).await.unwrap();

    assert_eq!(output.warnings.len(), 1);
    assert!(matches!(
        &output.warnings[0],
        ConversionWarning::OcrUnavailable { pages } if pages == &vec![1, 2]
    ));
    assert!(output.output_path.unwrap().exists(), "degraded output is still written");
}

// ── Fatal errors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn fatal_extraction_error_leaves_no_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "doc.pdf");

    let cfg = ConversionConfig::builder()
        .engine(Arc::new(FailingEngine))
        .build()
        .unwrap();

    let err = convert(pdf.to_str().unwrap(), &cfg).await.unwrap_err();
    assert!(matches!(err, MarkPdfError::ExtractionFailed { .. }));
    assert!(
        !dir.path().join("doc.md").exists(),
        "fatal errors must not produce partial artifacts"
    );
}

#[tokio::test]
async fn missing_input_fails_before_touching_the_engine() {
    let cfg = ConversionConfig::builder()
        .engine(Arc::new(FailingEngine))
        .build()
        .unwrap();
    let err = convert("/no/such/file.pdf", &cfg).await.unwrap_err();
    assert!(matches!(err, MarkPdfError::FileNotFound { .. }));
}

// ── Metadata front-matter ────────────────────────────────────────────────────

#[tokio::test]
async fn metadata_front_matter_is_prepended_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = stub_pdf(dir.path(), "doc.pdf");

    let cfg = config(ScriptedEngine::default())
        .include_metadata(true)
        .build()
        .unwrap();
    let output = convert(pdf.to_str().unwrap(), &cfg).await.unwrap();

    assert!(output.markdown.starts_with("---\n"));
    assert!(output.markdown.contains("title: \"Scripted doc\""));
    assert!(output.markdown.contains("pages: 2"));
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_conversions_share_a_source_directory_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let first = stub_pdf(dir.path(), "alpha.pdf");
    let second = stub_pdf(dir.path(), "beta.pdf");

    let engine = ScriptedEngine {
        images_per_page: 1,
        ..Default::default()
    };
    let cfg = config(engine)
        .output(OutputTarget::Auto)
        .image_mode(ImageMode::WriteFiles)
        .image_dir(out.path().join("images"))
        .build()
        .unwrap();

    let inputs = vec![
        first.to_str().unwrap().to_string(),
        second.to_str().unwrap().to_string(),
    ];
    let results = convert_many(&inputs, &cfg, 2).await;

    for result in &results {
        let output = result.as_ref().unwrap();
        assert!(output.warnings.is_empty());
        assert_eq!(output.images.len(), 2);
    }
    // Stem-namespaced filenames: both documents' images coexist, no strays.
    assert!(out.path().join("images/alpha-p1-i1.png").exists());
    assert!(out.path().join("images/beta-p1-i1.png").exists());
    assert_eq!(count_pngs(dir.path()), 0);
    assert_eq!(count_pngs(&out.path().join("images")), 4);
}
