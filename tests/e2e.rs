//! End-to-end tests against the real pdfium-backed engine.
//!
//! These need the pdfium shared library and a sample PDF in `./test_cases/`,
//! so they are gated behind the `MARKPDF_E2E` environment variable and skip
//! themselves cleanly in CI.
//!
//! Run with:
//!   MARKPDF_E2E=1 cargo test --test e2e -- --nocapture

use markpdf::{convert, inspect, ConversionConfig, ImageMode};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if MARKPDF_E2E is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("MARKPDF_E2E").is_err() {
            println!("SKIP — set MARKPDF_E2E=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

#[tokio::test]
async fn inspect_reports_page_count() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let meta = inspect(path.to_str().unwrap())
        .await
        .expect("inspect() should succeed");
    assert!(meta.page_count > 0);
    println!("metadata: {meta:?}");
}

#[tokio::test]
async fn convert_text_only() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let out = tempfile::tempdir().unwrap();

    let config = ConversionConfig::builder()
        .output_file(out.path().join("sample.md"))
        .build()
        .unwrap();
    let output = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");

    assert!(!output.markdown.trim().is_empty());
    assert!(output.markdown.ends_with('\n'));
    assert!(out.path().join("sample.md").exists());
    println!(
        "converted {} pages ({} via OCR) in {}ms",
        output.stats.page_count, output.stats.ocr_pages, output.stats.total_duration_ms
    );
}

#[tokio::test]
async fn convert_with_image_extraction() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let out = tempfile::tempdir().unwrap();

    let config = ConversionConfig::builder()
        .output_file(out.path().join("sample.md"))
        .image_mode(ImageMode::WriteFiles)
        .build()
        .unwrap();
    let output = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");

    // Whatever the engine emitted must have ended up under images/, never
    // beside the source PDF.
    let source_dir = path.parent().unwrap();
    let strays = std::fs::read_dir(source_dir)
        .unwrap()
        .flatten()
        .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
        .count();
    assert_eq!(strays, 0, "no images may remain beside the source PDF");
    for image in &output.images {
        assert!(image.starts_with(out.path().join("images")));
        assert!(image.exists());
    }
}
