//! Output writing: the final Markdown goes to its target in one shot.
//!
//! The writer only runs once the complete document string is assembled, so a
//! failure in any earlier stage can never produce a truncated file. File
//! targets are written to a temporary sibling and renamed into place, which
//! also covers a failure *during* the write itself. Stdout targets write the
//! UTF-8 bytes to the locked handle directly: no file is created, and no
//! platform text-mode re-encoding gets a chance to mangle the output.

use crate::error::MarkPdfError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write the finished document to its target.
///
/// Returns the path written, or `None` for stdout targets.
pub async fn write_output(
    target: Option<&Path>,
    markdown: &str,
) -> Result<Option<PathBuf>, MarkPdfError> {
    match target {
        Some(path) => write_file(path, markdown).await.map(Some),
        None => write_stdout(markdown).map(|()| None),
    }
}

/// Atomic file write: temp sibling, then rename.
async fn write_file(path: &Path, markdown: &str) -> Result<PathBuf, MarkPdfError> {
    let fail = |source: std::io::Error| MarkPdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;

    debug!("wrote {} bytes to {}", markdown.len(), path.display());
    Ok(path.to_path_buf())
}

/// Write UTF-8 bytes to the locked stdout handle.
fn write_stdout(markdown: &str) -> Result<(), MarkPdfError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(markdown.as_bytes())
        .and_then(|()| handle.flush())
        .map_err(|e| MarkPdfError::OutputWriteFailed {
            path: PathBuf::from("<stdout>"),
            source: e,
        })
}
