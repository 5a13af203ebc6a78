//! Path resolution: turn a user-supplied input (path or URL) plus optional
//! output/image paths into an absolute, validated [`ConversionRequest`].
//!
//! ## Why absolutise everything up front?
//!
//! The extraction engine, the image corrector, and the writer all assume
//! absolute paths: relative paths concatenated inside the engine end up
//! resolved against whatever its internal working directory happens to be.
//! Pinning every path to the caller's current directory here, once, removes
//! that whole class of bug.
//!
//! URL inputs are downloaded to a `TempDir` owned by the request, so the
//! file outlives every pipeline stage and is cleaned up automatically when
//! the request is dropped, even on panic. The `%PDF` magic bytes are
//! validated before returning so callers get a meaningful error rather than
//! an engine crash.

use crate::config::{ConversionConfig, ImageMode, OutputTarget};
use crate::error::MarkPdfError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A fully-resolved conversion request: every path absolute, the input
/// validated, the image directory created. Owned by one conversion call.
#[derive(Debug)]
pub struct ConversionRequest {
    /// Absolute path to the (possibly downloaded) PDF.
    pub pdf: PathBuf,
    /// The PDF's own directory, where a relocating engine writes assets.
    pub source_dir: PathBuf,
    /// Absolute output file path; `None` means standard output.
    pub output: Option<PathBuf>,
    /// How images are handled.
    pub image_mode: ImageMode,
    /// Absolute image directory, created and ready; `Some` exactly when
    /// `image_mode` is [`ImageMode::WriteFiles`].
    pub image_dir: Option<PathBuf>,
    /// Keeps a downloaded PDF alive until the conversion completes.
    _download: Option<TempDir>,
}

impl ConversionRequest {
    /// Directory the final Markdown lands in; `None` for stdout targets.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output.as_deref().and_then(Path::parent)
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve and validate the user's input against the configuration.
pub async fn resolve(
    input: &str,
    config: &ConversionConfig,
) -> Result<ConversionRequest, MarkPdfError> {
    if input.trim().is_empty() {
        return Err(MarkPdfError::InvalidInput {
            input: input.to_string(),
        });
    }

    let (pdf, download) = if is_url(input) {
        let (path, temp_dir) = download_url(input, config.download_timeout_secs).await?;
        (path, Some(temp_dir))
    } else {
        (resolve_local(input)?, None)
    };

    let source_dir = pdf
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    let output = match &config.output {
        OutputTarget::Stdout => None,
        OutputTarget::File(p) => Some(absolutize(p)?),
        OutputTarget::Auto => Some(default_output(&pdf, download.is_some())?),
    };

    let image_dir = match config.image_mode {
        ImageMode::WriteFiles => {
            let dir = match &config.image_dir {
                Some(d) => absolutize(d)?,
                None => match &output {
                    Some(md) => md.parent().unwrap_or(Path::new("/")).join("images"),
                    None => source_dir.join("images"),
                },
            };
            // create_dir_all is a no-op on an existing directory.
            std::fs::create_dir_all(&dir).map_err(|e| MarkPdfError::ImageDirFailed {
                path: dir.clone(),
                source: e,
            })?;
            Some(dir)
        }
        ImageMode::None | ImageMode::EmbedBase64 => None,
    };

    debug!(
        "resolved request: pdf={} output={:?} image_dir={:?}",
        pdf.display(),
        output,
        image_dir
    );

    Ok(ConversionRequest {
        pdf,
        source_dir,
        output,
        image_mode: config.image_mode,
        image_dir,
        _download: download,
    })
}

/// Default output path: the input's name with the `.md` extension. Downloaded
/// inputs live in a temp dir, so their default lands in the current directory
/// instead.
fn default_output(pdf: &Path, downloaded: bool) -> Result<PathBuf, MarkPdfError> {
    if downloaded {
        let name = pdf
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("downloaded.pdf"));
        Ok(absolutize(&name)?.with_extension("md"))
    } else {
        Ok(pdf.with_extension("md"))
    }
}

/// Pin a possibly-relative path to the current working directory.
fn absolutize(path: &Path) -> Result<PathBuf, MarkPdfError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().map_err(|e| {
            MarkPdfError::Internal(format!("cannot determine working directory: {e}"))
        })?;
        Ok(cwd.join(path))
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<PathBuf, MarkPdfError> {
    let path = absolutize(Path::new(path_str))?;

    if !path.exists() {
        return Err(MarkPdfError::FileNotFound { path });
    }

    // Check read permission by attempting to open.
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(MarkPdfError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MarkPdfError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(MarkPdfError::FileNotFound { path });
        }
    }

    debug!("resolved local PDF: {}", path.display());
    Ok(path)
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<(PathBuf, TempDir), MarkPdfError> {
    info!("downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| MarkPdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            MarkPdfError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            MarkPdfError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(MarkPdfError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| MarkPdfError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MarkPdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(MarkPdfError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| MarkPdfError::Internal(format!("failed to write temp file: {e}")))?;

    info!("downloaded to: {}", file_path.display());
    Ok((file_path, temp_dir))
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
