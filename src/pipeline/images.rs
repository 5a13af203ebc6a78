//! Image reference correction: make the Markdown's image references valid
//! regardless of where the extraction engine actually wrote the files.
//!
//! ## Why is this pass necessary?
//!
//! A relocating engine ([`EngineCapabilities::relocates_images`]) writes
//! extracted images next to the source PDF instead of the requested image
//! directory, and the references it emits are absolute paths into that wrong
//! location. Left alone, the output Markdown would link to files that sit in
//! the reader's source tree, or nowhere at all once the source moves. This
//! pass restores the contract the caller asked for:
//!
//! * a reference whose file already sits in the requested directory is left
//!   alone (only its textual form is canonicalised, a no-op on correct
//!   output);
//! * a reference whose file is stranded beside the source PDF is rewritten
//!   to a path relative to the output Markdown file, and the file itself is
//!   moved into the requested directory;
//! * in embed mode every local reference is replaced by a
//!   `data:<mime>;base64,…` URI and the transient files are deleted;
//! * a reference found in neither location is left unchanged and reported
//!   as a [`ConversionWarning::ImageNotRecovered`].
//!
//! Re-running the pass over its own output is a no-op: no file moves, and
//! byte-identical Markdown. Concurrent conversions sharing a source
//! directory are safe because every move treats "destination already
//! exists" as success rather than failure.

use crate::config::ImageMode;
use crate::engine::EngineCapabilities;
use crate::error::ConversionWarning;
use crate::pipeline::resolve::ConversionRequest;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// What the correction pass did.
#[derive(Debug, Default)]
pub struct CorrectionOutcome {
    /// Markdown with corrected references.
    pub markdown: String,
    /// Final on-disk image locations (write mode only).
    pub images: Vec<PathBuf>,
    /// Files moved out of the source directory by this pass.
    pub relocated: usize,
    /// References inlined as data URIs (embed mode only).
    pub embedded: usize,
    /// Non-fatal conditions raised while correcting.
    pub warnings: Vec<ConversionWarning>,
}

impl CorrectionOutcome {
    fn passthrough(markdown: &str) -> Self {
        Self {
            markdown: markdown.to_string(),
            ..Default::default()
        }
    }
}

/// Correct every image reference in `markdown` according to the request's
/// image mode.
pub fn correct_image_references(
    markdown: &str,
    request: &ConversionRequest,
    emitted_images: &[PathBuf],
    capabilities: &EngineCapabilities,
) -> CorrectionOutcome {
    match (request.image_mode, &request.image_dir) {
        (ImageMode::None, _) => CorrectionOutcome::passthrough(markdown),
        (ImageMode::WriteFiles, Some(image_dir)) => rewrite_to_directory(
            markdown,
            request,
            image_dir,
            emitted_images,
            capabilities.relocates_images,
        ),
        // The resolver always supplies an image directory in write mode.
        (ImageMode::WriteFiles, None) => CorrectionOutcome::passthrough(markdown),
        (ImageMode::EmbedBase64, _) => embed_images(markdown, request, emitted_images),
    }
}

/// References that are not filesystem paths are never touched.
fn is_external(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://") || target.starts_with("data:")
}

// ── Write-files mode ─────────────────────────────────────────────────────────

fn rewrite_to_directory(
    markdown: &str,
    request: &ConversionRequest,
    image_dir: &Path,
    emitted_images: &[PathBuf],
    relocates: bool,
) -> CorrectionOutcome {
    let base = request.output_dir();
    let mut relocated = 0usize;
    let mut warnings: Vec<ConversionWarning> = Vec::new();
    let mut images: BTreeSet<PathBuf> = BTreeSet::new();

    let rewritten = RE_IMAGE
        .replace_all(markdown, |caps: &regex::Captures<'_>| {
            let alt = &caps[1];
            let target = caps[2].trim();
            if is_external(target) {
                return caps[0].to_string();
            }
            let Some(name) = Path::new(target).file_name().map(ToOwned::to_owned) else {
                return caps[0].to_string();
            };
            let wanted = image_dir.join(&name);

            let present = if wanted.exists() {
                true
            } else if relocates {
                recover_stray(&request.source_dir.join(&name), &wanted, &mut relocated)
            } else {
                false
            };

            if present {
                images.insert(wanted.clone());
                format!("![{alt}]({})", reference_for(base, &wanted))
            } else {
                warnings.push(ConversionWarning::ImageNotRecovered {
                    reference: target.to_string(),
                });
                caps[0].to_string()
            }
        })
        .into_owned();

    // Emitted files the Markdown never referenced are still this
    // conversion's artifacts; sweep them out of the source directory too.
    if relocates {
        for path in emitted_images {
            if path.parent() == Some(request.source_dir.as_path()) && path.exists() {
                if let Some(name) = path.file_name() {
                    let wanted = image_dir.join(name);
                    if recover_stray(path, &wanted, &mut relocated) {
                        images.insert(wanted);
                    }
                }
            }
        }
    }

    debug!(
        "image correction: {} reference(s) resolved, {} file(s) relocated, {} warning(s)",
        images.len(),
        relocated,
        warnings.len()
    );

    CorrectionOutcome {
        markdown: rewritten,
        images: images.into_iter().collect(),
        relocated,
        embedded: 0,
        warnings,
    }
}

/// Try to bring a stray file to its wanted location. Returns whether the
/// wanted file exists afterwards.
fn recover_stray(stray: &Path, wanted: &Path, relocated: &mut usize) -> bool {
    if !stray.exists() {
        return wanted.exists();
    }
    match relocate(stray, wanted) {
        Ok(moved) => {
            if moved {
                *relocated += 1;
            }
            true
        }
        Err(e) => {
            if wanted.exists() {
                // A concurrent conversion won the move.
                true
            } else {
                warn!("could not relocate '{}': {}", stray.display(), e);
                false
            }
        }
    }
}

/// Move `src` to `dst` with move-if-exists semantics.
///
/// Returns `Ok(true)` when this call performed the move and `Ok(false)` when
/// an identical file was already at the destination. "Already moved" must
/// count as success for concurrent conversions sharing a source directory.
fn relocate(src: &Path, dst: &Path) -> std::io::Result<bool> {
    if dst.exists() {
        let _ = std::fs::remove_file(src);
        return Ok(false);
    }
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(true),
        Err(_) if dst.exists() => Ok(false),
        Err(rename_err) => {
            // rename cannot cross filesystems; fall back to copy + remove.
            if src.exists() {
                std::fs::copy(src, dst)?;
                let _ = std::fs::remove_file(src);
                Ok(true)
            } else {
                Err(rename_err)
            }
        }
    }
}

/// Render the reference text for a corrected image.
///
/// File targets get a path relative to the Markdown file's directory so the
/// output tree can be moved around as a unit; stdout targets have no base
/// directory, so the absolute path is the only one guaranteed to resolve.
fn reference_for(base: Option<&Path>, wanted: &Path) -> String {
    match base {
        Some(base) => markdown_path(&relative_from(base, wanted)),
        None => wanted.display().to_string(),
    }
}

/// Compute `target` relative to the directory `base`. Both must be absolute.
fn relative_from(base: &Path, target: &Path) -> PathBuf {
    let base_components: Vec<Component<'_>> = base.components().collect();
    let target_components: Vec<Component<'_>> = target.components().collect();
    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_components.len() {
        rel.push("..");
    }
    for component in &target_components[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

/// Join path components with forward slashes, the only separator Markdown
/// renderers agree on.
fn markdown_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ── Embed mode ───────────────────────────────────────────────────────────────

fn embed_images(
    markdown: &str,
    request: &ConversionRequest,
    emitted_images: &[PathBuf],
) -> CorrectionOutcome {
    let mut embedded = 0usize;
    let mut warnings: Vec<ConversionWarning> = Vec::new();
    let mut consumed: BTreeSet<PathBuf> = BTreeSet::new();

    let rewritten = RE_IMAGE
        .replace_all(markdown, |caps: &regex::Captures<'_>| {
            let alt = &caps[1];
            let target = caps[2].trim();
            if is_external(target) {
                return caps[0].to_string();
            }
            let Some(found) = locate_for_embedding(target, request) else {
                warnings.push(ConversionWarning::ImageNotRecovered {
                    reference: target.to_string(),
                });
                return caps[0].to_string();
            };
            match std::fs::read(&found) {
                Ok(bytes) => {
                    embedded += 1;
                    let uri = format!("data:{};base64,{}", mime_for(&found), STANDARD.encode(bytes));
                    consumed.insert(found);
                    format!("![{alt}]({uri})")
                }
                Err(e) => {
                    warn!("could not read '{}' for embedding: {}", found.display(), e);
                    warnings.push(ConversionWarning::ImageNotRecovered {
                        reference: target.to_string(),
                    });
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    // Embedded output expects no external files: the emitted images were
    // transient carriers for the bytes now inlined above.
    for path in consumed.iter().chain(emitted_images) {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }

    debug!("image embedding: {} reference(s) inlined", embedded);

    CorrectionOutcome {
        markdown: rewritten,
        images: Vec::new(),
        relocated: 0,
        embedded,
        warnings,
    }
}

/// Find the file behind a reference: the path as written, else a same-named
/// file beside the source PDF (where a relocating engine put it).
fn locate_for_embedding(target: &str, request: &ConversionRequest) -> Option<PathBuf> {
    let path = Path::new(target);
    if path.is_absolute() && path.exists() {
        return Some(path.to_path_buf());
    }
    let name = path.file_name()?;
    let beside_source = request.source_dir.join(name);
    beside_source.exists().then_some(beside_source)
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
        .and_then(|e| e.to_str())
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}
