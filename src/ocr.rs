//! OCR engine discovery.
//!
//! The extraction engine applies OCR automatically to pages with no
//! extractable text layer, but only when a Tesseract installation can be
//! found. Installation state is external, mutable, and platform-dependent, so
//! it is modelled as an explicit capability probe ([`OcrProbe`]) handed to the
//! engine rather than read as ambient global state. Tests inject a
//! [`StaticOcrProbe`] to simulate present/absent OCR without touching the
//! host system; the `check` CLI subcommand prints the real probe's report.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Result of probing for an installed OCR engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrAvailability {
    /// Path to the `tesseract` executable, if found.
    pub executable: Option<PathBuf>,
    /// True when the executable was found outside `PATH` (well-known install
    /// directory) and callers should invoke it by full path.
    pub auto_configured: bool,
    /// Directory holding `*.traineddata` language files, if located.
    pub tessdata: Option<PathBuf>,
    /// Installed language codes, sorted (e.g. `["eng", "jpn", "osd"]`).
    pub languages: Vec<String>,
}

impl OcrAvailability {
    /// True when an OCR engine is installed and usable.
    pub fn is_available(&self) -> bool {
        self.executable.is_some()
    }
}

/// Capability probe for the external OCR engine.
///
/// Implementations must be cheap enough to call once per conversion.
pub trait OcrProbe: Send + Sync {
    fn probe(&self) -> OcrAvailability;
}

/// Probe for a Tesseract installation on the host system.
///
/// Looks for `tesseract` on `PATH` first; on Windows also checks the common
/// installer locations. The tessdata directory comes from `TESSDATA_PREFIX`
/// when set, else from a `tessdata/` directory next to the executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct TesseractProbe;

impl TesseractProbe {
    fn find_executable() -> Option<(PathBuf, bool)> {
        if let Ok(path) = which::which("tesseract") {
            return Some((path, false));
        }
        Self::find_well_known().map(|p| (p, true))
    }

    #[cfg(windows)]
    fn find_well_known() -> Option<PathBuf> {
        let mut roots: Vec<PathBuf> = vec![
            PathBuf::from(r"C:\Program Files\Tesseract-OCR"),
            PathBuf::from(r"C:\Program Files (x86)\Tesseract-OCR"),
        ];
        for var in ["LOCALAPPDATA", "ProgramFiles", "ProgramFiles(x86)"] {
            if let Ok(base) = std::env::var(var) {
                let mut p = PathBuf::from(base);
                if var == "LOCALAPPDATA" {
                    p.push("Programs");
                }
                p.push("Tesseract-OCR");
                roots.push(p);
            }
        }
        roots
            .into_iter()
            .map(|r| r.join("tesseract.exe"))
            .find(|p| p.exists())
    }

    #[cfg(not(windows))]
    fn find_well_known() -> Option<PathBuf> {
        None
    }

    fn tessdata_dir(executable: &Path) -> Option<PathBuf> {
        if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
            let p = PathBuf::from(prefix);
            if p.is_dir() {
                return Some(p);
            }
        }
        let beside = executable.parent()?.join("tessdata");
        beside.is_dir().then_some(beside)
    }

    /// Enumerate installed languages from `*.traineddata` files.
    pub(crate) fn languages_in(tessdata: &Path) -> Vec<String> {
        let mut langs: Vec<String> = std::fs::read_dir(tessdata)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "traineddata") {
                    path.file_stem().map(|s| s.to_string_lossy().into_owned())
                } else {
                    None
                }
            })
            .collect();
        langs.sort();
        langs
    }
}

impl OcrProbe for TesseractProbe {
    fn probe(&self) -> OcrAvailability {
        let Some((executable, auto_configured)) = Self::find_executable() else {
            tracing::debug!("tesseract not found on PATH");
            return OcrAvailability::default();
        };

        let tessdata = Self::tessdata_dir(&executable);
        let languages = tessdata
            .as_deref()
            .map(Self::languages_in)
            .unwrap_or_default();

        tracing::debug!(
            "tesseract found at {} ({} languages)",
            executable.display(),
            languages.len()
        );

        OcrAvailability {
            executable: Some(executable),
            auto_configured,
            tessdata,
            languages,
        }
    }
}

/// A probe with a fixed answer; for tests and for callers that already know
/// the installation state.
#[derive(Debug, Clone, Default)]
pub struct StaticOcrProbe(pub OcrAvailability);

impl StaticOcrProbe {
    /// A probe reporting that no OCR engine is installed.
    pub fn unavailable() -> Self {
        Self(OcrAvailability::default())
    }
}

impl OcrProbe for StaticOcrProbe {
    fn probe(&self) -> OcrAvailability {
        self.0.clone()
    }
}
