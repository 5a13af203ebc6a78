//! CLI binary for markpdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use markpdf::{convert, ConversionConfig, ImageMode, OcrProbe, OutputTarget, TesseractProbe};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the input ({input}.md)
  markpdf convert --to markdown document.pdf

  # Convert to an explicit path
  markpdf convert --to markdown document.pdf -o out/document.md

  # Print the Markdown to stdout
  markpdf convert --to markdown document.pdf --stdout

  # Extract images into a sibling images/ directory
  markpdf convert --to markdown paper.pdf --write-images

  # Choose the image directory yourself
  markpdf convert --to markdown paper.pdf --write-images --image-dir assets

  # Inline images as base64 data URIs (self-contained output)
  markpdf convert --to markdown paper.pdf --embed-images

  # Convert from a URL
  markpdf convert --to markdown https://arxiv.org/pdf/1706.03762 -o attention.md

  # OCR a Japanese scan
  markpdf convert --to markdown scan.pdf --ocr-lang jpn

  # Is OCR available on this machine?
  markpdf check

OCR:
  Pages with no extractable text layer are recognised with Tesseract when an
  installation is discoverable (PATH, or the usual install directories on
  Windows). Without one, conversion still succeeds and the affected pages are
  reported as a warning. `markpdf check` shows exactly what was found,
  including the installed language packs.

ENVIRONMENT VARIABLES:
  TESSDATA_PREFIX   Tesseract language-data directory (set automatically
                    when a tessdata/ directory sits next to the executable)
  PDFIUM_LIB_PATH   Directory containing the pdfium shared library
  RUST_LOG          Overrides the log filter (e.g. RUST_LOG=markpdf=debug)
"#;

/// Convert PDF files and URLs to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "markpdf",
    version,
    about = "Convert PDF files and URLs to Markdown",
    long_about = "Convert PDF documents (local files or URLs) to clean Markdown using \
layout-aware extraction, with automatic Tesseract OCR fallback for scanned pages and \
optional image extraction or base64 embedding.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MARKPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MARKPDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF to another format.
    Convert(ConvertArgs),
    /// Check whether optional dependencies (OCR) are installed.
    Check {
        /// Print the availability report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output format.
    #[arg(long = "to", value_enum)]
    to: OutputFormat,

    /// Write Markdown to this file (defaults to {input}.md).
    #[arg(short, long, env = "MARKPDF_OUTPUT", conflicts_with = "use_stdout")]
    output: Option<PathBuf>,

    /// Write output to stdout instead of a file.
    #[arg(long = "stdout")]
    use_stdout: bool,

    /// Extract images to a directory (default: sibling images/).
    #[arg(long, conflicts_with = "embed_images")]
    write_images: bool,

    /// Embed images as base64 data URIs in the Markdown output.
    #[arg(long)]
    embed_images: bool,

    /// Directory for extracted images.
    #[arg(long, requires = "write_images")]
    image_dir: Option<PathBuf>,

    /// Prepend YAML front-matter with document metadata.
    #[arg(long, env = "MARKPDF_METADATA")]
    metadata: bool,

    /// OCR languages, comma separated (e.g. eng,jpn).
    #[arg(long, env = "MARKPDF_OCR_LANG", value_delimiter = ',')]
    ocr_lang: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Markdown,
    Md,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // summary line provides the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.verbose && matches!(&cli.command, Command::Convert(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Convert(args) => run_convert(args, cli.quiet, show_progress).await,
        Command::Check { json } => run_check(json),
    }
}

async fn run_convert(args: ConvertArgs, quiet: bool, show_progress: bool) -> Result<()> {
    // Only Markdown today; the flag exists so future formats stay additive.
    match args.to {
        OutputFormat::Markdown | OutputFormat::Md => {}
    }

    let output = if args.use_stdout {
        OutputTarget::Stdout
    } else if let Some(path) = &args.output {
        OutputTarget::File(path.clone())
    } else {
        OutputTarget::Auto
    };

    let image_mode = if args.embed_images {
        ImageMode::EmbedBase64
    } else if args.write_images {
        ImageMode::WriteFiles
    } else {
        ImageMode::None
    };

    let mut builder = ConversionConfig::builder()
        .output(output)
        .image_mode(image_mode)
        .include_metadata(args.metadata)
        .ocr_languages(args.ocr_lang.iter().cloned());
    if let Some(dir) = &args.image_dir {
        builder = builder.image_dir(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let spinner = show_progress.then(conversion_spinner);
    let result = convert(&args.input, &config).await;
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let output = result.context("Conversion failed")?;

    // Non-fatal conditions are reported after the fact; the exit code stays 0.
    for warning in &output.warnings {
        eprintln!("{} {}", cyan("⚠"), warning);
    }

    if !quiet {
        if let Some(path) = &output.output_path {
            eprintln!(
                "{} Converted to {}",
                green("✔"),
                bold(&path.display().to_string())
            );
        }
        let stats = &output.stats;
        let mut summary = format!("{} pages", stats.page_count);
        if stats.ocr_pages > 0 {
            summary.push_str(&format!(", {} via OCR", stats.ocr_pages));
        }
        if stats.images_relocated > 0 || !output.images.is_empty() {
            summary.push_str(&format!(", {} images", output.images.len()));
        }
        if stats.images_embedded > 0 {
            summary.push_str(&format!(", {} images embedded", stats.images_embedded));
        }
        eprintln!("   {}", dim(&format!("{summary}  —  {}ms", stats.total_duration_ms)));
    }

    Ok(())
}

/// Spinner shown while the engine works; page counts are unknown until the
/// document is open, so there is no meaningful progress bar to draw.
fn conversion_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Converting");
    bar.set_message("extracting…");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn run_check(json: bool) -> Result<()> {
    let availability = TesseractProbe.probe();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&availability)
                .context("Failed to serialise availability report")?
        );
        return Ok(());
    }

    match &availability.executable {
        Some(executable) => {
            let status = if availability.auto_configured {
                "installed (auto-configured)"
            } else {
                "installed"
            };
            println!("Tesseract OCR: {status}");
            println!("  Executable: {}", executable.display());
            if let Some(tessdata) = &availability.tessdata {
                println!("  Tessdata: {}", tessdata.display());
            }
            if !availability.languages.is_empty() {
                println!(
                    "  Languages ({}): {}",
                    availability.languages.len(),
                    availability.languages.join(", ")
                );
            }
        }
        None => {
            println!("Tesseract OCR: not found");
            println!("  OCR for scanned PDFs will not be available.");
            println!("  See: https://tesseract-ocr.github.io/tessdoc/Installation.html");
        }
    }

    Ok(())
}
