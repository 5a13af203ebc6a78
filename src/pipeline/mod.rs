//! Pipeline stages for PDF-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different extraction backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! resolve ──▶ extract ──▶ normalize ──▶ images ──▶ write
//! (paths)     (engine)    (cleanup)     (repair)   (file/stdout)
//! ```
//!
//! 1. [`resolve`]   — validate the input and compute absolute output/image
//!    paths before anything touches the engine
//! 2. [`extract`]   — drive the extraction engine on a blocking worker
//!    thread; the only stage allowed to take minutes
//! 3. [`normalize`] — deterministic text cleanup of the extracted Markdown
//! 4. [`images`]    — rewrite image references and relocate the files the
//!    engine wrote next to the source document
//! 5. [`write`]     — write the finished document to its target in one shot

pub mod extract;
pub mod images;
pub mod normalize;
pub mod resolve;
pub mod write;
