//! # pdfquiz
//!
//! Extract text, embedded images, and question/option structures from PDF
//! documents.
//!
//! ## What it does
//!
//! Educational PDFs (worksheets, question banks, past papers) carry a
//! recurring shape: numbered question text, a handful of `[A]`–`[D]`
//! options, and diagrams interleaved with them. This crate opens a PDF via
//! pdfium, walks its pages, persists every embedded raster image to disk,
//! and pairs the images with nearby question text using a small,
//! configurable state machine. The result is a JSON question list, a
//! detailed per-page breakdown, and a plain-text report.
//!
//! It is deliberately a thin layer over the underlying libraries: no OCR,
//! no layout analysis beyond bounding-box ordering, and no guarantee the
//! question segmentation is right — it is a best-effort heuristic
//! extractor whose knobs live in [`QuestionHeuristics`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Load     open document via pdfium, read pages sequentially
//!  ├─ 3. Persist  decode embedded images, write PNG files
//!  ├─ 4. Group    pair question text with image paths (state machine)
//!  └─ 5. Save     questions JSON + detailed JSON + text report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfquiz::{extract, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .output_dir("extracted_content")
//!         .build()?;
//!     let (output, saved) = extract("worksheet.pdf", &config)?;
//!     println!(
//!         "{} questions, {} images → {}",
//!         output.summary.total_questions,
//!         output.summary.total_images,
//!         saved.questions_json.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Fatal problems (missing file, wrong password, unwritable output
//! directory) return [`ExtractError`]. A malformed page or an undecodable
//! image never aborts the run: it becomes an [`ExtractionWarning`] in the
//! summary and the loop continues with the next page.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfquiz` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! pdfquiz = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, PageSelection, QuestionHeuristics,
};
pub use error::{ExtractError, ExtractionWarning};
pub use extract::{extract, inspect, ContentExtractor};
pub use output::{
    DocumentMetadata, ExtractionOutput, ExtractionSummary, PageBreakdown, QuestionRecord,
    SavedArtifacts,
};
pub use progress::{ExtractionProgress, NoopProgress, ProgressHandle};
