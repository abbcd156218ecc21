//! Configuration types for an extraction run.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across calls and to diff two runs to understand
//! why their outputs differ.
//!
//! The question-detection knobs live in [`QuestionHeuristics`]: what counts
//! as "question text" is inherently fuzzy, so it is exposed as policy rather
//! than hard-coded. The defaults reproduce the common educational-PDF shape
//! (numbered questions, `[A]`–`[D]` options) without any tuning.

use crate::error::ExtractError;
use crate::progress::ProgressHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a PDF extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfquiz::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .output_dir("out")
///     .min_image_size(32)
///     .ignore_line("ACME TUTORING")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Directory all artifacts are written under. Created if absent.
    /// Default: `extracted_content`.
    pub output_dir: PathBuf,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Minimum width/height in pixels for an embedded image to be kept.
    /// Default: 20.
    ///
    /// Educational PDFs are full of tiny decorative rasters (bullets, logos,
    /// rules). Anything with either edge below this threshold is dropped
    /// before persistence and never referenced by a question record.
    pub min_image_size: u32,

    /// Question-detection policy. Default: [`QuestionHeuristics::default()`].
    pub heuristics: QuestionHeuristics,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress: Option<ProgressHandle>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("extracted_content"),
            password: None,
            pages: PageSelection::default(),
            min_image_size: 20,
            heuristics: QuestionHeuristics::default(),
            download_timeout_secs: 120,
            progress: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("output_dir", &self.output_dir)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("min_image_size", &self.min_image_size)
            .field("heuristics", &self.heuristics)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn ExtractionProgress>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The images subdirectory under [`ExtractionConfig::output_dir`].
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn min_image_size(mut self, px: u32) -> Self {
        self.config.min_image_size = px;
        self
    }

    pub fn heuristics(mut self, heuristics: QuestionHeuristics) -> Self {
        self.config.heuristics = heuristics;
        self
    }

    pub fn detect_numbering(mut self, v: bool) -> Self {
        self.config.heuristics.detect_numbering = v;
        self
    }

    pub fn detect_interrogative(mut self, v: bool) -> Self {
        self.config.heuristics.detect_interrogative = v;
        self
    }

    /// Add a boilerplate line to skip wherever it appears as a whole line
    /// (vendor headers, footers, watermark text).
    pub fn ignore_line(mut self, line: impl Into<String>) -> Self {
        self.config.heuristics.ignore_lines.push(line.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress(mut self, progress: ProgressHandle) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        if c.min_image_size == 0 {
            return Err(ExtractError::InvalidConfig(
                "Minimum image size must be ≥ 1 pixel".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Heuristics ───────────────────────────────────────────────────────────

/// Policy knobs for the question-detection state machine.
///
/// "Question text" has no canonical definition; these toggles control which
/// line shapes open a new question record. Disabling both detectors is
/// permitted — the grouper then only emits image-carrying records with
/// empty question text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionHeuristics {
    /// Treat a line starting with `1.` / `1)` numbering as a new question.
    pub detect_numbering: bool,

    /// Treat a line ending in `?` as a new question.
    pub detect_interrogative: bool,

    /// Whole lines to drop before matching (repeated vendor headers,
    /// footers, page furniture). Exact match after whitespace collapsing.
    pub ignore_lines: Vec<String>,
}

impl Default for QuestionHeuristics {
    fn default() -> Self {
        Self {
            detect_numbering: true,
            detect_interrogative: true,
            ignore_lines: Vec::new(),
        }
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Process all pages (default).
    #[default]
    All,
    /// Process a single page (1-indexed).
    Single(usize),
    /// Process a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Process specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed
    /// page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
