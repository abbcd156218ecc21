//! Output types: question records, per-page breakdowns, and the run summary.
//!
//! Everything here is plain serialisable data. The concise JSON artifact is
//! just `Vec<QuestionRecord>`; the detailed artifact wraps the same records
//! together with [`PageBreakdown`] entries and the [`ExtractionSummary`].
//! All types derive both `Serialize` and `Deserialize` so downstream tools
//! can read the artifacts back with the same definitions.

use crate::error::ExtractionWarning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One detected question with its associated image references.
///
/// Emitted by the grouping state machine and immutable afterwards. Optional
/// fields are omitted from the JSON when absent, matching the concise
/// artifact format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Detected question text. Empty when a page carried images but no
    /// recognisable question text.
    pub question: String,

    /// Number captured from a leading `1.` / `1)` pattern, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,

    /// Textual answer options (`[A] …` style lines), in encounter order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Answer letter from an `Ans. [B]` style line, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// 1-indexed page the question was found on.
    pub page: usize,

    /// Path of the primary image (the first image encountered after the
    /// question), if any. The file is guaranteed to exist on disk before
    /// any JSON referencing it is written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Paths of subsequent images, in encounter order. Same on-disk
    /// guarantee as [`QuestionRecord::image`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_images: Vec<String>,
}

impl QuestionRecord {
    /// A record with no content yet, used by the grouper while collecting.
    pub(crate) fn empty(page: usize) -> Self {
        Self {
            question: String::new(),
            question_number: None,
            options: Vec::new(),
            answer: None,
            page,
            image: None,
            option_images: Vec::new(),
        }
    }

    /// True when the record references at least one image file.
    pub fn has_images(&self) -> bool {
        self.image.is_some() || !self.option_images.is_empty()
    }
}

/// Per-page accounting, one entry per selected page.
///
/// A skipped page (see [`ExtractionWarning::Page`]) still gets an entry with
/// `processed = false`, so the detailed artifact always has exactly as many
/// entries as pages were selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBreakdown {
    /// 1-indexed page number.
    pub page: usize,
    /// False when the page was skipped after a recoverable failure.
    pub processed: bool,
    /// Questions detected on this page.
    pub question_count: usize,
    /// Images persisted from this page.
    pub image_count: usize,
    /// Paths of the persisted images, in per-page index order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Aggregate counts and metadata for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// The input as the user supplied it (path or URL).
    pub source_file: String,
    /// When the run started, RFC 3339.
    pub extracted_at: DateTime<Utc>,
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages that were selected and successfully processed.
    pub pages_processed: usize,
    /// Images persisted across all pages.
    pub total_images: usize,
    /// Question records emitted across all pages.
    pub total_questions: usize,
    /// Recoverable problems, in the order they occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ExtractionWarning>,
}

/// Everything one extraction run produced.
///
/// Returned by [`crate::ContentExtractor::extract_all_content`] and consumed
/// by [`crate::ContentExtractor::save_outputs`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// All question records, in page order then encounter order.
    pub questions: Vec<QuestionRecord>,
    /// One entry per selected page.
    pub pages: Vec<PageBreakdown>,
    /// Run-level counts and warnings.
    pub summary: ExtractionSummary,
}

/// Paths of the artifacts written by a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    /// Concise question list (`extracted_content.json`).
    pub questions_json: PathBuf,
    /// Per-page breakdown plus summary (`detailed_extracted_content.json`).
    pub detailed_json: PathBuf,
    /// Plain-text report (`extraction_report.txt`).
    pub report: PathBuf,
}

/// Document metadata read without extracting any content.
///
/// Surfaced by [`crate::inspect`] and the CLI `--inspect-only` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
}
