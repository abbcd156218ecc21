//! Error types for the pdfquiz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the run cannot proceed at all (missing
//!   input file, corrupt PDF, wrong password, unwritable output directory).
//!   Returned as `Err(ExtractError)` from the top-level entry points.
//!
//! * [`ExtractionWarning`] — **Recoverable**: a single page or a single
//!   embedded image failed, but the rest of the document is fine. Warnings
//!   are accumulated in order and stored inside
//!   [`crate::output::ExtractionSummary`], so a run with a bad page still
//!   exits successfully and reports what was skipped.
//!
//! The separation keeps the page-processing loop uninterruptible: nothing a
//! single page does can abort the run once the document has opened.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfquiz library.
///
/// Per-page and per-image failures use [`ExtractionWarning`] and are stored
/// in [`crate::output::ExtractionSummary`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched nothing in the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory tree or write an artifact.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the executable, install it system-wide, or point\n\
the dynamic loader at an existing copy (e.g. LD_LIBRARY_PATH on Linux,\n\
DYLD_LIBRARY_PATH on macOS)."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal problem recorded during extraction.
///
/// Stored in [`crate::output::ExtractionSummary::warnings`] and echoed in
/// the plain-text report. The run continues past every warning.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionWarning {
    /// A whole page could not be read; it was skipped.
    #[error("Page {page}: extraction failed: {detail}")]
    Page { page: usize, detail: String },

    /// A single embedded image could not be decoded or written; it was
    /// omitted from the output and is not referenced by any question.
    #[error("Page {page}, image {index}: {detail}")]
    Image {
        page: usize,
        index: usize,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_required_mentions_flag() {
        let e = ExtractError::PasswordRequired {
            path: PathBuf::from("quiz.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("--password"), "got: {msg}");
    }

    #[test]
    fn password_errors_are_distinguishable_from_not_found() {
        let missing = ExtractError::FileNotFound {
            path: PathBuf::from("quiz.pdf"),
        };
        let locked = ExtractError::PasswordRequired {
            path: PathBuf::from("quiz.pdf"),
        };
        assert_ne!(missing.to_string(), locked.to_string());
    }

    #[test]
    fn not_a_pdf_shows_magic_bytes() {
        let e = ExtractError::NotAPdf {
            path: PathBuf::from("notes.txt"),
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("not a valid PDF"));
    }

    #[test]
    fn page_warning_display() {
        let w = ExtractionWarning::Page {
            page: 7,
            detail: "malformed content stream".into(),
        };
        let msg = w.to_string();
        assert!(msg.contains("Page 7"), "got: {msg}");
        assert!(msg.contains("malformed content stream"));
    }

    #[test]
    fn image_warning_roundtrips_through_json() {
        let w = ExtractionWarning::Image {
            page: 2,
            index: 3,
            detail: "unsupported filter".into(),
        };
        let json = serde_json::to_string(&w).expect("serialize");
        let back: ExtractionWarning = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.to_string(), w.to_string());
    }
}
