//! Extraction entry points: the [`ContentExtractor`] object and the
//! one-shot [`extract`] / [`inspect`] functions.
//!
//! The run loop is strictly sequential: pages are processed in ascending
//! order, one at a time, and nothing downstream ever touches the document
//! handle. Per-page and per-image failures become warnings and the loop
//! continues; only opening the document, creating the output directories,
//! and writing the final artifacts can fail the run.
//!
//! Ordering invariant: images are persisted to disk *before* their paths
//! are handed to the grouper, and the JSON artifacts are written only
//! after the whole loop has finished. Every image path that appears in a
//! question record therefore exists on disk by the time anything can read
//! it.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, ExtractionWarning};
use crate::output::{
    DocumentMetadata, ExtractionOutput, ExtractionSummary, PageBreakdown, SavedArtifacts,
};
use crate::pipeline::images::ImagePersister;
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::loader::{self, DocumentLoader, PageContent};
use crate::pipeline::{grouper, report};
use chrono::Utc;
use pdfium_render::prelude::Pdfium;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A PDF opened for content extraction.
///
/// Lifecycle: [`ContentExtractor::open`] → [`extract_all_content`] →
/// [`save_outputs`] → [`close`]. Opening validates the input and surfaces
/// every fatal document error before any output path is created, so a run
/// that cannot start leaves no files behind.
///
/// [`extract_all_content`]: ContentExtractor::extract_all_content
/// [`save_outputs`]: ContentExtractor::save_outputs
/// [`close`]: ContentExtractor::close
#[derive(Debug)]
pub struct ContentExtractor {
    pdfium: Pdfium,
    source: ResolvedInput,
    source_name: String,
    config: ExtractionConfig,
    page_count: usize,
}

impl ContentExtractor {
    /// Resolve `input` (local path or URL), bind the PDF backend, and open
    /// the document once to validate it.
    ///
    /// # Errors
    /// All of the fatal input/document taxonomy: `FileNotFound`,
    /// `NotAPdf`, `PasswordRequired`, `WrongPassword`, `CorruptPdf`,
    /// download failures for URLs, and `PdfiumBindingFailed`.
    pub fn open(input: &str, config: ExtractionConfig) -> Result<Self, ExtractError> {
        let source = input::resolve_input(input, config.download_timeout_secs)?;
        let pdfium = loader::bind_pdfium()?;

        // Validation open: surface password/corruption errors now, before
        // any output directory exists. The document is reopened per
        // operation; pdfium ties the handle to the binding's lifetime.
        let page_count = {
            let document =
                DocumentLoader::open(&pdfium, source.path(), config.password.as_deref())?;
            document.page_count()
        };
        info!("Opened '{}': {} pages", input, page_count);

        Ok(Self {
            pdfium,
            source,
            source_name: input.to_string(),
            config,
            page_count,
        })
    }

    /// Pages in the document (before page selection).
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Read document metadata without extracting content.
    pub fn metadata(&self) -> Result<DocumentMetadata, ExtractError> {
        let document = DocumentLoader::open(
            &self.pdfium,
            self.source.path(),
            self.config.password.as_deref(),
        )?;
        Ok(document.metadata())
    }

    /// Walk the selected pages and produce all question records, page
    /// breakdowns, and the run summary. Images are written to
    /// `<output_dir>/images/` as the loop progresses.
    ///
    /// Returns `Ok` even when individual pages or images failed — those
    /// are reported in [`ExtractionSummary::warnings`]. Fatal errors are
    /// limited to reopening the document, an empty page selection, and an
    /// unwritable output directory.
    pub fn extract_all_content(&self) -> Result<ExtractionOutput, ExtractError> {
        let run_start = Instant::now();
        let extracted_at = Utc::now();

        let document = DocumentLoader::open(
            &self.pdfium,
            self.source.path(),
            self.config.password.as_deref(),
        )?;
        let indices = self.config.pages.to_indices(self.page_count);
        if indices.is_empty() {
            return Err(ExtractError::PageOutOfRange {
                page: 0,
                total: self.page_count,
            });
        }

        // Output directories are created only once a page will definitely
        // be processed.
        let persister = ImagePersister::new(&self.config.output_dir, self.config.min_image_size)?;

        let selected = indices.len();
        debug!("Selected {} of {} pages", selected, self.page_count);

        let progress = self.config.progress.clone();
        if let Some(ref cb) = progress {
            cb.on_run_start(selected);
        }

        let mut questions = Vec::new();
        let mut pages: Vec<PageBreakdown> = Vec::with_capacity(selected);
        let mut warnings: Vec<ExtractionWarning> = Vec::new();
        let mut total_images = 0usize;

        for &idx in &indices {
            let page_num = idx + 1;
            if let Some(ref cb) = progress {
                cb.on_page_start(page_num, selected);
            }

            let content = match document.page_content(idx) {
                Ok(content) => content,
                Err(e) => {
                    // One bad page never aborts the run.
                    let detail = e.to_string();
                    warn!("Page {}: skipped: {}", page_num, detail);
                    warnings.push(ExtractionWarning::Page {
                        page: page_num,
                        detail: detail.clone(),
                    });
                    pages.push(PageBreakdown {
                        page: page_num,
                        processed: false,
                        question_count: 0,
                        image_count: 0,
                        images: Vec::new(),
                    });
                    if let Some(ref cb) = progress {
                        cb.on_page_warning(page_num, selected, detail);
                    }
                    continue;
                }
            };

            let PageContent {
                lines,
                images,
                warnings: page_warnings,
            } = content;
            warnings.extend(page_warnings);

            // Persist before grouping: only paths that exist on disk are
            // ever offered to the state machine.
            let mut persisted = Vec::new();
            for embedded in &images {
                match persister.persist(page_num, embedded) {
                    Ok(Some(image)) => persisted.push(image),
                    Ok(None) => {}
                    Err(warning) => {
                        warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
            }
            let image_paths: Vec<String> = persisted.iter().map(|i| i.path.clone()).collect();
            total_images += persisted.len();

            let items = grouper::interleave(lines, &persisted);
            let records = grouper::group_page(items, page_num, &self.config.heuristics);
            debug!(
                "Page {}: {} questions, {} images",
                page_num,
                records.len(),
                persisted.len()
            );

            pages.push(PageBreakdown {
                page: page_num,
                processed: true,
                question_count: records.len(),
                image_count: persisted.len(),
                images: image_paths,
            });
            if let Some(ref cb) = progress {
                cb.on_page_complete(page_num, selected, records.len(), persisted.len());
            }
            questions.extend(records);
        }

        let processed = pages.iter().filter(|p| p.processed).count();
        if let Some(ref cb) = progress {
            cb.on_run_complete(selected, processed);
        }

        let summary = ExtractionSummary {
            source_file: self.source_name.clone(),
            extracted_at,
            total_pages: self.page_count,
            pages_processed: processed,
            total_images,
            total_questions: questions.len(),
            warnings,
        };
        info!(
            "Extraction complete: {}/{} pages, {} questions, {} images in {}ms",
            processed,
            selected,
            summary.total_questions,
            summary.total_images,
            run_start.elapsed().as_millis()
        );

        Ok(ExtractionOutput {
            questions,
            pages,
            summary,
        })
    }

    /// Write the two JSON artifacts and the text report under the
    /// configured output directory.
    pub fn save_outputs(&self, output: &ExtractionOutput) -> Result<SavedArtifacts, ExtractError> {
        report::save_artifacts(output, &self.config.output_dir)
    }

    /// Release the document backend and any downloaded temp file.
    ///
    /// Dropping the extractor has the same effect; `close` exists so the
    /// release point can be made explicit at call sites.
    pub fn close(self) {
        drop(self);
    }
}

/// One-shot convenience: open, extract, save, close.
///
/// Returns the in-memory output together with the paths of the written
/// artifacts.
pub fn extract(
    input: &str,
    config: &ExtractionConfig,
) -> Result<(ExtractionOutput, SavedArtifacts), ExtractError> {
    let extractor = ContentExtractor::open(input, config.clone())?;
    let output = extractor.extract_all_content()?;
    let saved = extractor.save_outputs(&output)?;
    extractor.close();
    Ok((output, saved))
}

/// Read document metadata without extracting any content.
pub fn inspect(input: &str) -> Result<DocumentMetadata, ExtractError> {
    let resolved = input::resolve_input(input, 120)?;
    let pdfium = loader::bind_pdfium()?;
    let document = DocumentLoader::open(&pdfium, resolved.path(), None)?;
    Ok(document.metadata())
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests exercise only the input-validation path, which runs
    // before the PDF backend is bound; they need neither libpdfium nor a
    // real document.

    #[test]
    fn open_missing_file_fails_before_any_output_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("should_not_exist");
        let config = ExtractionConfig::builder()
            .output_dir(&out)
            .build()
            .unwrap();

        let err = ContentExtractor::open("/definitely/not/a/real/file.pdf", config).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }), "got: {err:?}");
        assert!(!out.exists(), "no output directory may be created");
    }

    #[test]
    fn open_non_pdf_reports_not_a_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"just some text, no magic").expect("write");

        let config = ExtractionConfig::default();
        let err = ContentExtractor::open(path.to_str().unwrap(), config).unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }), "got: {err:?}");
    }

    #[test]
    fn extract_missing_file_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        let config = ExtractionConfig::builder()
            .output_dir(&out)
            .build()
            .unwrap();

        let result = extract("/definitely/not/a/real/file.pdf", &config);
        assert!(result.is_err());
        assert!(!out.exists());
    }
}
