//! Report rendering and artifact writing.
//!
//! Rendering is a pure function of the run's output, so the report text is
//! unit-testable without touching a PDF or the file system. Writing is
//! all-or-nothing per artifact: each file goes to a `.tmp` sibling first
//! and is renamed into place, so a crash mid-write never leaves a
//! half-built JSON where a consumer might pick it up.

use crate::error::ExtractError;
use crate::output::{ExtractionOutput, SavedArtifacts};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Concise artifact filename.
pub const QUESTIONS_JSON: &str = "extracted_content.json";
/// Detailed artifact filename.
pub const DETAILED_JSON: &str = "detailed_extracted_content.json";
/// Plain-text report filename.
pub const REPORT_TXT: &str = "extraction_report.txt";

/// The detailed artifact: summary, per-page breakdown, and all questions.
#[derive(Serialize)]
struct DetailedReport<'a> {
    summary: &'a crate::output::ExtractionSummary,
    pages: &'a [crate::output::PageBreakdown],
    questions: &'a [crate::output::QuestionRecord],
}

/// Write all three artifacts under `output_dir`.
///
/// Called only after every selected page has been processed, so no write
/// ever targets a partially-built result.
pub fn save_artifacts(
    output: &ExtractionOutput,
    output_dir: &Path,
) -> Result<SavedArtifacts, ExtractError> {
    std::fs::create_dir_all(output_dir).map_err(|e| ExtractError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let questions_json = output_dir.join(QUESTIONS_JSON);
    let concise = serde_json::to_string_pretty(&output.questions)
        .map_err(|e| ExtractError::Internal(format!("question serialisation failed: {e}")))?;
    write_atomic(&questions_json, concise.as_bytes())?;

    let detailed_json = output_dir.join(DETAILED_JSON);
    let detailed = serde_json::to_string_pretty(&DetailedReport {
        summary: &output.summary,
        pages: &output.pages,
        questions: &output.questions,
    })
    .map_err(|e| ExtractError::Internal(format!("detailed serialisation failed: {e}")))?;
    write_atomic(&detailed_json, detailed.as_bytes())?;

    let report = output_dir.join(REPORT_TXT);
    write_atomic(&report, render_report(output, output_dir).as_bytes())?;

    info!(
        "Saved {} questions to {}",
        output.questions.len(),
        output_dir.display()
    );

    Ok(SavedArtifacts {
        questions_json,
        detailed_json,
        report,
    })
}

/// Atomic write: temp file in the same directory, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExtractError> {
    let tmp_path = path.with_extension("tmp");
    let fail = |e: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    std::fs::write(&tmp_path, bytes).map_err(fail)?;
    std::fs::rename(&tmp_path, path).map_err(fail)?;
    Ok(())
}

/// Render the plain-text run report.
pub fn render_report(output: &ExtractionOutput, output_dir: &Path) -> String {
    let summary = &output.summary;
    let rule = "=".repeat(60);
    let mut report: Vec<String> = Vec::new();

    report.push(rule.clone());
    report.push("PDF CONTENT EXTRACTION REPORT".to_string());
    report.push(rule.clone());
    report.push(format!("Source File: {}", summary.source_file));
    report.push(format!(
        "Extraction Date: {}",
        summary.extracted_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report.push(String::new());

    report.push("EXTRACTION SUMMARY:".to_string());
    report.push(format!("  Total Pages: {}", summary.total_pages));
    report.push(format!("  Pages Processed: {}", summary.pages_processed));
    report.push(format!("  Total Questions: {}", summary.total_questions));
    report.push(format!("  Total Images: {}", summary.total_images));
    if !summary.warnings.is_empty() {
        report.push(format!("  Warnings: {}", summary.warnings.len()));
    }
    report.push(String::new());

    if !output.questions.is_empty() {
        report.push("QUESTION ANALYSIS:".to_string());

        let mut per_page: BTreeMap<usize, usize> = BTreeMap::new();
        for question in &output.questions {
            *per_page.entry(question.page).or_default() += 1;
        }
        report.push(format!("  Pages with Questions: {}", per_page.len()));
        for (page, count) in &per_page {
            report.push(format!("    Page {}: {} questions", page, count));
        }

        let with_images = output.questions.iter().filter(|q| q.has_images()).count();
        report.push(format!("  Questions with Images: {}", with_images));

        let mut answers: BTreeMap<&str, usize> = BTreeMap::new();
        for question in &output.questions {
            if let Some(answer) = question.answer.as_deref() {
                *answers.entry(answer).or_default() += 1;
            }
        }
        if !answers.is_empty() {
            report.push("  Answer Distribution:".to_string());
            for (answer, count) in &answers {
                report.push(format!("    {}: {} questions", answer, count));
            }
        }
        report.push(String::new());
    }

    report.push("OUTPUT FILES:".to_string());
    report.push(format!(
        "  Images Directory: {}",
        output_dir.join("images").display()
    ));
    report.push(format!(
        "  JSON Output: {}",
        output_dir.join(QUESTIONS_JSON).display()
    ));
    report.push(format!(
        "  Detailed JSON: {}",
        output_dir.join(DETAILED_JSON).display()
    ));

    if !summary.warnings.is_empty() {
        report.push(String::new());
        report.push("WARNINGS:".to_string());
        for warning in &summary.warnings {
            report.push(format!("  - {}", warning));
        }
    }

    report.push(String::new());
    report.push(rule);
    report.push(String::new());

    report.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionWarning;
    use crate::output::{ExtractionSummary, PageBreakdown, QuestionRecord};

    fn sample_output(warnings: Vec<ExtractionWarning>) -> ExtractionOutput {
        let questions = vec![
            QuestionRecord {
                question: "Which planet is largest?".into(),
                question_number: Some(1),
                options: vec!["[A] Mars".into(), "[B] Jupiter".into()],
                answer: Some("B".into()),
                page: 1,
                image: Some("out/images/page1_image1.png".into()),
                option_images: Vec::new(),
            },
            QuestionRecord {
                question: "Name a noble gas?".into(),
                question_number: Some(2),
                options: Vec::new(),
                answer: Some("B".into()),
                page: 2,
                image: None,
                option_images: Vec::new(),
            },
        ];
        let pages = vec![
            PageBreakdown {
                page: 1,
                processed: true,
                question_count: 1,
                image_count: 1,
                images: vec!["out/images/page1_image1.png".into()],
            },
            PageBreakdown {
                page: 2,
                processed: true,
                question_count: 1,
                image_count: 0,
                images: Vec::new(),
            },
        ];
        let summary = ExtractionSummary {
            source_file: "quiz.pdf".into(),
            extracted_at: "2024-05-01T12:00:00Z".parse().unwrap(),
            total_pages: 2,
            pages_processed: 2,
            total_images: 1,
            total_questions: 2,
            warnings,
        };
        ExtractionOutput {
            questions,
            pages,
            summary,
        }
    }

    #[test]
    fn report_lists_counts_and_distribution() {
        let report = render_report(&sample_output(Vec::new()), Path::new("out"));
        assert!(report.contains("Total Pages: 2"));
        assert!(report.contains("Pages Processed: 2"));
        assert!(report.contains("Total Questions: 2"));
        assert!(report.contains("Pages with Questions: 2"));
        assert!(report.contains("Page 1: 1 questions"));
        assert!(report.contains("Questions with Images: 1"));
        assert!(report.contains("B: 2 questions"));
        assert!(!report.contains("WARNINGS:"));
    }

    #[test]
    fn report_includes_warning_section_when_present() {
        let warnings = vec![ExtractionWarning::Page {
            page: 2,
            detail: "malformed stream".into(),
        }];
        let report = render_report(&sample_output(warnings), Path::new("out"));
        assert!(report.contains("Warnings: 1"));
        assert!(report.contains("WARNINGS:"));
        assert!(report.contains("Page 2: extraction failed: malformed stream"));
    }

    #[test]
    fn save_writes_all_three_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = sample_output(Vec::new());

        let saved = save_artifacts(&output, dir.path()).expect("save");
        assert!(saved.questions_json.is_file());
        assert!(saved.detailed_json.is_file());
        assert!(saved.report.is_file());

        // No leftover temp files after the rename.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn concise_artifact_parses_back_as_question_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = sample_output(Vec::new());
        let saved = save_artifacts(&output, dir.path()).expect("save");

        let text = std::fs::read_to_string(&saved.questions_json).expect("read");
        let parsed: Vec<QuestionRecord> = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed, output.questions);
    }

    #[test]
    fn detailed_artifact_has_one_entry_per_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = sample_output(Vec::new());
        let saved = save_artifacts(&output, dir.path()).expect("save");

        let text = std::fs::read_to_string(&saved.detailed_json).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(
            value["pages"].as_array().map(|p| p.len()),
            Some(output.summary.total_pages)
        );
        assert_eq!(value["summary"]["source_file"], "quiz.pdf");
    }
}
