//! Question grouping: turn a page's text lines and persisted images into
//! [`QuestionRecord`]s.
//!
//! The grouper is a small finite-state machine driven over page items in
//! top-to-bottom order:
//!
//! ```text
//!                 candidate question line
//!   SeekingQuestion ──────────────────────▶ CollectingMedia
//!         ▲                                      │
//!         └──────────────────────────────────────┘
//!            next candidate / end of page (record finalised)
//! ```
//!
//! While seeking, images are stashed; a page that never produces a
//! question still emits one record carrying those images so nothing is
//! silently dropped. While collecting, the first image becomes the primary
//! image and later ones become option images, in encounter order.
//!
//! Everything here is pure: no PDF types, no I/O. The heuristics that
//! decide what counts as a question are policy
//! ([`crate::config::QuestionHeuristics`]), not contract.

use crate::config::QuestionHeuristics;
use crate::output::QuestionRecord;
use crate::pipeline::images::PersistedImage;
use crate::pipeline::loader::TextFragment;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

/// `12. Which planet …` / `12) Which planet …`
static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3})[.)]\s+(\S.*)$").unwrap());

/// `[A] text` / `A) text` / `A. text` — a delimiter after the letter is
/// required so prose lines starting with a capital A–D don't match.
static RE_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[?([A-D])[\]).]\s*(.*)$").unwrap());

/// `Ans. [B]` / `Answer: B`
static RE_ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Ans\w*\.?\s*:?\s*\[?([A-D])\]?").unwrap());

/// One item of page content, in layout order.
pub enum PageItem {
    Line(TextFragment),
    Image(PersistedImage),
}

impl PageItem {
    fn top(&self) -> f32 {
        match self {
            PageItem::Line(fragment) => fragment.bounds.top,
            PageItem::Image(image) => image.bounds.top,
        }
    }
}

/// Merge text lines and persisted images into a single top-to-bottom
/// stream. The sort is stable, so items sharing a vertical position keep
/// their original relative order (lines first, then images in index
/// order).
pub fn interleave(lines: Vec<TextFragment>, images: &[PersistedImage]) -> Vec<PageItem> {
    let mut items: Vec<PageItem> = lines.into_iter().map(PageItem::Line).collect();
    items.extend(images.iter().cloned().map(PageItem::Image));
    items.sort_by(|a, b| b.top().partial_cmp(&a.top()).unwrap_or(Ordering::Equal));
    items
}

/// Run the grouping state machine over one page.
pub fn group_page(
    items: Vec<PageItem>,
    page_num: usize,
    heuristics: &QuestionHeuristics,
) -> Vec<QuestionRecord> {
    let mut grouper = PageGrouper::new(page_num, heuristics);
    for item in items {
        match item {
            PageItem::Line(fragment) => grouper.push_line(&fragment.text),
            PageItem::Image(image) => grouper.push_image(image.path),
        }
    }
    grouper.finish()
}

// ── State machine ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrouperState {
    /// Scanning for a candidate question line; images are stashed.
    SeekingQuestion,
    /// A question record is open; images and option/answer lines attach
    /// to it until the next candidate or end of page.
    CollectingMedia,
}

struct PageGrouper<'a> {
    heuristics: &'a QuestionHeuristics,
    page: usize,
    state: GrouperState,
    current: Option<QuestionRecord>,
    stashed_images: Vec<String>,
    records: Vec<QuestionRecord>,
}

impl<'a> PageGrouper<'a> {
    fn new(page: usize, heuristics: &'a QuestionHeuristics) -> Self {
        Self {
            heuristics,
            page,
            state: GrouperState::SeekingQuestion,
            current: None,
            stashed_images: Vec::new(),
            records: Vec::new(),
        }
    }

    fn push_line(&mut self, raw: &str) {
        let line = normalize_line(raw);
        if line.is_empty() || line == "?" || line == "??" {
            return;
        }
        if self.heuristics.ignore_lines.iter().any(|l| l == &line) {
            return;
        }

        if let Some((number, text)) = self.candidate(&line) {
            self.flush_stashed_images();
            self.finalize_current();
            let mut record = QuestionRecord::empty(self.page);
            record.question_number = number;
            record.question = text;
            self.current = Some(record);
            self.state = GrouperState::CollectingMedia;
            return;
        }

        if self.state == GrouperState::SeekingQuestion {
            // Stray prose before any question: headings, instructions.
            return;
        }

        let Some(record) = self.current.as_mut() else {
            return;
        };

        if let Some(caps) = RE_OPTION.captures(&line) {
            let letter = &caps[1];
            let text = caps[2].trim();
            record.options.push(format!("[{letter}] {text}").trim_end().to_string());
        } else if let Some(caps) = RE_ANSWER.captures(&line) {
            record.answer = Some(caps[1].to_string());
        } else if record.options.is_empty() && record.answer.is_none() && !record.has_images() {
            // The question sentence wrapped onto another line.
            record.question.push(' ');
            record.question.push_str(&line);
        }
    }

    fn push_image(&mut self, path: String) {
        match self.state {
            GrouperState::SeekingQuestion => self.stashed_images.push(path),
            GrouperState::CollectingMedia => {
                let Some(record) = self.current.as_mut() else {
                    return;
                };
                if record.image.is_none() {
                    record.image = Some(path);
                } else {
                    record.option_images.push(path);
                }
            }
        }
    }

    fn finish(mut self) -> Vec<QuestionRecord> {
        self.finalize_current();
        self.flush_stashed_images();
        self.records
    }

    /// Does this line open a new question?
    ///
    /// Numbering wins over the trailing `?` so a line matching both keeps
    /// its question number. Option-shaped lines never open a question,
    /// even when the option text itself ends in `?`.
    fn candidate(&self, line: &str) -> Option<(Option<u32>, String)> {
        if self.heuristics.detect_numbering {
            if let Some(caps) = RE_NUMBERED.captures(line) {
                return Some((caps[1].parse().ok(), caps[2].to_string()));
            }
        }
        if self.heuristics.detect_interrogative
            && line.len() > 1
            && line.ends_with('?')
            && !RE_OPTION.is_match(line)
        {
            return Some((None, line.to_string()));
        }
        None
    }

    fn finalize_current(&mut self) {
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
        self.state = GrouperState::SeekingQuestion;
    }

    /// Emit images seen with no question to claim them. They become a
    /// record with empty question text and the images as option images,
    /// so nothing extracted from the page is dropped.
    fn flush_stashed_images(&mut self) {
        if self.stashed_images.is_empty() {
            return;
        }
        let mut record = QuestionRecord::empty(self.page);
        record.option_images = std::mem::take(&mut self.stashed_images);
        self.records.push(record);
    }
}

/// Collapse runs of whitespace and trim, so regexes see a canonical line.
fn normalize_line(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::loader::BoundingBox;

    fn at(top: f32) -> BoundingBox {
        BoundingBox {
            left: 40.0,
            bottom: top - 12.0,
            right: 500.0,
            top,
        }
    }

    fn line(text: &str, top: f32) -> PageItem {
        PageItem::Line(TextFragment {
            text: text.to_string(),
            bounds: at(top),
        })
    }

    fn img(path: &str, index: usize, top: f32) -> PageItem {
        PageItem::Image(PersistedImage {
            path: path.to_string(),
            index,
            bounds: at(top),
        })
    }

    fn defaults() -> QuestionHeuristics {
        QuestionHeuristics::default()
    }

    #[test]
    fn question_then_three_images_yields_primary_plus_two_options() {
        let records = group_page(
            vec![
                line("1. Which diagram shows a parallel circuit?", 700.0),
                img("p1_i1.png", 0, 650.0),
                img("p1_i2.png", 1, 600.0),
                img("p1_i3.png", 2, 550.0),
            ],
            1,
            &defaults(),
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.question, "Which diagram shows a parallel circuit?");
        assert_eq!(record.question_number, Some(1));
        assert_eq!(record.image.as_deref(), Some("p1_i1.png"));
        assert_eq!(record.option_images, vec!["p1_i2.png", "p1_i3.png"]);
    }

    #[test]
    fn images_without_question_become_one_unclaimed_record() {
        let records = group_page(
            vec![img("a.png", 0, 700.0), img("b.png", 1, 600.0)],
            3,
            &defaults(),
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.question, "");
        assert_eq!(record.image, None, "unclaimed images are never primary");
        assert_eq!(record.option_images, vec!["a.png", "b.png"]);
        assert_eq!(record.page, 3);
    }

    #[test]
    fn question_without_images_has_empty_image_lists() {
        let records = group_page(
            vec![line("What is the boiling point of water?", 700.0)],
            1,
            &defaults(),
        );
        assert_eq!(records.len(), 1);
        assert!(!records[0].has_images());
        assert_eq!(records[0].question_number, None);
    }

    #[test]
    fn empty_page_yields_no_records() {
        assert!(group_page(Vec::new(), 1, &defaults()).is_empty());
    }

    #[test]
    fn options_and_answer_attach_to_open_question() {
        let records = group_page(
            vec![
                line("2. Which gas do plants absorb?", 700.0),
                line("[A] Oxygen", 680.0),
                line("B) Carbon dioxide", 660.0),
                line("C. Nitrogen", 640.0),
                line("Ans. [B]", 620.0),
            ],
            1,
            &defaults(),
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(
            record.options,
            vec!["[A] Oxygen", "[B] Carbon dioxide", "[C] Nitrogen"]
        );
        assert_eq!(record.answer.as_deref(), Some("B"));
    }

    #[test]
    fn prose_starting_with_capital_a_is_not_an_option() {
        let records = group_page(
            vec![
                line("3. Why does a magnet attract iron?", 700.0),
                line("Because of its magnetic field", 680.0),
            ],
            1,
            &defaults(),
        );
        // The prose line is a continuation, not an option.
        assert!(records[0].options.is_empty());
        assert_eq!(
            records[0].question,
            "Why does a magnet attract iron? Because of its magnetic field"
        );
    }

    #[test]
    fn continuation_stops_once_options_start() {
        let records = group_page(
            vec![
                line("4. A train travels 60 km in 40 minutes.", 700.0),
                line("What is its average speed?", 685.0),
                line("[A] 90 km/h", 670.0),
                line("this trailing prose is not appended", 655.0),
            ],
            1,
            &defaults(),
        );
        // "What is its average speed?" opens a NEW question (trailing '?')
        // rather than continuing — numbering and interrogative are both on.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "A train travels 60 km in 40 minutes.");
        assert_eq!(records[1].question, "What is its average speed?");
        assert_eq!(records[1].options, vec!["[A] 90 km/h"]);
    }

    #[test]
    fn continuation_merges_when_interrogative_detection_is_off() {
        let heuristics = QuestionHeuristics {
            detect_interrogative: false,
            ..defaults()
        };
        let records = group_page(
            vec![
                line("4. A train travels 60 km in 40 minutes.", 700.0),
                line("What is its average speed?", 685.0),
            ],
            1,
            &heuristics,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].question,
            "A train travels 60 km in 40 minutes. What is its average speed?"
        );
    }

    #[test]
    fn next_candidate_finalises_previous_record() {
        let records = group_page(
            vec![
                line("1. First question?", 700.0),
                img("one.png", 0, 680.0),
                line("2. Second question?", 660.0),
                img("two.png", 1, 640.0),
            ],
            1,
            &defaults(),
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image.as_deref(), Some("one.png"));
        assert_eq!(records[1].image.as_deref(), Some("two.png"));
        assert!(records[0].option_images.is_empty());
    }

    #[test]
    fn images_before_first_question_flush_as_leading_record() {
        let records = group_page(
            vec![
                img("header_figure.png", 0, 720.0),
                line("1. What does the figure above show?", 700.0),
            ],
            1,
            &defaults(),
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "");
        assert_eq!(records[0].option_images, vec!["header_figure.png"]);
        assert_eq!(records[1].question, "What does the figure above show?");
    }

    #[test]
    fn ignore_lines_drop_boilerplate_before_matching() {
        let heuristics = QuestionHeuristics {
            ignore_lines: vec!["ACME TUTORING".to_string()],
            ..defaults()
        };
        let records = group_page(
            vec![
                line("ACME   TUTORING", 720.0), // whitespace collapsed first
                line("1. Real question?", 700.0),
            ],
            1,
            &heuristics,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, "Real question?");
    }

    #[test]
    fn disabled_heuristics_emit_only_unclaimed_images() {
        let heuristics = QuestionHeuristics {
            detect_numbering: false,
            detect_interrogative: false,
            ignore_lines: Vec::new(),
        };
        let records = group_page(
            vec![
                line("1. Looks like a question?", 700.0),
                img("fig.png", 0, 680.0),
            ],
            1,
            &heuristics,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, "");
        assert_eq!(records[0].option_images, vec!["fig.png"]);
    }

    #[test]
    fn interrogative_option_text_stays_an_option() {
        let records = group_page(
            vec![
                line("5. Pick the true statement?", 700.0),
                line("[A] Is water wet?", 680.0),
                line("[B] Is fire cold?", 660.0),
            ],
            1,
            &defaults(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].options,
            vec!["[A] Is water wet?", "[B] Is fire cold?"]
        );
    }

    #[test]
    fn bare_question_marks_are_ignored() {
        let records = group_page(
            vec![line("?", 700.0), line("??", 690.0)],
            1,
            &defaults(),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn interleave_orders_by_vertical_position() {
        let lines = vec![
            TextFragment {
                text: "upper".into(),
                bounds: at(700.0),
            },
            TextFragment {
                text: "lower".into(),
                bounds: at(500.0),
            },
        ];
        let images = vec![PersistedImage {
            path: "mid.png".into(),
            index: 0,
            bounds: at(600.0),
        }];
        let items = interleave(lines, &images);
        let order: Vec<String> = items
            .iter()
            .map(|i| match i {
                PageItem::Line(f) => f.text.clone(),
                PageItem::Image(p) => p.path.clone(),
            })
            .collect();
        assert_eq!(order, vec!["upper", "mid.png", "lower"]);
    }

    #[test]
    fn normalize_line_collapses_whitespace() {
        assert_eq!(normalize_line("  1.   What\tis  this? "), "1. What is this?");
        assert_eq!(normalize_line("   "), "");
    }
}
