//! CLI binary for pdfquiz.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfquiz::{
    extract, inspect, ExtractionConfig, ExtractionProgress, PageSelection, ProgressHandle,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// page. Pages are processed sequentially, so lines always arrive in
/// order.
struct CliProgress {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
}

impl CliProgress {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_run_start` (called before any pages are processed).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }
}

impl ExtractionProgress for CliProgress {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting content from {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, questions: usize, images: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{questions:>2} questions")),
            dim(&format!("{images:>2} images")),
        ));
        self.bar.inc(1);
    }

    fn on_page_warning(&self, page_num: usize, total: usize, detail: String) {
        // Truncate very long warnings to keep output tidy.
        let msg = if detail.chars().count() > 80 {
            let head: String = detail.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            detail
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, processed: usize) {
        let skipped = total_pages.saturating_sub(processed);
        self.bar.finish_and_clear();

        if skipped == 0 {
            eprintln!(
                "{} {} pages processed successfully",
                green("✔"),
                bold(&processed.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages processed  ({} skipped)",
                if processed == 0 { red("✘") } else { cyan("⚠") },
                bold(&processed.to_string()),
                total_pages,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic extraction into ./extracted_content/
  pdfquiz worksheet.pdf

  # Custom output directory
  pdfquiz worksheet.pdf -o results

  # Encrypted document, pages 3-15 only
  pdfquiz --password s3cret --pages 3-15 exam.pdf

  # Extract from a URL
  pdfquiz https://example.com/past-paper.pdf

  # Drop repeated vendor headers before question matching
  pdfquiz --ignore-line "ACME TUTORING" --ignore-line "www.acme.example" quiz.pdf

  # Inspect PDF metadata (no extraction)
  pdfquiz --inspect-only worksheet.pdf

  # Full structured output on stdout
  pdfquiz --json worksheet.pdf > output.json

OUTPUT LAYOUT:
  <output-dir>/extracted_content.json           question list
  <output-dir>/detailed_extracted_content.json  per-page breakdown + summary
  <output-dir>/extraction_report.txt            human-readable report
  <output-dir>/images/page<N>_image<K>.png      one file per embedded image

SETUP:
  pdfquiz needs the pdfium shared library at runtime. Place libpdfium next
  to the executable, install it system-wide, or point the dynamic loader at
  an existing copy (LD_LIBRARY_PATH / DYLD_LIBRARY_PATH).
"#;

/// Extract text, images, and question structures from PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdfquiz",
    version,
    about = "Extract text, images, and question structures from PDF documents",
    long_about = "Extract text, embedded images, and question/option structures from PDF \
documents (local files or URLs). Results are written as JSON plus a plain-text report; \
embedded images are saved as PNG files.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Directory to write all artifacts under.
    #[arg(short, long, env = "PDFQUIZ_OUTPUT_DIR", default_value = "extracted_content")]
    output_dir: PathBuf,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFQUIZ_PASSWORD")]
    password: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFQUIZ_PAGES", default_value = "all")]
    pages: String,

    /// Minimum width/height in pixels for an embedded image to be kept.
    #[arg(long, env = "PDFQUIZ_MIN_IMAGE_SIZE", default_value_t = 20,
          value_parser = clap::value_parser!(u32).range(1..))]
    min_image_size: u32,

    /// Boilerplate line to drop before question matching (repeatable).
    #[arg(long, value_name = "LINE")]
    ignore_line: Vec<String>,

    /// Disable the leading-number question heuristic (`1.` / `1)`).
    #[arg(long)]
    no_numbering: bool,

    /// Disable the trailing-`?` question heuristic.
    #[arg(long)]
    no_question_mark: bool,

    /// Output the structured result as JSON on stdout.
    #[arg(long, env = "PDFQUIZ_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFQUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFQUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFQUIZ_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFQUIZ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressHandle> = if show_progress {
        Some(CliProgress::new_dynamic() as ProgressHandle)
    } else {
        None
    };

    let config = build_config(&cli, progress)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let (output, saved) = extract(&cli.input, &config).context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        let summary = &output.summary;
        eprintln!(
            "{}  {} questions, {} images  →  {}",
            if summary.warnings.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&summary.total_questions.to_string()),
            bold(&summary.total_images.to_string()),
            bold(&config.output_dir.display().to_string()),
        );
        eprintln!("   {}", dim(&saved.report.display().to_string()));
        if !summary.warnings.is_empty() {
            eprintln!(
                "   {} warnings — see {}",
                red(&summary.warnings.len().to_string()),
                saved.report.display()
            );
        }

        // A peek at the first few questions, mirroring the report.
        for (i, question) in output.questions.iter().take(3).enumerate() {
            let mut text: String = question.question.chars().take(100).collect();
            if question.question.chars().count() > 100 {
                text.push('…');
            }
            eprintln!("   {} {}", dim(&format!("{}.", i + 1)), text);
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressHandle>) -> Result<ExtractionConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = ExtractionConfig::builder()
        .output_dir(&cli.output_dir)
        .pages(pages)
        .min_image_size(cli.min_image_size)
        .detect_numbering(!cli.no_numbering)
        .detect_interrogative(!cli.no_question_mark)
        .download_timeout_secs(cli.download_timeout);

    for line in &cli.ignore_line {
        builder = builder.ignore_line(line);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &p in &pages {
            if p < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
            }
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
