//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! pdfium opens documents by file-system path, so a URL input is first
//! downloaded into a [`TempDir`] that stays alive for the whole run and
//! cleans itself up on drop, panics included. Both paths funnel through the
//! same magic-byte check: a file whose first bytes are not `%PDF` is
//! rejected here with a useful error instead of surfacing as an opaque
//! backend failure later.

use crate::error::ExtractError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the download lives in `_temp_dir` until the run
    /// finishes and the `ResolvedInput` is dropped.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path of the PDF file, wherever it ended up.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local, magic-checked PDF file path.
pub fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    if is_url(input) {
        download_url(input, timeout_secs)
    } else {
        resolve_local(input)
    }
}

/// Read the first four bytes of `path` and require the `%PDF` signature.
///
/// A file shorter than four bytes cannot be a PDF either; it fails the
/// same way with whatever bytes it does have.
fn require_pdf_magic(path: &Path) -> Result<(), ExtractError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => {
                return Err(ExtractError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("read failed: {e}"),
                })
            }
        }
    }

    if &magic != b"%PDF" {
        return Err(ExtractError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, ExtractError> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }
    require_pdf_magic(&path)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    info!("Downloading PDF from: {}", url);

    let download_err = |reason: String| ExtractError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| download_err(e.to_string()))?;

    let mut response = client.get(url).send().map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            download_err(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(download_err(format!("HTTP {}", response.status())));
    }

    let temp_dir = TempDir::new().map_err(|e| ExtractError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));

    // Stream straight to disk; response bodies can be large and there is
    // no reason to hold them in memory.
    let mut file =
        File::create(&file_path).map_err(|e| ExtractError::Internal(format!("temp file: {e}")))?;
    response
        .copy_to(&mut file)
        .map_err(|e| download_err(e.to_string()))?;
    drop(file);

    // Validate after the write: a bad download error still names the temp
    // path, and the TempDir cleans it up when we return the error.
    require_pdf_magic(&file_path)?;

    info!("Downloaded to: {}", file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a filename, otherwise a
/// generic fallback.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed.path_segments().and_then(|mut segments| {
                segments
                    .next_back()
                    .filter(|last| !last.is_empty() && last.contains('.'))
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_comes_from_url_path() {
        assert_eq!(
            filename_from_url("https://example.com/papers/quiz.pdf"),
            "quiz.pdf"
        );
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
        assert_eq!(filename_from_url("not a url"), "downloaded.pdf");
    }

    #[test]
    fn missing_local_file_is_file_not_found() {
        let err = resolve_input("/definitely/not/a/real/file.pdf", 5).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_magic_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fake.pdf");
        let mut f = File::create(&path).expect("create");
        f.write_all(b"PK\x03\x04 definitely a zip").expect("write");

        let err = resolve_input(path.to_str().unwrap(), 5).unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }), "got: {err:?}");
    }

    #[test]
    fn truncated_file_is_rejected_not_panicked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, b"%P").expect("write");

        let err = resolve_input(path.to_str().unwrap(), 5).unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }), "got: {err:?}");
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("real.pdf");
        let mut f = File::create(&path).expect("create");
        f.write_all(b"%PDF-1.7\n%fake body").expect("write");

        let resolved = resolve_input(path.to_str().unwrap(), 5).expect("resolve");
        assert_eq!(resolved.path(), path.as_path());
    }
}
