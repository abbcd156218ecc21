//! Document loading and per-page content extraction via pdfium.
//!
//! All knowledge of the pdfium object model is confined to this module:
//! the rest of the crate sees only [`PageContent`], [`TextFragment`],
//! [`EmbeddedImage`], and [`BoundingBox`]. Swapping the parsing backend
//! would mean rewriting this file and nothing else.
//!
//! Per-page extraction fails softly. [`DocumentLoader::page_content`]
//! returns an error only for the page it was asked about; the caller
//! records a warning and moves on. Per-image decode failures do not even
//! fail the page — they are returned inside [`PageContent::warnings`].

use crate::error::{ExtractError, ExtractionWarning};
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, warn};

/// Bind to the pdfium shared library.
///
/// Looks next to the executable first, then falls back to the system
/// library path. Binding happens once per [`crate::ContentExtractor`].
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))
}

// ── Geometry ─────────────────────────────────────────────────────────────

/// Axis-aligned page region in PDF points. The PDF y-axis grows upwards,
/// so `top > bottom` and "higher on the page" means a larger `top`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl BoundingBox {
    pub fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// True when the vertical overlap covers at least half of the shorter
    /// box — the two boxes sit on the same line of text.
    pub fn same_line(&self, other: &Self) -> bool {
        let overlap = self.top.min(other.top) - self.bottom.max(other.bottom);
        let shorter = self.height().min(other.height());
        if shorter <= 0.0 {
            return false;
        }
        overlap >= shorter * 0.5
    }
}

fn to_bounding_box(rect: &PdfRect) -> BoundingBox {
    BoundingBox {
        left: rect.left.value,
        bottom: rect.bottom.value,
        right: rect.right.value,
        top: rect.top.value,
    }
}

// ── Page content ─────────────────────────────────────────────────────────

/// A line-shaped run of text with its approximate page region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub bounds: BoundingBox,
}

/// One embedded raster image, already decoded from the page's content
/// stream.
pub struct EmbeddedImage {
    /// 0-based, stable per-page index in content-stream order. Used to
    /// derive the persisted filename, so it must not depend on layout.
    pub index: usize,
    pub bounds: BoundingBox,
    pub image: DynamicImage,
}

/// Everything extracted from one page.
pub struct PageContent {
    /// Text lines, top-to-bottom then left-to-right.
    pub lines: Vec<TextFragment>,
    /// Decoded embedded images in content-stream order.
    pub images: Vec<EmbeddedImage>,
    /// Per-image decode failures encountered on this page.
    pub warnings: Vec<ExtractionWarning>,
}

// ── Loader ───────────────────────────────────────────────────────────────

/// An open PDF document.
///
/// Borrows the process-wide [`Pdfium`] binding; dropped (and the underlying
/// file handle released) at the end of each library operation.
pub struct DocumentLoader<'a> {
    document: PdfDocument<'a>,
}

impl<'a> DocumentLoader<'a> {
    /// Open a PDF for reading, mapping pdfium failures onto the fatal error
    /// taxonomy: a password problem is reported as such, anything else as a
    /// corrupt document.
    pub fn open(
        pdfium: &'a Pdfium,
        pdf_path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, ExtractError> {
        let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ExtractError::WrongPassword {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    ExtractError::PasswordRequired {
                        path: pdf_path.to_path_buf(),
                    }
                }
            } else {
                ExtractError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        debug!("PDF loaded: {} pages", document.pages().len());
        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    /// Extract text lines and embedded images from one 0-indexed page.
    ///
    /// Errors here abort only this page; the caller records a warning and
    /// continues with the next one.
    pub fn page_content(&self, index: usize) -> Result<PageContent, ExtractError> {
        let page_num = index + 1;
        let pages = self.document.pages();
        let page = pages
            .get(index as u16)
            .map_err(|e| ExtractError::Internal(format!("{:?}", e)))?;

        let mut fragments = Vec::new();
        let mut images = Vec::new();
        let mut warnings = Vec::new();
        let mut image_index = 0usize;

        for object in page.objects().iter() {
            let bounds = match object.bounds() {
                Ok(quad) => to_bounding_box(&quad.to_rect()),
                Err(_) => BoundingBox::default(),
            };

            match object {
                PdfPageObject::Text(ref text_object) => {
                    let text = text_object.text();
                    if text.trim().is_empty() {
                        continue;
                    }
                    fragments.push(TextFragment { text, bounds });
                }
                PdfPageObject::Image(ref image_object) => {
                    let slot = image_index;
                    image_index += 1;

                    // Raw decode first; processed decode applies the page's
                    // filter chain and catches formats raw decode cannot.
                    let decoded = image_object
                        .get_raw_image()
                        .or_else(|_| image_object.get_processed_image(&self.document));

                    match decoded {
                        Ok(image) => images.push(EmbeddedImage {
                            index: slot,
                            bounds,
                            image,
                        }),
                        Err(e) => {
                            warn!(
                                "Page {}, image {}: decode failed: {:?}",
                                page_num, slot, e
                            );
                            warnings.push(ExtractionWarning::Image {
                                page: page_num,
                                index: slot,
                                detail: format!("undecodable image stream: {:?}", e),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        debug!(
            "Page {}: {} text fragments, {} images, {} warnings",
            page_num,
            fragments.len(),
            images.len(),
            warnings.len()
        );

        Ok(PageContent {
            lines: assemble_lines(fragments),
            images,
            warnings,
        })
    }

    /// Read document metadata without extracting any page content.
    pub fn metadata(&self) -> DocumentMetadata {
        let metadata = self.document.metadata();
        let pages = self.document.pages();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: pages.len() as usize,
            pdf_version: format!("{:?}", self.document.version()),
            is_encrypted: false, // pdfium doesn't readily expose this after opening
        }
    }
}

// ── Line assembly ────────────────────────────────────────────────────────

/// Merge raw text fragments into line-shaped runs.
///
/// pdfium yields one text object per show-text operation, which on many
/// documents means several fragments per visual line. The question
/// heuristics match whole lines ("1. Which planet …?"), so fragments that
/// sit on the same baseline are joined left-to-right into a single
/// [`TextFragment`] whose bounds cover the union.
pub(crate) fn assemble_lines(mut fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    fragments.sort_by(|a, b| {
        b.bounds
            .top
            .partial_cmp(&a.bounds.top)
            .unwrap_or(Ordering::Equal)
            .then(
                a.bounds
                    .left
                    .partial_cmp(&b.bounds.left)
                    .unwrap_or(Ordering::Equal),
            )
    });

    let mut lines: Vec<TextFragment> = Vec::new();
    for fragment in fragments {
        match lines.last_mut() {
            Some(line) if line.bounds.same_line(&fragment.bounds) => {
                if !line.text.ends_with(char::is_whitespace) {
                    line.text.push(' ');
                }
                line.text.push_str(fragment.text.trim_start());
                line.bounds = line.bounds.union(&fragment.bounds);
            }
            _ => lines.push(fragment),
        }
    }
    lines
}
