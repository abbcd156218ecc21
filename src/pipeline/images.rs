//! Image persistence: decoded page images → PNG files on disk.
//!
//! ## Why PNG?
//! Lossless output keeps diagrams and option artwork crisp regardless of
//! how the image was stored inside the PDF, and gives every persisted file
//! a single predictable extension.
//!
//! ## Why persist before grouping?
//! Question records reference images by path. Writing the file first and
//! only then handing the path to the grouper means every path that appears
//! in the JSON already exists on disk — a failed write simply removes the
//! image from consideration, with a warning.

use crate::error::{ExtractError, ExtractionWarning};
use crate::pipeline::loader::{BoundingBox, EmbeddedImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An image that has been written to disk and may now be referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedImage {
    /// Path of the written PNG, as recorded in question records.
    pub path: String,
    /// 0-based per-page index the filename was derived from.
    pub index: usize,
    /// Page region the image occupies, for grouping order.
    pub bounds: BoundingBox,
}

/// Writes embedded images under `<output_dir>/images/`.
pub struct ImagePersister {
    images_dir: PathBuf,
    min_edge: u32,
}

impl ImagePersister {
    /// Create the output directory tree. Failure here is fatal: if the
    /// output location is unwritable, nothing else in the run can succeed.
    pub fn new(output_dir: &Path, min_edge: u32) -> Result<Self, ExtractError> {
        let images_dir = output_dir.join("images");
        std::fs::create_dir_all(&images_dir).map_err(|e| ExtractError::OutputWriteFailed {
            path: images_dir.clone(),
            source: e,
        })?;
        Ok(Self {
            images_dir,
            min_edge,
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Write one embedded image as `page<N>_image<K>.png`.
    ///
    /// Returns `Ok(None)` for images below the decorative-size threshold
    /// (dropped silently, like the page furniture they almost always are)
    /// and `Err` for a failed write (recorded as a warning by the caller,
    /// image omitted from all question records).
    pub fn persist(
        &self,
        page_num: usize,
        embedded: &EmbeddedImage,
    ) -> Result<Option<PersistedImage>, ExtractionWarning> {
        let width = embedded.image.width();
        let height = embedded.image.height();
        if width < self.min_edge || height < self.min_edge {
            debug!(
                "Page {}, image {}: skipping decorative {}x{} image",
                page_num, embedded.index, width, height
            );
            return Ok(None);
        }

        let path = self.images_dir.join(image_filename(page_num, embedded.index));
        embedded
            .image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| ExtractionWarning::Image {
                page: page_num,
                index: embedded.index,
                detail: format!("failed to write {}: {}", path.display(), e),
            })?;

        debug!("Page {}: wrote {}", page_num, path.display());
        Ok(Some(PersistedImage {
            path: path.to_string_lossy().into_owned(),
            index: embedded.index,
            bounds: embedded.bounds,
        }))
    }
}

/// `page<N>_image<K>.png`, both 1-indexed. Filtered images leave gaps in
/// `K`, which keeps every surviving image's name stable across runs and
/// across threshold changes.
fn image_filename(page_num: usize, index: usize) -> String {
    format!("page{}_image{}.png", page_num, index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn embedded(index: usize, width: u32, height: u32) -> EmbeddedImage {
        EmbeddedImage {
            index,
            bounds: BoundingBox::default(),
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                width,
                height,
                Rgba([200, 40, 40, 255]),
            )),
        }
    }

    #[test]
    fn filename_is_one_indexed() {
        assert_eq!(image_filename(3, 0), "page3_image1.png");
        assert_eq!(image_filename(12, 4), "page12_image5.png");
    }

    #[test]
    fn persist_writes_png_to_images_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persister = ImagePersister::new(dir.path(), 20).expect("persister");

        let saved = persister
            .persist(1, &embedded(0, 64, 48))
            .expect("persist")
            .expect("image kept");

        assert!(saved.path.ends_with("page1_image1.png"));
        let on_disk = std::path::Path::new(&saved.path);
        assert!(on_disk.exists(), "file must exist at recorded path");

        // The written file must decode back as a PNG of the same size.
        let reread = image::open(on_disk).expect("reread png");
        assert_eq!(reread.width(), 64);
        assert_eq!(reread.height(), 48);
    }

    #[test]
    fn tiny_images_are_filtered_not_warned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persister = ImagePersister::new(dir.path(), 20).expect("persister");

        let result = persister.persist(1, &embedded(0, 10, 10)).expect("persist");
        assert!(result.is_none());

        // One small edge is enough to drop the image.
        let result = persister.persist(1, &embedded(1, 100, 5)).expect("persist");
        assert!(result.is_none());

        let entries: Vec<_> = std::fs::read_dir(persister.images_dir())
            .expect("read_dir")
            .collect();
        assert!(entries.is_empty(), "nothing should be written");
    }

    #[test]
    fn new_creates_nested_images_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("deep").join("output");
        let persister = ImagePersister::new(&out, 20).expect("persister");
        assert!(persister.images_dir().is_dir());
        assert_eq!(persister.images_dir(), out.join("images"));
    }
}
