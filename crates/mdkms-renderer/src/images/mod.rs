//! Image resolution and upload.
//!
//! Local images are found relative to the document, uploaded once per run
//! through an [`AttachmentUploader`], and referenced by their download URL.
//! Remote images are embedded as they are.

mod path;
mod reference;

pub use reference::{ImageReference, ImageSize};
pub(crate) use reference::IMAGE;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ImageError, UploadError};
use crate::macros::{self, ImageTarget};

/// MIME type used when the extension is unknown.
const DEFAULT_MIME_TYPE: &str = "image/png";

/// An attachment to upload.
#[derive(Debug)]
pub struct ImageUpload<'a> {
    /// Page that receives the attachment.
    pub page_id: &'a str,
    /// Attachment file name.
    pub filename: &'a str,
    /// MIME type of the data.
    pub mime_type: &'a str,
    /// File contents.
    pub data: &'a [u8],
}

/// Uploads image files as page attachments.
pub trait AttachmentUploader {
    /// Upload an attachment and return its download path.
    ///
    /// The path may be absolute or relative to the server base URL.
    fn attach(&self, upload: &ImageUpload<'_>) -> Result<String, UploadError>;
}

/// Limits used to derive a display size from an image's pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSizing {
    /// Maximum display width.
    pub max_width: u32,
    /// Maximum display height.
    pub max_height: u32,
    /// Scale applied to images that already fit.
    pub min_scale: f64,
    /// Whether to read pixel sizes at all.
    pub derive: bool,
}

impl Default for ImageSizing {
    fn default() -> Self {
        Self {
            max_width: 600,
            max_height: 400,
            min_scale: 0.6,
            derive: true,
        }
    }
}

impl ImageSizing {
    /// Display size for an image of `width` x `height` pixels.
    ///
    /// Large images shrink to fit the box; images that already fit are
    /// scaled by `min_scale`. Neither side drops below one pixel.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (width.max(1), height.max(1));
        }
        let ratio = (f64::from(self.max_width) / f64::from(width))
            .min(f64::from(self.max_height) / f64::from(height));
        let ratio = if ratio > 1.0 { self.min_scale } else { ratio };
        (scale(width, ratio), scale(height, ratio))
    }

    fn derive_size(&self, path: &Path) -> Option<(u32, u32)> {
        if !self.derive {
            return None;
        }
        match image::image_dimensions(path) {
            Ok((width, height)) => Some(self.fit(width, height)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot read image dimensions");
                None
            }
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scale(value: u32, ratio: f64) -> u32 {
    ((f64::from(value) * ratio).floor() as u32).max(1)
}

/// Run-scoped mapping from resolved local path to uploaded URL.
#[derive(Debug, Default)]
pub struct UploadedImageCache {
    urls: HashMap<PathBuf, String>,
}

impl UploadedImageCache {
    /// URL uploaded for `path` in this run.
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.urls.get(path).map(String::as_str)
    }

    /// Remember the URL for `path`.
    pub fn insert(&mut self, path: PathBuf, url: String) {
        self.urls.insert(path, url);
    }

    /// Number of distinct uploads.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Resolves image references for one publish run.
pub struct ImageResolver<'a> {
    uploader: &'a dyn AttachmentUploader,
    base_url: String,
    page_id: String,
    sizing: ImageSizing,
    cache: UploadedImageCache,
}

impl<'a> ImageResolver<'a> {
    /// Create a resolver uploading to `page_id`.
    ///
    /// Relative download paths returned by the uploader are joined to
    /// `base_url`.
    pub fn new(uploader: &'a dyn AttachmentUploader, base_url: &str, page_id: &str) -> Self {
        Self {
            uploader,
            base_url: base_url.trim_end_matches('/').to_owned(),
            page_id: page_id.to_owned(),
            sizing: ImageSizing::default(),
            cache: UploadedImageCache::default(),
        }
    }

    /// Use different size limits.
    #[must_use]
    pub fn with_sizing(mut self, sizing: ImageSizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Page receiving uploads.
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Number of files uploaded so far.
    pub fn uploads(&self) -> usize {
        self.cache.len()
    }

    /// Uploaded URLs by local path.
    pub fn cache(&self) -> &UploadedImageCache {
        &self.cache
    }

    /// Resolve a reference to image markup.
    ///
    /// Returns `Ok(None)` when a local file cannot be found; every path
    /// tried is logged. Read and upload failures are errors.
    pub fn resolve(
        &mut self,
        reference: &ImageReference,
        doc_dir: &Path,
    ) -> Result<Option<String>, ImageError> {
        let explicit = reference.size;

        if reference.is_remote() {
            return Ok(Some(macros::image(
                ImageTarget::Url(&reference.raw_path),
                explicit.map(|s| s.width),
                explicit.and_then(|s| s.height),
                &reference.alt,
            )));
        }

        let candidates = path::candidate_paths(doc_dir, &reference.raw_path);
        let Some(found) = path::find_existing(&candidates) else {
            let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
            warn!(
                image = %reference.raw_path,
                tried = ?tried,
                "Image file not found"
            );
            return Ok(None);
        };
        let resolved = found.canonicalize().unwrap_or_else(|_| found.clone());

        let url = self.upload(&resolved)?;
        let (width, height) = match explicit {
            Some(size) => (Some(size.width), size.height),
            None => self
                .sizing
                .derive_size(&resolved)
                .map_or((None, None), |(w, h)| (Some(w), Some(h))),
        };

        Ok(Some(macros::image(
            ImageTarget::Url(&url),
            width,
            height,
            &reference.alt,
        )))
    }

    /// Upload a file unless it was uploaded earlier in this run.
    fn upload(&mut self, path: &Path) -> Result<String, ImageError> {
        if let Some(url) = self.cache.get(path) {
            debug!(path = %path.display(), "Reusing uploaded image");
            return Ok(url.to_owned());
        }

        let data = std::fs::read(path).map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.png");
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_MIME_TYPE);

        info!(
            "Uploading image '{}' ({} bytes) to page {}",
            filename,
            data.len(),
            self.page_id
        );
        let download = self
            .uploader
            .attach(&ImageUpload {
                page_id: &self.page_id,
                filename,
                mime_type,
                data: &data,
            })
            .map_err(|source| ImageError::Upload {
                path: path.to_path_buf(),
                source,
            })?;

        let url = if download.starts_with("http://") || download.starts_with("https://") {
            download
        } else {
            format!("{}{}", self.base_url, download)
        };
        self.cache.insert(path.to_path_buf(), url.clone());
        Ok(url)
    }
}

/// Markup for a reference when nothing is uploaded.
///
/// Local images become attachment references by file name, so a page that
/// already carries the attachments renders them.
pub(crate) fn offline_markup(reference: &ImageReference) -> String {
    let size = reference.size;
    let name = path::file_name(&reference.raw_path);
    let target = if reference.is_remote() {
        ImageTarget::Url(&reference.raw_path)
    } else {
        ImageTarget::Attachment(&name)
    };
    macros::image(
        target,
        size.map(|s| s.width),
        size.and_then(|s| s.height),
        &reference.alt,
    )
}
