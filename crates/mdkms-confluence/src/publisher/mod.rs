//! Page publisher for Confluence.
//!
//! [`PagePublisher`] drives the whole publish workflow for one document:
//!
//! 1. Resolve the page title (explicit, front matter, then file stem)
//! 2. Look for a page with that title under the parent
//! 3. Convert the document, uploading local images as attachments
//! 4. Update the existing page or create a new one

mod error;
mod executor;
mod result;

pub use error::PublishError;
pub use executor::PagePublisher;
pub use result::{DryRunResult, PublishAction, PublishResult};

use mdkms_renderer::{ConverterOptions, ImageSizing};

/// Configuration for publishing a document.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Space key of the target page.
    pub space_key: String,
    /// ID of the parent page new pages are created under.
    pub parent_id: String,
    /// Explicit page title, overriding front matter and file name.
    pub title: Option<String>,
    /// Whether to prepend the table-of-contents macro.
    pub toc: bool,
    /// Display size limits for uploaded images.
    pub sizing: ImageSizing,
    /// Markdown extensions.
    pub converter: ConverterOptions,
}

impl PublishConfig {
    /// Config with defaults for everything but the target location.
    #[must_use]
    pub fn new(space_key: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            space_key: space_key.into(),
            parent_id: parent_id.into(),
            title: None,
            toc: true,
            sizing: ImageSizing::default(),
            converter: ConverterOptions::default(),
        }
    }

    /// Set the explicit title.
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}
