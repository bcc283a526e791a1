//! Result types for page publishing.

use std::fmt;

use crate::types::Page;

/// What a publish did to the target page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    /// A new page was created under the parent.
    Created,
    /// An existing page got a new version.
    Updated,
}

impl fmt::Display for PublishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Result of a successful publish.
#[derive(Debug)]
pub struct PublishResult {
    /// Whether the page was created or updated.
    pub action: PublishAction,
    /// Page as returned by the server.
    pub page: Page,
    /// Web URL of the page.
    pub url: String,
    /// Number of images uploaded during conversion.
    pub images_uploaded: usize,
    /// Non-fatal conversion warnings.
    pub warnings: Vec<String>,
}

/// Result of a dry run. Nothing is written to the server.
#[derive(Debug)]
pub struct DryRunResult {
    /// Resolved page title.
    pub title: String,
    /// What a real publish would do.
    pub action: PublishAction,
    /// Existing page with the same title under the parent.
    pub existing: Option<Page>,
    /// Version a real publish would write, when updating.
    pub next_version: Option<u32>,
    /// Converted storage markup, with images referenced as attachments.
    pub markup: String,
    /// Non-fatal conversion warnings.
    pub warnings: Vec<String>,
}
