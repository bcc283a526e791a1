//! Confluence attachment types.

use serde::Deserialize;

/// Confluence attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Attachment ID.
    pub id: String,
    /// Attachment title (the filename).
    pub title: String,
    /// Hypermedia links.
    #[serde(rename = "_links", default)]
    pub links: Option<AttachmentLinks>,
}

impl Attachment {
    /// Server-relative download path, if the server reported one.
    #[must_use]
    pub fn download_path(&self) -> Option<&str> {
        self.links.as_ref()?.download.as_deref()
    }
}

/// Attachment hypermedia links.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentLinks {
    /// Download path relative to the server base URL.
    #[serde(default)]
    pub download: Option<String>,
}

/// Attachments API response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AttachmentsResponse {
    pub(crate) results: Vec<Attachment>,
}
