//! Confluence page types.

use serde::{Deserialize, Serialize};

/// Confluence page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page {
    /// Page ID.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Version information. Only present when requested via `expand=version`
    /// or returned from a write.
    #[serde(default)]
    pub version: Option<Version>,
    /// Space the page belongs to.
    #[serde(default)]
    pub space: Option<Space>,
    /// Hypermedia links.
    #[serde(rename = "_links", default)]
    pub links: Option<PageLinks>,
}

impl Page {
    /// Version number, or 0 when the server did not include it.
    #[must_use]
    pub fn version_number(&self) -> u32 {
        self.version.as_ref().map_or(0, |v| v.number)
    }
}

/// Page version.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Version {
    /// Version number.
    pub number: u32,
}

/// Space reference.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Space {
    /// Space key.
    pub key: String,
}

/// Page hypermedia links.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageLinks {
    /// Web UI path relative to the server base URL.
    #[serde(default)]
    pub webui: Option<String>,
}

/// One page of a paginated content listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PageList {
    pub(crate) results: Vec<Page>,
    #[serde(default)]
    pub(crate) size: usize,
}
