//! Error types for page publishing.

use mdkms_renderer::RenderError;

use crate::error::ConfluenceError;

/// Error from page publish operations.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Missing or invalid input (title, parent, space).
    #[error("{0}")]
    Validation(String),

    /// Confluence API error.
    #[error("Confluence API error: {0}")]
    Confluence(#[from] ConfluenceError),

    /// Conversion failed.
    #[error("Conversion failed: {0}")]
    Render(#[from] RenderError),
}
