//! Error types for the conversion pipeline.

use std::path::PathBuf;

/// Error returned by an attachment uploader.
pub type UploadError = Box<dyn std::error::Error + Send + Sync>;

/// Error during document conversion.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A placeholder survived restoration.
    ///
    /// This is an internal consistency failure: some stage protected a span
    /// and no later stage put content back in its place.
    #[error("unresolved placeholder {token} in converted output")]
    UnresolvedPlaceholder {
        /// The sentinel token found in the output.
        token: String,
    },

    /// Image resolution failed in a way that cannot be recovered.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Source document could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Fatal image error.
///
/// A missing image file is not an error (it is reported as a warning);
/// these variants cover files that exist but cannot be read or uploaded.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Resolved image file could not be read.
    #[error("failed to read image {}: {source}", path.display())]
    Read {
        /// Resolved image path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Attachment upload failed.
    #[error("failed to upload image {}: {source}", path.display())]
    Upload {
        /// Resolved image path.
        path: PathBuf,
        /// Error reported by the uploader.
        #[source]
        source: UploadError,
    },
}
