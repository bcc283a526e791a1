//! HTTP basic authentication.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Precomputed `Authorization` header for basic auth.
pub(crate) struct BasicAuth {
    header: String,
}

impl BasicAuth {
    pub(crate) fn new(username: &str, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        Self {
            header: format!("Basic {credentials}"),
        }
    }

    /// Value for the `Authorization` header.
    pub(crate) fn header(&self) -> &str {
        &self.header
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BasicAuth(***)")
    }
}
