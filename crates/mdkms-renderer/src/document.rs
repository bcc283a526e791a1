//! Source documents.

use std::path::{Path, PathBuf};

use crate::error::RenderError;

/// A Markdown document and the directory its relative references resolve
/// against.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    dir: PathBuf,
    source: Option<PathBuf>,
}

impl Document {
    /// Create a document from text.
    pub fn new(text: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            dir: dir.into(),
            source: None,
        }
    }

    /// Read a document from a file.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self {
            text,
            dir,
            source: Some(path.to_path_buf()),
        })
    }

    /// Document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Directory relative references resolve against.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File the document was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// File name without extension, if loaded from a file.
    pub fn file_stem(&self) -> Option<&str> {
        self.source.as_deref()?.file_stem()?.to_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Release Notes.md");
        std::fs::write(&path, "# Hi\n").unwrap();

        let doc = Document::load(&path).unwrap();

        assert_eq!(doc.text(), "# Hi\n");
        assert_eq!(doc.dir(), dir.path());
        assert_eq!(doc.file_stem(), Some("Release Notes"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Document::load(Path::new("/definitely/not/here.md")).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let doc = Document {
            text: String::new(),
            dir: PathBuf::from("."),
            source: Some(PathBuf::from("a.md")),
        };
        assert_eq!(doc.file_stem(), Some("a"));
        assert_eq!(Document::new("x", "docs").file_stem(), None);
    }
}
