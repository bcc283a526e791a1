//! Local image path resolution.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Subdirectory searched for attachments next to the document.
const ATTACHMENTS_DIR: &str = "attachments";

/// Paths to try, in order, for a local image reference.
///
/// For a relative reference these are the path under the document
/// directory, under its `attachments` subdirectory, re-joined segment by
/// segment, and lexically normalized. A percent-encoded reference is also
/// tried decoded. An absolute reference is used as-is.
pub(crate) fn candidate_paths(doc_dir: &Path, raw: &str) -> Vec<PathBuf> {
    let normalized = raw.replace('\\', "/");
    let mut variants = vec![normalized.clone()];
    if let Ok(decoded) = percent_decode_str(&normalized).decode_utf8()
        && decoded != normalized
    {
        variants.push(decoded.into_owned());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    for variant in &variants {
        let path = Path::new(variant);
        if path.is_absolute() {
            push_unique(&mut candidates, path.to_path_buf());
            continue;
        }

        push_unique(&mut candidates, doc_dir.join(path));
        push_unique(&mut candidates, doc_dir.join(ATTACHMENTS_DIR).join(path));
        if variant.contains('/') {
            let rejoined = variant
                .split('/')
                .filter(|segment| !segment.is_empty())
                .fold(doc_dir.to_path_buf(), |acc, segment| acc.join(segment));
            push_unique(&mut candidates, rejoined);
        }
        push_unique(&mut candidates, normalize(&doc_dir.join(path)));
    }
    candidates
}

/// Find the first candidate that is an existing file.
pub(crate) fn find_existing(candidates: &[PathBuf]) -> Option<&PathBuf> {
    candidates.iter().find(|path| path.is_file())
}

/// File name of a reference, for attachment naming.
pub(crate) fn file_name(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    let decoded = percent_decode_str(&normalized)
        .decode_utf8()
        .map_or_else(|_| normalized.clone(), |d| d.into_owned());
    decoded.rsplit('/').next().unwrap_or_default().to_owned()
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}
