//! Image reference syntax.

use std::sync::LazyLock;

use regex::Regex;

/// Wikilink `![[ref]]` or bracket `![alt](ref)` image.
pub(crate) static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[\[([^\]\n]+?)\]\]|!\[([^\]\n]*)\]\(([^)\n]+)\)").unwrap()
});

/// Explicit display size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: Option<u32>,
}

impl ImageSize {
    /// Parse `300` or `300x200`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.split_once(['x', 'X']) {
            Some((w, h)) => Some(Self {
                width: w.trim().parse().ok()?,
                height: Some(h.trim().parse().ok()?),
            }),
            None => Some(Self {
                width: text.parse().ok()?,
                height: None,
            }),
        }
    }
}

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Path or URL as written.
    pub raw_path: String,
    /// Alt text, possibly empty.
    pub alt: String,
    /// Size given with a `|N` or `|WxH` suffix.
    pub size: Option<ImageSize>,
}

impl ImageReference {
    /// Parse a full image span such as `![[a.png|300]]` or `![alt](a.png)`.
    pub fn parse(span: &str) -> Option<Self> {
        let caps = IMAGE.captures(span)?;

        if let Some(inner) = caps.get(1) {
            let (path, suffix) = split_suffix(inner.as_str());
            let (size, alt) = size_or_alt(suffix);
            return Some(Self {
                raw_path: path.trim().to_owned(),
                alt,
                size,
            });
        }

        let full_alt = caps.get(2).map_or("", |m| m.as_str());
        let (alt_text, alt_suffix) = split_suffix(full_alt);
        let (path, path_suffix) = split_suffix(strip_title(caps.get(3)?.as_str()));
        let (alt_size, _) = size_or_alt(alt_suffix);
        let (path_size, _) = size_or_alt(path_suffix);

        let alt = if alt_size.is_some() { alt_text } else { full_alt };
        let alt = alt.trim().to_owned();

        Some(Self {
            raw_path: path.trim().to_owned(),
            alt,
            size: path_size.or(alt_size),
        })
    }

    /// Whether the reference points at a remote URL.
    pub fn is_remote(&self) -> bool {
        self.raw_path.starts_with("http://") || self.raw_path.starts_with("https://")
    }
}

/// Split `text|suffix` at the first pipe.
fn split_suffix(text: &str) -> (&str, Option<&str>) {
    match text.split_once('|') {
        Some((head, tail)) => (head, Some(tail)),
        None => (text, None),
    }
}

/// A suffix is a size when numeric, alt text otherwise.
fn size_or_alt(suffix: Option<&str>) -> (Option<ImageSize>, String) {
    match suffix {
        Some(s) => match ImageSize::parse(s) {
            Some(size) => (Some(size), String::new()),
            None => (None, s.trim().to_owned()),
        },
        None => (None, String::new()),
    }
}

/// Drop angle brackets and an optional `"title"` from a link destination.
fn strip_title(dest: &str) -> &str {
    let dest = dest.trim();
    if let Some(inner) = dest.strip_prefix('<')
        && let Some(end) = inner.find('>')
    {
        return &inner[..end];
    }
    if dest.ends_with('"')
        && let Some(start) = dest[..dest.len() - 1].rfind(" \"")
    {
        return dest[..start].trim_end();
    }
    dest
}
