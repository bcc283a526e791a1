//! Text-level helpers for Confluence storage format markup.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

static AMPERSAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);|&").unwrap()
});

/// Wrap text in a CDATA section.
///
/// A literal `]]>` inside the text is split across two sections.
pub(crate) fn cdata(text: &str) -> String {
    format!(
        "{CDATA_OPEN}{}{CDATA_CLOSE}",
        text.replace(CDATA_CLOSE, "]]]]><![CDATA[>")
    )
}

/// Escape text for use in an attribute value or element content.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Decode character references produced by the HTML converter.
///
/// Text with an unknown entity is returned unchanged.
pub(crate) fn unescape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(text).unwrap_or(Cow::Borrowed(text))
}

/// Replace `&` characters that do not start a character reference.
pub(crate) fn escape_bare_ampersands(text: &str) -> Cow<'_, str> {
    AMPERSAND.replace_all(text, |caps: &Captures<'_>| {
        let m = &caps[0];
        if m == "&" {
            "&amp;".to_owned()
        } else {
            m.to_owned()
        }
    })
}

/// Apply `f` to the parts of `markup` outside CDATA sections.
pub(crate) fn map_outside_cdata<F>(markup: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(open) = rest.find(CDATA_OPEN) {
        out.push_str(&f(&rest[..open]));
        let section = &rest[open..];
        let end = section
            .find(CDATA_CLOSE)
            .map_or(section.len(), |close| close + CDATA_CLOSE.len());
        out.push_str(&section[..end]);
        rest = &section[end..];
    }
    out.push_str(&f(rest));

    out
}
