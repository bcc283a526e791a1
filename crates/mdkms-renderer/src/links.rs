//! Link sanitizer.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::markup::{escape_bare_ampersands, map_outside_cdata};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(\w+)([^>]*)>").unwrap());
static HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());

/// Escape bare ampersands in every `href` attribute.
///
/// CDATA sections are left alone.
pub fn sanitize_links(html: &str) -> String {
    map_outside_cdata(html, |part| {
        TAG.replace_all(part, |caps: &Captures<'_>| {
            let attrs = HREF.replace_all(&caps[2], |href: &Captures<'_>| {
                format!(r#"href="{}""#, escape_bare_ampersands(&href[1]))
            });
            format!("<{}{attrs}>", &caps[1])
        })
        .into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escapes_bare_ampersand() {
        assert_eq!(
            sanitize_links(r#"<a href="https://x/?a=1&b=2">x</a>"#),
            r#"<a href="https://x/?a=1&amp;b=2">x</a>"#
        );
    }

    #[test]
    fn test_already_escaped_unchanged() {
        let html = r#"<a title="t" href="https://x/?a=1&amp;b=2">x</a>"#;
        assert_eq!(sanitize_links(html), html);
    }

    #[test]
    fn test_cdata_untouched() {
        let html = r#"<ac:plain-text-body><![CDATA[<a href="?a&b">]]></ac:plain-text-body>"#;
        assert_eq!(sanitize_links(html), html);
    }

    #[test]
    fn test_text_ampersand_untouched() {
        let html = "<p>a & b</p>";
        assert_eq!(sanitize_links(html), html);
    }
}
