//! Code block macroizer.
//!
//! Rewrites `<pre><code>` blocks emitted by the converter into code macros.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::macros;
use crate::markup::unescape;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code(?: class="language-([^"]*)")?>(.*?)</code></pre>"#).unwrap()
});

/// Replace every HTML code block with a code macro.
///
/// The block body is decoded back to plain text and stored in a CDATA
/// section; a trailing newline left by the converter is dropped.
pub fn macroize_code_blocks(html: &str) -> String {
    CODE_BLOCK
        .replace_all(html, |caps: &Captures<'_>| {
            let language = caps
                .get(1)
                .map(|m| unescape(m.as_str()))
                .filter(|lang| !lang.is_empty());
            let decoded = unescape(&caps[2]);
            let body = decoded.strip_suffix('\n').unwrap_or(&*decoded);
            macros::code(language.as_deref(), body)
        })
        .into_owned()
}
