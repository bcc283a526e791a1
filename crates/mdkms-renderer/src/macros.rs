//! Confluence macro vocabulary.
//!
//! Every structured macro the pipeline emits is built here.

use std::fmt::Write;

use crate::markup::{cdata, escape};

/// Table of contents macro, placed at the top of every page.
pub const TOC_MACRO: &str = concat!(
    "<ac:structured-macro ac:name=\"toc\">\n",
    "<ac:parameter ac:name=\"printable\">true</ac:parameter>\n",
    "<ac:parameter ac:name=\"style\">disc</ac:parameter>\n",
    "<ac:parameter ac:name=\"maxLevel\">5</ac:parameter>\n",
    "<ac:parameter ac:name=\"minLevel\">1</ac:parameter>\n",
    "<ac:parameter ac:name=\"class\">rm-contents</ac:parameter>\n",
    "<ac:parameter ac:name=\"exclude\">^目录$</ac:parameter>\n",
    "<ac:parameter ac:name=\"type\">list</ac:parameter>\n",
    "<ac:parameter ac:name=\"outline\">false</ac:parameter>\n",
    "<ac:parameter ac:name=\"include\">.*</ac:parameter>\n",
    "</ac:structured-macro>\n\n",
);

/// Code block macro with optional language.
pub(crate) fn code(language: Option<&str>, body: &str) -> String {
    let mut out = String::from(r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#);
    if let Some(lang) = language {
        let _ = write!(
            out,
            r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
            escape(lang)
        );
    }
    let _ = write!(
        out,
        "<ac:plain-text-body>{}</ac:plain-text-body></ac:structured-macro>",
        cdata(body)
    );
    out
}

/// Expandable panel macro wrapping already-rendered markup.
pub(crate) fn expand(title: &str, body: &str) -> String {
    format!(
        concat!(
            r#"<ac:structured-macro ac:name="expand">"#,
            r#"<ac:parameter ac:name="title">{}</ac:parameter>"#,
            "<ac:rich-text-body>{}</ac:rich-text-body>",
            "</ac:structured-macro>"
        ),
        escape(title),
        body
    )
}

/// Markdown macro carrying a fenced block verbatim.
///
/// The remote system renders the fenced source itself, which is how Mermaid
/// diagrams reach the page.
pub(crate) fn markdown(fenced_source: &str) -> String {
    format!(
        concat!(
            r#"<ac:structured-macro ac:name="markdown">"#,
            "<ac:plain-text-body>{}</ac:plain-text-body>",
            "</ac:structured-macro>"
        ),
        cdata(fenced_source)
    )
}

/// Task list macro.
///
/// `items` holds the completion state and the rendered body of each task.
pub(crate) fn task_list<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = (bool, &'a str)>,
{
    let mut out = String::from("<ac:task-list>\n");
    for (done, body) in items {
        let status = if done { "complete" } else { "incomplete" };
        let _ = writeln!(
            out,
            "<ac:task><ac:task-status>{status}</ac:task-status><ac:task-body>{body}</ac:task-body></ac:task>"
        );
    }
    out.push_str("</ac:task-list>");
    out
}

/// Where an image lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageTarget<'a> {
    /// Absolute URL.
    Url(&'a str),
    /// Attachment on the page, by file name.
    Attachment(&'a str),
}

/// Image reference with optional explicit size and alt text.
pub(crate) fn image(
    target: ImageTarget<'_>,
    width: Option<u32>,
    height: Option<u32>,
    alt: &str,
) -> String {
    let mut out = String::from("<ac:image");
    if let Some(w) = width {
        let _ = write!(out, r#" ac:width="{w}""#);
    }
    if let Some(h) = height {
        let _ = write!(out, r#" ac:height="{h}""#);
    }
    if !alt.is_empty() {
        let _ = write!(out, r#" ac:alt="{}""#, escape(alt));
    }
    match target {
        ImageTarget::Url(url) => {
            let _ = write!(out, r#"><ri:url ri:value="{}" /></ac:image>"#, escape(url));
        }
        ImageTarget::Attachment(name) => {
            let _ = write!(
                out,
                r#"><ri:attachment ri:filename="{}" /></ac:image>"#,
                escape(name)
            );
        }
    }
    out
}
