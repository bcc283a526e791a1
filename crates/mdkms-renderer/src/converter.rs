//! Markdown to HTML conversion.
//!
//! Wraps pulldown-cmark with the fixed extension set the pipeline relies on:
//! fenced code with info strings, tables, strikethrough and heading ids.
//! Underscores inside words never start emphasis in `CommonMark`, which
//! keeps identifiers like `snake_case_name` literal.

use std::collections::HashMap;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

/// Extensions enabled on the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ConverterOptions {
    /// GFM tables.
    pub tables: bool,
    /// `~~strikethrough~~`.
    pub strikethrough: bool,
    /// Footnote references and definitions.
    pub footnotes: bool,
    /// `{#id .class}` attributes on headings.
    pub heading_attributes: bool,
    /// Generate slug ids for headings without an explicit one.
    pub heading_ids: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            footnotes: false,
            heading_attributes: true,
            heading_ids: true,
        }
    }
}

/// Deterministic Markdown to HTML converter.
#[derive(Debug, Clone, Default)]
pub struct MarkupConverter {
    options: ConverterOptions,
}

impl MarkupConverter {
    /// Create a converter with the given extensions.
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    /// Extensions in use.
    pub fn options(&self) -> ConverterOptions {
        self.options
    }

    /// Convert a Markdown document to HTML.
    pub fn convert(&self, markdown: &str) -> String {
        let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, self.parser_options()).collect();
        if self.options.heading_ids {
            assign_heading_ids(&mut events);
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    /// Convert a single line of Markdown, without the paragraph wrapper.
    pub fn convert_inline(&self, markdown: &str) -> String {
        let html = self.convert(markdown);
        let trimmed = html.trim();
        match trimmed
            .strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
        {
            Some(inner) if !inner.contains("<p>") => inner.to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.options.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.options.strikethrough);
        options.set(Options::ENABLE_FOOTNOTES, self.options.footnotes);
        options.set(
            Options::ENABLE_HEADING_ATTRIBUTES,
            self.options.heading_attributes,
        );
        options
    }
}

/// Give every heading without an explicit id a unique slug id.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < events.len() {
        let Event::Start(Tag::Heading { id, .. }) = &events[i] else {
            i += 1;
            continue;
        };
        let start = i;
        let explicit = id.is_some();

        let mut text = String::new();
        i += 1;
        while i < events.len() && !matches!(events[i], Event::End(TagEnd::Heading(_))) {
            if let Event::Text(t) | Event::Code(t) = &events[i] {
                text.push_str(t);
            }
            i += 1;
        }

        if !explicit {
            let base = slugify(&text);
            let count = counts.entry(base.clone()).or_default();
            let unique = match *count {
                0 => base,
                n => format!("{base}-{n}"),
            };
            *count += 1;
            if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
                *id = Some(unique.into());
            }
        }
        i += 1;
    }
}

/// Convert heading text to a URL-safe slug.
///
/// Letters and digits are kept (lowercased), runs of whitespace, hyphens and
/// underscores collapse to one hyphen, everything else is dropped.
pub(crate) fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    if result.is_empty() {
        result.push_str("section");
    }

    result
}
